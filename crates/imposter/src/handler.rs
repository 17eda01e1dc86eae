//! Per-connection handler: decode requests, answer them, forward notices.
//!
//! A connection has no identity of its own. Every request names its room
//! and player, so one socket may serve several seats (or reconnect under a
//! new socket at any time). The handler remembers which rooms the socket
//! has touched and forwards `RoomChanged` notices for those.

use std::collections::HashSet;
use std::sync::Arc;

use imposter_protocol::{ClientMessage, Codec, Envelope, RoomCode, RoomView, ServerMessage};
use imposter_room::RoomError;
use imposter_transport::{Connection, WebSocketConnection};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{self, Instant};

use crate::ImposterError;
use crate::server::ServerState;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), ImposterError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let mut changes = state.rooms.subscribe_changes();
    let mut watched: HashSet<RoomCode> = HashSet::new();
    let mut seq: u64 = 1;
    let start = Instant::now();
    let idle_timeout = state.config.idle_timeout;

    let idle = time::sleep(idle_timeout);
    tokio::pin!(idle);

    loop {
        tokio::select! {
            _ = &mut idle => {
                tracing::info!(%conn_id, "connection timed out");
                let _ = conn.close().await;
                break;
            }

            received = conn.recv() => {
                let data = match received {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::debug!(%conn_id, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "recv error");
                        break;
                    }
                };
                idle.as_mut().reset(Instant::now() + idle_timeout);

                let envelope: Envelope<ClientMessage> = match state.codec.decode(&data) {
                    Ok(env) => env,
                    Err(e) => {
                        tracing::warn!(%conn_id, error = %e, "failed to decode envelope");
                        let error = ServerMessage::Error {
                            code: 400,
                            message: format!("malformed request: {e}"),
                        };
                        let frame = Envelope::request(next_seq(&mut seq), millis(&start), error);
                        send(&conn, &state.codec, &frame).await?;
                        continue;
                    }
                };

                let reply = dispatch(&state, envelope.payload, &mut watched, &start).await;
                let frame = Envelope::reply(next_seq(&mut seq), envelope.seq, millis(&start), reply);
                send(&conn, &state.codec, &frame).await?;
            }

            notice = changes.recv() => match notice {
                Ok(changed) if watched.contains(&changed.room_id) => {
                    let frame = Envelope::request(
                        next_seq(&mut seq),
                        millis(&start),
                        ServerMessage::RoomChanged(changed),
                    );
                    send(&conn, &state.codec, &frame).await?;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    // Clients still poll; a missed notice only delays them.
                    tracing::debug!(%conn_id, skipped, "room notices lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    Ok(())
}

/// Runs one request against the directory and turns the outcome into the
/// reply payload.
async fn dispatch<C: Codec>(
    state: &ServerState<C>,
    msg: ClientMessage,
    watched: &mut HashSet<RoomCode>,
    start: &Instant,
) -> ServerMessage {
    let rooms = &state.rooms;
    let result = match msg {
        ClientMessage::Create(req) => rooms.create(req).await.map(|view| watch(watched, view)),
        ClientMessage::Join(req) => rooms.join(req).await.map(|view| watch(watched, view)),
        ClientMessage::NextRound(req) => rooms.next_round(req).await.map(|view| watch(watched, view)),
        ClientMessage::Sync(req) => rooms.sync(req).await.map(|view| watch(watched, view)),
        ClientMessage::Leave(req) => {
            let room_id = req.room_id.clone();
            rooms.leave(req).await.map(|_| {
                watched.remove(&room_id);
                ServerMessage::Left { room_id }
            })
        }
        ClientMessage::Heartbeat { client_time } => Ok(ServerMessage::HeartbeatAck {
            client_time,
            server_time: millis(start),
        }),
    };

    result.unwrap_or_else(|e| rejected(&e))
}

fn watch(watched: &mut HashSet<RoomCode>, view: RoomView) -> ServerMessage {
    watched.insert(view.room_id.clone());
    ServerMessage::Room(view)
}

fn rejected(err: &RoomError) -> ServerMessage {
    tracing::debug!(error = %err, code = err.code(), "request rejected");
    ServerMessage::Error {
        code: err.code(),
        message: err.to_string(),
    }
}

async fn send<C: Codec>(
    conn: &WebSocketConnection,
    codec: &C,
    frame: &Envelope<ServerMessage>,
) -> Result<(), ImposterError> {
    let bytes = codec.encode(frame)?;
    conn.send(&bytes).await?;
    Ok(())
}

fn millis(start: &Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Increments and returns the next sequence number.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_seq_increments() {
        let mut seq = 1;
        assert_eq!(next_seq(&mut seq), 1);
        assert_eq!(next_seq(&mut seq), 2);
        assert_eq!(seq, 3);
    }

    #[test]
    fn test_rejected_carries_room_error_code() {
        let msg = rejected(&RoomError::NotHost);
        assert_eq!(
            msg,
            ServerMessage::Error {
                code: 403,
                message: "only the host can start the next round".into(),
            }
        );
    }

    #[test]
    fn test_watch_remembers_room() {
        let mut watched = HashSet::new();
        let view = RoomView {
            room_id: RoomCode::parse("K7QX2M").unwrap(),
            player_id: imposter_protocol::PlayerId("p1".into()),
            name: "Ana".into(),
            is_host: true,
            round: 1,
            role: None,
            word: None,
            pack_id: Default::default(),
            imposters: 1,
            players: vec![],
        };
        let msg = watch(&mut watched, view.clone());
        assert_eq!(msg, ServerMessage::Room(view));
        assert!(watched.contains(&RoomCode::parse("K7QX2M").unwrap()));
    }
}
