//! WebSocket client for a remote Room Service.
//!
//! One socket carries every request. A reader task matches replies to
//! requests by `reply_to` and fans push notices out on a broadcast
//! channel, so several requests (a sync and a nextRound, say) can be in
//! flight at once.
//!
//! The server hangs up on connections that stay quiet past its idle
//! timeout. When that happens the next request dials again, so a form
//! left open for a while still submits.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use imposter_protocol::{
    ClientMessage, Codec, CreateRoom, Envelope, JoinRoom, JsonCodec, RoomChanged, RoomRequest,
    RoomView, ServerMessage,
};
use imposter_session::{RoomService, ServiceError};
use imposter_transport::{Connection, TransportError, WebSocketConnection};
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::ImposterError;

const NOTICE_CHANNEL_SIZE: usize = 64;

/// Settings for [`RemoteRoomService`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// A request with no reply after this long fails with a transport
    /// error. The reply, if it ever comes, is dropped.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Waiting requests by `seq`. `None` once the reader has stopped.
type Pending = Arc<Mutex<Option<HashMap<u64, oneshot::Sender<ServerMessage>>>>>;

fn lock(pending: &Pending) -> MutexGuard<'_, Option<HashMap<u64, oneshot::Sender<ServerMessage>>>> {
    pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn closed() -> ServiceError {
    ServiceError::Transport("connection closed".into())
}

/// One dialed socket and the reader task draining it.
struct Link {
    conn: Arc<WebSocketConnection>,
    pending: Pending,
    reader: JoinHandle<()>,
}

impl Link {
    async fn open(
        url: &str,
        notices: broadcast::Sender<RoomChanged>,
    ) -> Result<Self, TransportError> {
        let conn = Arc::new(WebSocketConnection::connect(url).await?);
        let pending: Pending = Arc::new(Mutex::new(Some(HashMap::new())));
        let reader = tokio::spawn(read_loop(
            Arc::clone(&conn),
            JsonCodec,
            Arc::clone(&pending),
            notices,
        ));
        Ok(Self {
            conn,
            pending,
            reader,
        })
    }

    /// The reader empties `pending` to `None` on its way out.
    fn is_open(&self) -> bool {
        lock(&self.pending).is_some()
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// A [`RoomService`] on the other end of a WebSocket.
pub struct RemoteRoomService {
    url: String,
    codec: JsonCodec,
    config: ClientConfig,
    seq: AtomicU64,
    link: tokio::sync::Mutex<Option<Arc<Link>>>,
    notices: broadcast::Sender<RoomChanged>,
    start: Instant,
}

impl RemoteRoomService {
    /// Dials `url` (e.g. `ws://127.0.0.1:8080`) and starts the reader task.
    pub async fn connect(url: &str, config: ClientConfig) -> Result<Self, ImposterError> {
        let (notices, _) = broadcast::channel(NOTICE_CHANNEL_SIZE);
        let link = Link::open(url, notices.clone()).await?;
        tracing::info!(url, "connected to room service");

        Ok(Self {
            url: url.to_string(),
            codec: JsonCodec,
            config,
            seq: AtomicU64::new(1),
            link: tokio::sync::Mutex::new(Some(Arc::new(link))),
            notices,
            start: Instant::now(),
        })
    }

    /// Round-trip time of one heartbeat.
    pub async fn heartbeat(&self) -> Result<Duration, ServiceError> {
        let sent = Instant::now();
        let client_time = sent.duration_since(self.start).as_millis() as u64;
        match self.call(ClientMessage::Heartbeat { client_time }).await? {
            ServerMessage::HeartbeatAck {
                client_time: echoed,
                server_time,
            } if echoed == client_time => {
                let rtt = sent.elapsed();
                tracing::debug!(rtt_ms = rtt.as_millis() as u64, server_time, "heartbeat");
                Ok(rtt)
            }
            other => Err(unexpected(other)),
        }
    }

    /// Whether the current socket is usable. A closed one is replaced on
    /// the next request.
    pub async fn is_connected(&self) -> bool {
        self.link.lock().await.as_ref().is_some_and(|link| link.is_open())
    }

    /// Closes the socket. Pending requests fail with a transport error; a
    /// later request dials again.
    pub async fn close(&self) -> Result<(), ImposterError> {
        let link = self.link.lock().await.take();
        if let Some(link) = link {
            link.conn.close().await?;
        }
        Ok(())
    }

    /// The open link, dialing a new one if the last has closed.
    async fn link(&self) -> Result<Arc<Link>, ServiceError> {
        let mut slot = self.link.lock().await;
        if let Some(link) = slot.as_ref().filter(|link| link.is_open()) {
            return Ok(Arc::clone(link));
        }

        let link = Link::open(&self.url, self.notices.clone())
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        tracing::info!(url = %self.url, "reconnected to room service");
        let link = Arc::new(link);
        *slot = Some(Arc::clone(&link));
        Ok(link)
    }

    /// Sends one request and waits for its reply.
    async fn call(&self, msg: ClientMessage) -> Result<ServerMessage, ServiceError> {
        let link = self.link().await?;
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        match lock(&link.pending).as_mut() {
            Some(waiting) => waiting.insert(seq, tx),
            None => return Err(closed()),
        };

        let timestamp = self.start.elapsed().as_millis() as u64;
        let sent = async {
            let bytes = self
                .codec
                .encode(&Envelope::request(seq, timestamp, msg))
                .map_err(|e| ServiceError::Transport(e.to_string()))?;
            link.conn
                .send(&bytes)
                .await
                .map_err(|e| ServiceError::Transport(e.to_string()))
        };
        if let Err(e) = sent.await {
            forget(&link.pending, seq);
            return Err(e);
        }

        match tokio::time::timeout(self.config.request_timeout, rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(closed()),
            Err(_) => {
                forget(&link.pending, seq);
                tracing::debug!(seq, "request timed out");
                Err(ServiceError::Transport("request timed out".into()))
            }
        }
    }

    async fn call_for_view(&self, msg: ClientMessage) -> Result<RoomView, ServiceError> {
        match self.call(msg).await? {
            ServerMessage::Room(view) => Ok(view),
            other => Err(unexpected(other)),
        }
    }
}

fn forget(pending: &Pending, seq: u64) {
    if let Some(waiting) = lock(pending).as_mut() {
        waiting.remove(&seq);
    }
}

/// Maps a reply that isn't the one asked for. Service errors become
/// `Rejected`; anything else is a protocol mix-up.
fn unexpected(reply: ServerMessage) -> ServiceError {
    match reply {
        ServerMessage::Error { code, message } => ServiceError::Rejected { code, message },
        other => ServiceError::Transport(format!("unexpected reply: {other:?}")),
    }
}

impl RoomService for RemoteRoomService {
    async fn create(&self, req: CreateRoom) -> Result<RoomView, ServiceError> {
        self.call_for_view(ClientMessage::Create(req)).await
    }

    async fn join(&self, req: JoinRoom) -> Result<RoomView, ServiceError> {
        self.call_for_view(ClientMessage::Join(req)).await
    }

    async fn next_round(&self, req: RoomRequest) -> Result<RoomView, ServiceError> {
        self.call_for_view(ClientMessage::NextRound(req)).await
    }

    async fn sync(&self, req: RoomRequest) -> Result<RoomView, ServiceError> {
        self.call_for_view(ClientMessage::Sync(req)).await
    }

    async fn leave(&self, req: RoomRequest) -> Result<(), ServiceError> {
        match self.call(ClientMessage::Leave(req)).await? {
            ServerMessage::Left { .. } => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    fn notifications(&self) -> Option<broadcast::Receiver<RoomChanged>> {
        Some(self.notices.subscribe())
    }
}

/// Routes incoming frames until the socket closes, then fails everything
/// still waiting.
async fn read_loop(
    conn: Arc<WebSocketConnection>,
    codec: JsonCodec,
    pending: Pending,
    notices: broadcast::Sender<RoomChanged>,
) {
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!("room service closed the connection");
                break;
            }
            Err(e) => {
                tracing::debug!(error = %e, "room service recv error");
                break;
            }
        };

        let envelope: Envelope<ServerMessage> = match codec.decode(&data) {
            Ok(env) => env,
            Err(e) => {
                tracing::warn!(error = %e, "failed to decode server frame");
                continue;
            }
        };

        match (envelope.reply_to, envelope.payload) {
            (Some(reply_to), payload) => {
                let waiter = lock(&pending).as_mut().and_then(|w| w.remove(&reply_to));
                match waiter {
                    Some(tx) => {
                        let _ = tx.send(payload);
                    }
                    None => tracing::debug!(reply_to, "reply for unknown or expired request"),
                }
            }
            (None, ServerMessage::RoomChanged(changed)) => {
                let _ = notices.send(changed);
            }
            (None, ServerMessage::Error { code, message }) => {
                tracing::warn!(code, %message, "server reported an error");
            }
            (None, other) => tracing::debug!(?other, "ignoring unsolicited frame"),
        }
    }

    // Dropping the senders wakes every waiter with an error.
    lock(&pending).take();
}
