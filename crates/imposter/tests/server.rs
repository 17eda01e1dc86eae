//! End-to-end tests: a real server on an OS-assigned port, real clients.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use imposter::prelude::*;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

async fn start_with(builder: ImposterServerBuilder) -> String {
    let server = builder.bind("127.0.0.1:0").build().await.expect("should bind");
    let addr = server.local_addr().expect("bound address");
    tokio::spawn(server.run());
    format!("ws://{addr}")
}

async fn start() -> String {
    start_with(ImposterServer::builder()).await
}

async fn client(url: &str) -> RemoteRoomService {
    RemoteRoomService::connect(url, ClientConfig::default())
        .await
        .expect("client should connect")
}

fn create_req(name: &str) -> CreateRoom {
    CreateRoom {
        locale: Locale::default(),
        name: name.into(),
        pack_id: PackId::default(),
        imposters: 1,
    }
}

fn join_req(room_id: &RoomCode, name: &str) -> JoinRoom {
    JoinRoom {
        locale: Locale::default(),
        room_id: room_id.clone(),
        name: name.into(),
    }
}

fn req(view: &RoomView) -> RoomRequest {
    RoomRequest::for_view(Locale::default(), view)
}

// =========================================================================
// Room flow over the wire
// =========================================================================

#[tokio::test]
async fn test_three_clients_get_one_imposter() {
    let url = start().await;
    let (a, b, c) = (client(&url).await, client(&url).await, client(&url).await);

    let host = a.create(create_req("Ana")).await.unwrap();
    assert!(host.is_host);
    assert_eq!(host.role, None);

    let ben = b.join(join_req(&host.room_id, "Ben")).await.unwrap();
    let cleo = c.join(join_req(&host.room_id, "Cleo")).await.unwrap();

    let views = vec![
        a.sync(req(&host)).await.unwrap(),
        b.sync(req(&ben)).await.unwrap(),
        c.sync(req(&cleo)).await.unwrap(),
    ];
    assert!(views.iter().all(|v| v.round == 1 && v.is_dealt_in()));
    let imposters: Vec<_> = views.iter().filter(|v| v.role == Some(Role::Imposter)).collect();
    let crew: Vec<_> = views.iter().filter(|v| v.role == Some(Role::Crew)).collect();
    assert_eq!(imposters.len(), 1);
    assert_eq!(crew[0].word, crew[1].word);
    assert_ne!(crew[0].word, imposters[0].word);
}

#[tokio::test]
async fn test_rejections_carry_codes() {
    let url = start().await;
    let (a, b, c) = (client(&url).await, client(&url).await, client(&url).await);

    let missing = RoomCode::parse("ZZZZZZ").unwrap();
    let err = a.join(join_req(&missing, "Ana")).await.unwrap_err();
    assert_eq!(err.code(), Some(404));
    assert_eq!(err.to_string(), "room ZZZZZZ not found");

    let host = a.create(create_req("Ana")).await.unwrap();
    let ben = b.join(join_req(&host.room_id, "Ben")).await.unwrap();
    c.join(join_req(&host.room_id, "Cleo")).await.unwrap();

    let err = b.next_round(req(&ben)).await.unwrap_err();
    assert_eq!(err.code(), Some(403));
    assert_eq!(a.sync(req(&host)).await.unwrap().round, 1);

    let err = c.join(join_req(&host.room_id, "ana")).await.unwrap_err();
    assert_eq!(err.code(), Some(409));
}

#[tokio::test]
async fn test_push_notice_reaches_watchers() {
    let url = start().await;
    let (a, b) = (client(&url).await, client(&url).await);
    let mut notices = a.notifications().expect("remote service pushes");

    let host = a.create(create_req("Ana")).await.unwrap();
    b.join(join_req(&host.room_id, "Ben")).await.unwrap();

    let changed = tokio::time::timeout(Duration::from_secs(2), notices.recv())
        .await
        .expect("notice should arrive")
        .unwrap();
    assert_eq!(changed.room_id, host.room_id);
    assert_eq!(changed.round, 1);
}

#[tokio::test]
async fn test_leave_releases_seat() {
    let url = start().await;
    let (a, b) = (client(&url).await, client(&url).await);

    let host = a.create(create_req("Ana")).await.unwrap();
    let ben = b.join(join_req(&host.room_id, "Ben")).await.unwrap();

    a.leave(req(&host)).await.unwrap();
    assert_eq!(a.sync(req(&host)).await.unwrap_err().code(), Some(404));

    let ben = b.sync(req(&ben)).await.unwrap();
    assert!(ben.is_host);
    assert_eq!(ben.players.len(), 1);
}

#[tokio::test]
async fn test_heartbeat_round_trip() {
    let url = start().await;
    let a = client(&url).await;

    let rtt = a.heartbeat().await.unwrap();
    assert!(rtt < Duration::from_secs(5));
    assert!(a.is_connected().await);
}

// =========================================================================
// Client session against the real server
// =========================================================================

#[tokio::test]
async fn test_client_session_hosts_and_syncs() {
    let url = start().await;
    let service = Arc::new(client(&url).await);
    let session = ClientSession::new(Arc::clone(&service), SessionConfig::default());

    session.choose_host().unwrap();
    session.edit_create(|form| form.name = "Ana".into()).unwrap();
    let host = session.submit_create().await.unwrap();
    assert_eq!(session.step_kind(), StepKind::Room);
    assert!(session.is_syncing());

    let link = session.invite_link("https://play.example/").unwrap();
    let code = imposter_session::room_code_from_url(&link).unwrap();
    assert_eq!(code, host.room_id);

    let (b, c) = (client(&url).await, client(&url).await);
    b.join(join_req(&code, "Ben")).await.unwrap();
    c.join(join_req(&code, "Cleo")).await.unwrap();

    session.sync_now().await;
    let view = session.room().unwrap();
    assert!(view.is_dealt_in());
    assert_eq!(view.players.len(), 3);

    let next = session.next_round().await.unwrap();
    assert_eq!(next.round, 2);
    session.leave_room();
    assert_eq!(session.step_kind(), StepKind::Mode);
}

// =========================================================================
// Raw frames
// =========================================================================

#[tokio::test]
async fn test_malformed_frame_gets_error_reply() {
    let url = start().await;
    let (mut ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();

    ws.send(Message::text("not json")).await.unwrap();
    let reply = ws.next().await.unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_slice(reply.into_data().as_ref()).unwrap();

    assert_eq!(value["payload"]["type"], "Error");
    assert_eq!(value["payload"]["code"], 400);
    assert!(value.get("reply_to").is_none());
}

#[tokio::test]
async fn test_reply_echoes_request_seq() {
    let url = start().await;
    let (mut ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();

    let frame = r#"{"seq":41,"timestamp":0,"payload":{"type":"Heartbeat","client_time":7}}"#;
    ws.send(Message::text(frame)).await.unwrap();
    let reply = ws.next().await.unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_slice(reply.into_data().as_ref()).unwrap();

    assert_eq!(value["reply_to"], 41);
    assert_eq!(value["payload"]["type"], "HeartbeatAck");
    assert_eq!(value["payload"]["client_time"], 7);
}

#[tokio::test]
async fn test_idle_connection_is_closed() {
    let url = start_with(ImposterServer::builder().idle_timeout(Duration::from_millis(200))).await;
    let (mut ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();

    let next = tokio::time::timeout(Duration::from_secs(3), ws.next())
        .await
        .expect("server should hang up");
    assert!(matches!(next, None | Some(Ok(Message::Close(_))) | Some(Err(_))));
}

#[tokio::test]
async fn test_form_submits_after_server_drops_idle_socket() {
    let url = start_with(ImposterServer::builder().idle_timeout(Duration::from_millis(300))).await;
    let service = Arc::new(client(&url).await);
    let session = ClientSession::new(Arc::clone(&service), SessionConfig::default());

    session.choose_host().unwrap();
    session.edit_create(|form| form.name = "Ana".into()).unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(!service.is_connected().await);

    let host = session.submit_create().await.unwrap();
    assert_eq!(session.step_kind(), StepKind::Room);
    assert!(host.is_host);
    assert!(service.is_connected().await);
}

#[tokio::test]
async fn test_request_after_close_dials_again() {
    let url = start().await;
    let a = client(&url).await;

    a.close().await.unwrap();
    assert!(!a.is_connected().await);

    let host = a.create(create_req("Ana")).await.unwrap();
    assert_eq!(a.sync(req(&host)).await.unwrap().round, 1);
}
