//! End-to-end wiring tests: login, cache bootstrap, room session,
//! live append, read-marker persistence — against an in-process
//! REST + WebSocket fixture.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use causerie_client::{ClientConfig, ClientError, ClientEvent, ClientState};
use causerie_net::FeedState;
use causerie_shared::{MessageId, RoomId, ServerId, UserId};
use causerie_store::{MergedView, StoreError};

const TOKEN: &str = "jwt-e2e";

struct Fixture {
    user_id: UserId,
    server_id: ServerId,
    room_id: RoomId,
    m1: MessageId,
    m2: MessageId,
    clock: AtomicI64,
    /// Read-status patches the backend received.
    patches: Mutex<Vec<Value>>,
    /// Frames pushed to every connected room feed.
    push_tx: broadcast::Sender<String>,
}

impl Fixture {
    fn new() -> Arc<Self> {
        let (push_tx, _) = broadcast::channel(32);
        Arc::new(Self {
            user_id: UserId::new(),
            server_id: ServerId::new(),
            room_id: RoomId::new(),
            m1: MessageId::new(),
            m2: MessageId::new(),
            clock: AtomicI64::new(1_700_000_300),
            patches: Mutex::new(Vec::new()),
            push_tx,
        })
    }

    fn user_json(&self) -> Value {
        json!({
            "id": self.user_id,
            "username": "ada",
            "createdAt": 1_700_000_000,
            "updatedAt": 1_700_000_000,
        })
    }

    fn message_json(&self, id: MessageId, content: &str, created_at: i64) -> Value {
        json!({
            "id": id,
            "authorId": self.user_id,
            "roomId": self.room_id,
            "serverId": self.server_id,
            "content": content,
            "createdAt": created_at,
            "updatedAt": created_at,
            "author": self.user_json(),
        })
    }

    /// A fresh server-assigned message, timestamps strictly increasing.
    fn make_message(&self, content: &str) -> Value {
        let at = self.clock.fetch_add(1, Ordering::SeqCst);
        self.message_json(MessageId::new(), content, at)
    }

    fn push(&self, frame: String) {
        self.push_tx.send(frame).unwrap();
    }
}

async fn post_session(State(f): State<Arc<Fixture>>) -> impl IntoResponse {
    Json(json!({"token": TOKEN, "user": f.user_json()}))
}

async fn get_users(State(f): State<Arc<Fixture>>) -> impl IntoResponse {
    Json(f.user_json())
}

async fn get_servers(State(f): State<Arc<Fixture>>) -> impl IntoResponse {
    Json(json!([{
        "id": f.server_id,
        "name": "general",
        "ownerId": f.user_id,
        "createdAt": 1_700_000_000,
        "updatedAt": 1_700_000_000,
        "status": {
            "id": "sus-1",
            "userId": f.user_id,
            "serverId": f.server_id,
        },
    }]))
}

async fn get_rooms(State(f): State<Arc<Fixture>>) -> impl IntoResponse {
    Json(json!([{
        "id": f.room_id,
        "serverId": f.server_id,
        "name": "welcome",
        "groupName": "Text Rooms",
        "type": "server_room",
        "createdAt": 1_700_000_000,
        "updatedAt": 1_700_000_000,
        "status": {
            "id": "rus-1",
            "userId": f.user_id,
            "roomId": f.room_id,
            "lastReadMsgId": f.m2,
            "isCleared": true,
        },
    }]))
}

async fn get_messages(State(f): State<Arc<Fixture>>) -> impl IntoResponse {
    Json(json!([
        f.message_json(f.m1, "m1", 1_700_000_100),
        f.message_json(f.m2, "m2", 1_700_000_200),
    ]))
}

async fn patch_status(State(f): State<Arc<Fixture>>, Json(body): Json<Value>) -> impl IntoResponse {
    f.patches.lock().unwrap().push(body);
    StatusCode::NO_CONTENT
}

async fn ws_room(ws: WebSocketUpgrade, State(f): State<Arc<Fixture>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, f))
}

async fn handle_socket(mut socket: WebSocket, f: Arc<Fixture>) {
    let mut pushes = f.push_tx.subscribe();
    loop {
        tokio::select! {
            inbound = socket.recv() => match inbound {
                Some(Ok(WsMessage::Text(text))) => {
                    // Persist-and-reflect, like the backend: the sender
                    // gets its message back through the same stream.
                    let frame: Value = serde_json::from_str(&text).unwrap();
                    let content = frame["content"].as_str().unwrap_or_default();
                    let reflected = f.make_message(content);
                    if socket.send(WsMessage::Text(reflected.to_string())).await.is_err() {
                        return;
                    }
                }
                Some(Ok(_)) => {}
                _ => return,
            },
            push = pushes.recv() => match push {
                Ok(text) => {
                    if socket.send(WsMessage::Text(text)).await.is_err() {
                        return;
                    }
                }
                Err(_) => return,
            },
        }
    }
}

async fn serve(fixture: Arc<Fixture>) -> (String, String) {
    let app = Router::new()
        .route("/v1/auth/sessions", post(post_session))
        .route("/v1/users", get(get_users))
        .route("/v1/servers", get(get_servers))
        .route("/v1/servers/:id/rooms", get(get_rooms))
        .route("/v1/rooms/:id/messages", get(get_messages))
        .route("/v1/rooms/:id/status", patch(patch_status))
        .route("/v1/rooms/:id", get(ws_room))
        .with_state(fixture);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), format!("ws://{addr}"))
}

async fn authed_state(fixture: &Arc<Fixture>) -> (ClientState, tempfile::TempDir) {
    let (base, ws_base) = serve(fixture.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = ClientConfig::new(base, ws_base);
    config.token_path = Some(dir.path().join("token"));

    let mut state = ClientState::new(config).unwrap();
    state.login("ada", "pw").await.unwrap();
    state.load_servers().await.unwrap();
    state.load_rooms(fixture.server_id).await.unwrap();
    (state, dir)
}

async fn next_event(session: &mut causerie_client::RoomSession) -> ClientEvent {
    tokio::time::timeout(Duration::from_secs(5), session.next_event())
        .await
        .expect("timed out waiting for client event")
        .expect("session ended")
}

/// Poll the fixture until the expected number of status patches landed.
async fn wait_for_patches(fixture: &Arc<Fixture>, count: usize) -> Vec<Value> {
    for _ in 0..100 {
        {
            let patches = fixture.patches.lock().unwrap();
            if patches.len() >= count {
                return patches.clone();
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("backend never received {count} status patch(es)");
}

#[tokio::test]
async fn test_session_restore_and_logout_lifecycle() {
    let fixture = Fixture::new();
    let (base, ws_base) = serve(fixture.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = ClientConfig::new(base, ws_base);
    config.token_path = Some(dir.path().join("token"));

    let mut state = ClientState::new(config).unwrap();
    assert!(!state.is_authenticated());

    assert!(state.restore_session().await.unwrap());
    assert!(state.is_authenticated());

    state.logout().unwrap();
    assert!(!state.is_authenticated());
    assert!(state.rest().tokens().load().is_none());
    assert!(matches!(
        state.caches().unwrap().servers(),
        Err(StoreError::NotLoaded)
    ));
}

#[tokio::test]
async fn test_missing_room_is_a_typed_not_found() {
    let fixture = Fixture::new();
    let (state, _dir) = authed_state(&fixture).await;

    let err = state.room(RoomId::new()).unwrap_err();
    assert!(matches!(err, ClientError::Store(StoreError::NotFound)));
}

#[tokio::test]
async fn test_open_room_merges_snapshot_and_live_feed() {
    let fixture = Fixture::new();
    let (state, _dir) = authed_state(&fixture).await;

    let mut session = state.open_room(fixture.room_id).await.unwrap();
    assert_eq!(session.feed_state(), FeedState::Open);
    assert_eq!(session.read_boundary(), Some(fixture.m2));

    // Snapshot only.
    let view = session.messages().unwrap();
    let messages = view.messages().expect("snapshot should be loaded");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].message.content, "m1");

    // Live append: the viewer sits at the bottom with a cleared
    // status, so the view auto-scrolls and the boundary advances.
    fixture.push(fixture.make_message("m3").to_string());
    match next_event(&mut session).await {
        ClientEvent::Message {
            message,
            auto_scroll,
        } => {
            assert_eq!(message.message.content, "m3");
            assert!(auto_scroll);
        }
        other => panic!("expected message event, got {other:?}"),
    }

    let view = session.messages().unwrap();
    let messages = view.messages().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[2].message.content, "m3");
    assert_eq!(session.read_boundary(), Some(messages[2].id()));

    // The advanced boundary reaches the backend exactly once.
    let patches = wait_for_patches(&fixture, 1).await;
    assert_eq!(patches[0], json!({"lastReadMsgId": messages[2].id()}));

    session.close().await;
}

#[tokio::test]
async fn test_scrolled_away_append_keeps_the_boundary() {
    let fixture = Fixture::new();
    let (state, _dir) = authed_state(&fixture).await;

    let mut session = state.open_room(fixture.room_id).await.unwrap();
    session.set_at_bottom(false);

    fixture.push(fixture.make_message("while-away").to_string());
    match next_event(&mut session).await {
        ClientEvent::Message { auto_scroll, .. } => assert!(!auto_scroll),
        other => panic!("expected message event, got {other:?}"),
    }

    // The unread boundary stays at the last read message.
    assert_eq!(session.read_boundary(), Some(fixture.m2));
    session.close().await;
}

#[tokio::test]
async fn test_send_renders_only_when_reflected() {
    let fixture = Fixture::new();
    let (state, _dir) = authed_state(&fixture).await;

    let mut session = state.open_room(fixture.room_id).await.unwrap();
    session.send("bonjour").await.unwrap();

    // Nothing is synthesized locally; the message shows up when the
    // server reflects it back.
    match next_event(&mut session).await {
        ClientEvent::Message { message, .. } => {
            assert_eq!(message.message.content, "bonjour");
            assert_eq!(message.author.username, "ada");
        }
        other => panic!("expected reflected message, got {other:?}"),
    }
    session.close().await;
}

#[tokio::test]
async fn test_mark_unread_moves_boundary_and_persists_once() {
    let fixture = Fixture::new();
    let (state, _dir) = authed_state(&fixture).await;

    let mut session = state.open_room(fixture.room_id).await.unwrap();
    assert_eq!(session.read_boundary(), Some(fixture.m2));

    session.mark_unread(fixture.m1).unwrap();
    // Optimistic: the local pointer moves before the write lands.
    assert_eq!(session.read_boundary(), Some(fixture.m1));

    let patches = wait_for_patches(&fixture, 1).await;
    assert_eq!(patches, vec![json!({"lastReadMsgId": fixture.m1})]);

    // The optimistic patch also reaches the cached room status.
    let room = state.room(fixture.room_id).unwrap();
    let status = room.status.unwrap();
    assert_eq!(status.last_read_msg_id, Some(fixture.m1));
    assert!(!status.is_cleared);

    session.close().await;
}

#[tokio::test]
async fn test_merged_view_dedups_snapshot_against_live_echo() {
    let fixture = Fixture::new();
    let (state, _dir) = authed_state(&fixture).await;

    let mut session = state.open_room(fixture.room_id).await.unwrap();

    // The feed replays m2 with richer content (the snapshot/stream
    // race); the merged view keeps exactly one copy, the stream's.
    fixture.push(
        fixture
            .message_json(fixture.m2, "edited-echo", 1_700_000_200)
            .to_string(),
    );
    match next_event(&mut session).await {
        ClientEvent::Message { message, .. } => {
            assert_eq!(message.message.content, "edited-echo")
        }
        other => panic!("expected message event, got {other:?}"),
    }

    let view = session.messages().unwrap();
    let messages = view.messages().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].id(), fixture.m2);
    assert_eq!(messages[1].message.content, "edited-echo");

    session.close().await;
}

#[tokio::test]
async fn test_snapshot_failure_is_distinguishable_from_empty() {
    // A fixture whose snapshot endpoint always fails.
    let fixture = Fixture::new();
    let failing = Router::new()
        .route("/v1/auth/sessions", post(post_session))
        .route("/v1/servers", get(get_servers))
        .route("/v1/servers/:id/rooms", get(get_rooms))
        .route(
            "/v1/rooms/:id/messages",
            get(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "INTERNAL_SERVER_ERROR"})),
                )
            }),
        )
        .route("/v1/rooms/:id", get(ws_room))
        .with_state(fixture.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, failing).await.unwrap();
    });

    let dir = tempfile::tempdir().unwrap();
    let mut config = ClientConfig::new(format!("http://{addr}"), format!("ws://{addr}"));
    config.token_path = Some(dir.path().join("token"));

    let mut state = ClientState::new(config).unwrap();
    state.login("ada", "pw").await.unwrap();
    state.load_servers().await.unwrap();
    state.load_rooms(fixture.server_id).await.unwrap();

    let session = state.open_room(fixture.room_id).await.unwrap();
    match session.messages().unwrap() {
        MergedView::Failed(err) => assert_eq!(err.status, 500),
        other => panic!("expected a failed view, got {other:?}"),
    }
    session.close().await;
}
