//! End-to-end tests: boot the server in-process on an ephemeral port and talk to it
//! over real WebSocket / HTTP connections.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use hiroba_server::{app::build_server, config::ServerConfig};
use serde_json::{Value, json};
use tokio::{net::TcpStream, sync::oneshot, task::JoinHandle};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{self, Message},
};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Helper struct to manage server lifecycle
struct TestServer {
    port: u16,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with(ServerConfig::default()).await
    }

    /// Start a server on port 0 with the given configuration
    async fn start_with(config: ServerConfig) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let port = listener.local_addr().unwrap().port();
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();

        let server = build_server(&config);
        let handle = tokio::spawn(async move {
            let _ = server
                .serve(listener, async {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        TestServer {
            port,
            shutdown: Some(shutdown),
            handle,
        }
    }

    fn ws_url(&self, query: &str) -> String {
        format!("ws://127.0.0.1:{}/ws{}", self.port, query)
    }

    fn http_url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }

    async fn connect(&self, user_id: &str, nickname: &str) -> TestClient {
        TestClient::connect(&self.ws_url(&format!("?user_id={}&nickname={}", user_id, nickname)))
            .await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        self.handle.abort();
    }
}

/// Helper struct wrapping one WebSocket connection
struct TestClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    async fn connect(url: &str) -> Self {
        let (stream, _) = connect_async(url).await.expect("Failed to connect");
        let mut client = TestClient { stream };
        // 接続直後は必ずルーム一覧が届く
        client.expect("update_rooms").await;
        client
    }

    async fn send(&mut self, event: Value) {
        self.stream
            .send(Message::Text(event.to_string().into()))
            .await
            .expect("Failed to send event");
    }

    async fn join(&mut self, room: &str) -> Value {
        self.send(json!({"type": "join", "room": room})).await;
        self.expect("chat_history").await
    }

    /// Receive the next JSON event, or `None` on timeout / close
    async fn recv(&mut self, timeout: Duration) -> Option<Value> {
        loop {
            let msg = tokio::time::timeout(timeout, self.stream.next())
                .await
                .ok()??
                .ok()?;
            match msg {
                Message::Text(text) => return serde_json::from_str(text.as_str()).ok(),
                Message::Close(_) => return None,
                _ => continue,
            }
        }
    }

    /// Skip events until one of the given type arrives
    async fn expect(&mut self, kind: &str) -> Value {
        let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            let event = self
                .recv(remaining)
                .await
                .unwrap_or_else(|| panic!("Timed out waiting for '{}' event", kind));
            if event["type"] == kind {
                return event;
            }
        }
    }

    /// Skip system notices and return the next chat message
    async fn expect_chat(&mut self) -> Value {
        loop {
            let event = self.expect("message").await;
            if event["userId"] != "system" {
                return event;
            }
        }
    }

    /// Assert that no event of the given type arrives within `within`
    async fn expect_none(&mut self, kind: &str, within: Duration) {
        let deadline = tokio::time::Instant::now() + within;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return;
            }
            match self.recv(remaining).await {
                Some(event) if event["type"] == kind => {
                    panic!("Unexpected '{}' event: {}", kind, event)
                }
                Some(_) => continue,
                None => return,
            }
        }
    }

    async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}

#[tokio::test]
async fn test_health_check() {
    // テスト項目: /api/health が {"status":"ok"} を返す
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let response = reqwest::get(server.http_url("/api/health")).await.unwrap();

    // then (期待する結果):
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_message_is_broadcast_to_room_including_sender() {
    // テスト項目: メッセージは送信者を含むルーム全員に同じタイムスタンプで届き、履歴に残る
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect("u1", "Alice").await;
    let mut bob = server.connect("u2", "Bob").await;
    let mut carol = server.connect("u3", "Carol").await;
    alice.join("lobby").await;
    bob.join("lobby").await;
    carol.join("side").await;

    // when (操作):
    alice
        .send(json!({
            "type": "message",
            "room": "lobby",
            "message": "hi",
            "userId": "u1",
            "nickname": "Alice"
        }))
        .await;

    // then (期待する結果):
    // alice には先に bob の入室通知が届いている
    let to_alice = alice.expect_chat().await;
    let to_bob = bob.expect_chat().await;
    assert_eq!(to_alice["message"], "hi");
    assert_eq!(to_alice["userId"], "u1");
    assert_eq!(to_alice, to_bob);
    assert!(to_alice["timestamp"].as_i64().unwrap() > 0);
    carol.expect_none("message", Duration::from_millis(200)).await;

    let mut dave = server.connect("u4", "Dave").await;
    let history = dave.join("lobby").await;
    assert_eq!(history["room"], "lobby");
    let history = history["history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["message"], "hi");
    assert_eq!(history[0]["timestamp"], to_alice["timestamp"]);
}

#[tokio::test]
async fn test_join_announces_to_other_members() {
    // テスト項目: 入室すると他のメンバーに System 名義の通知とメンバー一覧が届く
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect("u1", "Alice").await;
    alice.join("lobby").await;
    alice.expect("user_list").await;
    let mut bob = server.connect("u2", "Bob").await;

    // when (操作):
    bob.join("lobby").await;

    // then (期待する結果):
    let notice = alice.expect("message").await;
    assert_eq!(notice["nickname"], "System");
    assert_eq!(notice["userId"], "system");
    assert_eq!(notice["message"], "Bob has joined the room.");
    let users = alice.expect("user_list").await;
    assert_eq!(users["users"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_typing_is_not_echoed_to_same_user() {
    // テスト項目: 入力中イベントは同じユーザーの別タブには届かず、他のユーザーには届く
    // given (前提条件):
    let server = TestServer::start().await;
    let mut tab1 = server.connect("u1", "Alice").await;
    let mut tab2 = server.connect("u1", "Alice").await;
    let mut bob = server.connect("u2", "Bob").await;
    tab1.join("lobby").await;
    tab2.join("lobby").await;
    bob.join("lobby").await;

    // when (操作):
    tab1.send(json!({"type": "typing", "room": "lobby", "isTyping": true}))
        .await;

    // then (期待する結果):
    let typing = bob.expect("typing").await;
    assert_eq!(typing["isTyping"], true);
    assert_eq!(typing["userId"], "u1");
    assert_eq!(typing["nickname"], "Alice");
    tab2.expect_none("typing", Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_typing_expires_without_refresh() {
    // テスト項目: 更新のない入力中表示はサーバーが isTyping:false を配信して消す
    // given (前提条件):
    let server = TestServer::start_with(ServerConfig {
        typing_timeout: Duration::from_millis(100),
        typing_sweep_interval: Duration::from_millis(20),
        ..ServerConfig::default()
    })
    .await;
    let mut alice = server.connect("u1", "Alice").await;
    let mut bob = server.connect("u2", "Bob").await;
    alice.join("lobby").await;
    bob.join("lobby").await;

    // when (操作):
    alice
        .send(json!({"type": "typing", "room": "lobby", "isTyping": true}))
        .await;

    // then (期待する結果):
    assert_eq!(bob.expect("typing").await["isTyping"], true);
    assert_eq!(bob.expect("typing").await["isTyping"], false);
}

#[tokio::test]
async fn test_message_to_room_not_joined_is_rejected() {
    // テスト項目: 参加していないルームへの送信は送信元にだけ error イベントが返る
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect("u1", "Alice").await;
    let mut bob = server.connect("u2", "Bob").await;
    bob.join("lobby").await;

    // when (操作):
    alice
        .send(json!({"type": "message", "room": "lobby", "message": "sneaky"}))
        .await;

    // then (期待する結果):
    let error = alice.expect("error").await;
    assert_eq!(error["code"], "not_in_room");
    bob.expect_none("message", Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_invalid_payloads_are_rejected() {
    // テスト項目: 壊れた JSON・空のメッセージは error イベントで拒否され、接続は維持される
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect("u1", "Alice").await;
    alice.join("lobby").await;

    // when (操作):
    alice
        .stream
        .send(Message::Text("not json".into()))
        .await
        .unwrap();
    let invalid_payload = alice.expect("error").await;
    alice
        .send(json!({"type": "message", "room": "lobby", "message": "   "}))
        .await;
    let invalid_message = alice.expect("error").await;

    // then (期待する結果):
    assert_eq!(invalid_payload["code"], "invalid_payload");
    assert_eq!(invalid_message["code"], "invalid_message");
    alice
        .send(json!({"type": "message", "room": "lobby", "message": "still here"}))
        .await;
    assert_eq!(alice.expect("message").await["message"], "still here");
}

#[tokio::test]
async fn test_disconnect_notifies_room() {
    // テスト項目: 切断すると残ったメンバーに退室通知が届く
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect("u1", "Alice").await;
    let mut bob = server.connect("u2", "Bob").await;
    alice.join("lobby").await;
    bob.join("lobby").await;

    // when (操作):
    alice.close().await;

    // then (期待する結果):
    loop {
        let notice = bob.expect("message").await;
        if notice["message"] == "Alice has left the room." {
            assert_eq!(notice["userId"], "system");
            break;
        }
    }
    let users = bob.expect("user_list").await;
    assert_eq!(users["users"], json!([{"userId": "u2", "nickname": "Bob"}]));
}

#[tokio::test]
async fn test_update_rooms_lists_created_rooms() {
    // テスト項目: ルームが作られると全接続にルーム一覧が作成順で届く
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect("u1", "Alice").await;
    let mut observer = server.connect("u9", "Observer").await;

    // when (操作):
    alice.join("default").await;
    alice.join("another").await;

    // then (期待する結果):
    assert_eq!(
        observer.expect("update_rooms").await["rooms"],
        json!(["default"])
    );
    assert_eq!(
        observer.expect("update_rooms").await["rooms"],
        json!(["default", "another"])
    );

    // 後から接続したクライアントにも一覧が届く
    let (mut stream, _) = connect_async(server.ws_url("")).await.unwrap();
    let first = stream.next().await.unwrap().unwrap();
    let first: Value = serde_json::from_str(first.to_text().unwrap()).unwrap();
    assert_eq!(
        first,
        json!({"type": "update_rooms", "rooms": ["default", "another"]})
    );
}

#[tokio::test]
async fn test_invalid_identity_is_rejected_with_400() {
    // テスト項目: 長すぎる nickname での接続は HTTP 400 で拒否される
    // given (前提条件):
    let server = TestServer::start().await;
    let url = server.ws_url(&format!("?nickname={}", "n".repeat(65)));

    // when (操作):
    let result = connect_async(url).await;

    // then (期待する結果):
    match result {
        Err(tungstenite::Error::Http(response)) => {
            assert_eq!(response.status(), 400);
        }
        other => panic!("Expected HTTP 400, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_connection_limit_is_enforced() {
    // テスト項目: 接続数上限を超える接続は HTTP 503 で拒否される
    // given (前提条件):
    let server = TestServer::start_with(ServerConfig {
        max_connections: 1,
        ..ServerConfig::default()
    })
    .await;
    let _alice = server.connect("u1", "Alice").await;

    // when (操作):
    let result = connect_async(server.ws_url("?user_id=u2")).await;

    // then (期待する結果):
    match result {
        Err(tungstenite::Error::Http(response)) => {
            assert_eq!(response.status(), 503);
        }
        other => panic!("Expected HTTP 503, got {:?}", other.map(|_| ())),
    }
}
