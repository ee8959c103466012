//! End-to-end tests driving a real listener: REST flows over reqwest and
//! live pushes over a real WebSocket client.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;

type Ws = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn spawn_server(name: &str) -> SocketAddr {
    let db_path = std::env::temp_dir().join(format!("ember_test_{}_{}.db", name, std::process::id()));
    let _ = std::fs::remove_file(&db_path);

    let state = ember_server::build_state(&db_path, "integration-test-secret").unwrap();
    let app = ember_server::app(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Register a user and return their token (also set as the jwt cookie, but
/// the tests pass it explicitly so each user keeps their own identity).
async fn register(client: &reqwest::Client, addr: SocketAddr, username: &str) -> String {
    let resp = client
        .post(format!("http://{addr}/auth/register"))
        .json(&json!({ "username": username, "password": "hunter2hunter2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let body: Value = resp.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

fn cookie(token: &str) -> String {
    format!("jwt={token}")
}

async fn connect_ws(addr: SocketAddr, token: Option<&str>) -> Ws {
    let mut request = format!("ws://{addr}/ws").into_client_request().unwrap();
    if let Some(token) = token {
        request.headers_mut().insert(
            "Cookie",
            HeaderValue::from_str(&cookie(token)).unwrap(),
        );
    }
    let (ws, _) = tokio_tungstenite::connect_async(request).await.unwrap();
    ws
}

async fn next_json(ws: &mut Ws) -> Value {
    let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("timed out waiting for frame")
        .expect("stream ended")
        .expect("websocket error");
    let text = msg.into_text().unwrap();
    serde_json::from_str(&text).unwrap()
}

#[tokio::test]
async fn protected_routes_reject_bad_tokens() {
    let addr = spawn_server("auth_reject").await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("http://{addr}/whoami"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "MISSING_TOKEN");

    let resp = client
        .get(format!("http://{addr}/whoami"))
        .header("Cookie", "jwt=not.a.token")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn register_validates_and_rejects_duplicates() {
    let addr = spawn_server("register").await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{addr}/auth/register"))
        .json(&json!({ "username": "al", "password": "hunter2hunter2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    let token = register(&client, addr, "alice").await;

    let resp = client
        .post(format!("http://{addr}/auth/register"))
        .json(&json!({ "username": "alice", "password": "hunter2hunter2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "USERNAME_TAKEN");

    let resp = client
        .get(format!("http://{addr}/whoami"))
        .header("Cookie", cookie(&token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["username"], "alice");
}

#[tokio::test]
async fn like_match_unlike_flow() {
    let addr = spawn_server("like_flow").await;
    let client = reqwest::Client::new();
    let alice = register(&client, addr, "alice").await;
    let bob = register(&client, addr, "bob").await;

    // alice likes bob: one-directional edge.
    let resp = client
        .post(format!("http://{addr}/likes"))
        .header("Cookie", cookie(&alice))
        .json(&json!({ "username": "bob" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["outcome"], "LIKED");

    // bob sees the LIKE notification in his unread history.
    let resp = client
        .get(format!("http://{addr}/notifications"))
        .header("Cookie", cookie(&bob))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let notifications = body["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["author"], "alice");
    assert_eq!(notifications[0]["message"], "LIKE");

    // bob likes back: matched, both notified.
    let resp = client
        .post(format!("http://{addr}/likes"))
        .header("Cookie", cookie(&bob))
        .json(&json!({ "username": "alice" }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["outcome"], "MATCHED");

    let resp = client
        .get(format!("http://{addr}/notifications"))
        .header("Cookie", cookie(&alice))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let notifications = body["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["message"], "MATCH");
    assert_eq!(notifications[0]["author"], "bob");

    // Liking again fails without disturbing the match.
    let resp = client
        .post(format!("http://{addr}/likes"))
        .header("Cookie", cookie(&bob))
        .json(&json!({ "username": "alice" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "ALREADY_LIKED");

    // bob clears his history.
    let resp = client
        .get(format!("http://{addr}/notifications"))
        .header("Cookie", cookie(&bob))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let ids: Vec<i64> = body["notifications"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids.len(), 2);

    let resp = client
        .put(format!("http://{addr}/notifications/read"))
        .header("Cookie", cookie(&bob))
        .json(&json!({ "ids": ids }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = client
        .get(format!("http://{addr}/notifications"))
        .header("Cookie", cookie(&bob))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["notifications"].as_array().unwrap().is_empty());

    // alice unlikes: the match dissolves and a re-like starts over.
    let resp = client
        .delete(format!("http://{addr}/likes/bob"))
        .header("Cookie", cookie(&alice))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["outcome"], "UNMATCHED_TOO");

    let resp = client
        .post(format!("http://{addr}/likes"))
        .header("Cookie", cookie(&alice))
        .json(&json!({ "username": "bob" }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["outcome"], "LIKED");
}

#[tokio::test]
async fn self_like_is_rejected() {
    let addr = spawn_server("self_like").await;
    let client = reqwest::Client::new();
    let alice = register(&client, addr, "alice").await;

    let resp = client
        .post(format!("http://{addr}/likes"))
        .header("Cookie", cookie(&alice))
        .json(&json!({ "username": "alice" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_USER");
}

#[tokio::test]
async fn chat_send_survives_offline_receiver() {
    let addr = spawn_server("chat").await;
    let client = reqwest::Client::new();
    let alice = register(&client, addr, "alice").await;
    let bob = register(&client, addr, "bob").await;

    // bob has no live connection; the send must still succeed.
    let resp = client
        .post(format!("http://{addr}/chats"))
        .header("Cookie", cookie(&alice))
        .json(&json!({ "username": "bob", "message": "hey there" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = client
        .get(format!("http://{addr}/chats/alice"))
        .header("Cookie", cookie(&bob))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let chats = body["chats"].as_array().unwrap();
    assert_eq!(chats.len(), 1);
    assert_eq!(chats[0]["sender"], "alice");
    assert_eq!(chats[0]["message"], "hey there");

    // The MSG notification waits in bob's unread history instead.
    let resp = client
        .get(format!("http://{addr}/notifications"))
        .header("Cookie", cookie(&bob))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["notifications"][0]["message"], "MSG");
}

#[tokio::test]
async fn ws_rejects_missing_token() {
    let addr = spawn_server("ws_no_token").await;

    let mut ws = connect_ws(addr, None).await;
    let frame = next_json(&mut ws).await;
    assert_eq!(frame["type"], "ERROR");
    assert_eq!(frame["error"], "token missing, try again");
}

#[tokio::test]
async fn ws_rejects_garbage_token() {
    let addr = spawn_server("ws_bad_token").await;

    let mut ws = connect_ws(addr, Some("three.bogus.segments")).await;
    let frame = next_json(&mut ws).await;
    assert_eq!(frame["type"], "ERROR");
    assert_eq!(frame["error"], "Authentication failed, please re-authenticate");
}

#[tokio::test]
async fn ws_ping_pong_and_live_push() {
    let addr = spawn_server("ws_push").await;
    let client = reqwest::Client::new();
    let alice = register(&client, addr, "alice").await;
    let bob = register(&client, addr, "bob").await;

    let mut ws = connect_ws(addr, Some(&alice)).await;

    ws.send(Message::Text(r#"{"type":"PING"}"#.into())).await.unwrap();
    let frame = next_json(&mut ws).await;
    assert_eq!(frame["type"], "PONG");
    assert_eq!(frame["message"], "Pong");

    // Unknown frame types get the permissive fallback.
    ws.send(Message::Text(r#"{"type":"DANCE"}"#.into())).await.unwrap();
    let frame = next_json(&mut ws).await;
    assert_eq!(frame["type"], "PONG");
    assert_eq!(frame["message"], "what?");

    // bob likes alice over HTTP; alice's socket receives the push.
    let resp = client
        .post(format!("http://{addr}/likes"))
        .header("Cookie", cookie(&bob))
        .json(&json!({ "username": "alice" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let frame = next_json(&mut ws).await;
    assert_eq!(frame["type"], "NEW");
    assert_eq!(frame["author"], "bob");
    assert_eq!(frame["message"], "LIKE");
    assert_eq!(frame["read_status"], false);
}

#[tokio::test]
async fn newer_connection_takes_over_pushes() {
    let addr = spawn_server("ws_replace").await;
    let client = reqwest::Client::new();
    let alice = register(&client, addr, "alice").await;
    let bob = register(&client, addr, "bob").await;

    let mut first = connect_ws(addr, Some(&alice)).await;
    // Make sure the first connection is fully registered before the second
    // one takes over.
    first.send(Message::Text(r#"{"type":"PING"}"#.into())).await.unwrap();
    next_json(&mut first).await;

    let mut second = connect_ws(addr, Some(&alice)).await;
    second.send(Message::Text(r#"{"type":"PING"}"#.into())).await.unwrap();
    next_json(&mut second).await;

    let resp = client
        .post(format!("http://{addr}/likes"))
        .header("Cookie", cookie(&bob))
        .json(&json!({ "username": "alice" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    // Only the newer connection receives the push.
    let frame = next_json(&mut second).await;
    assert_eq!(frame["type"], "NEW");

    // The replaced connection is not closed and still answers PING.
    first.send(Message::Text(r#"{"type":"PING"}"#.into())).await.unwrap();
    let frame = next_json(&mut first).await;
    assert_eq!(frame["type"], "PONG");
    assert_eq!(frame["message"], "Pong");
}
