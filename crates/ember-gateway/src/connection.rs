use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use ember_token::TokenCodec;
use ember_types::api::Claims;
use ember_types::events::{ClientFrame, ServerFrame};

use crate::registry::Registry;

/// Handle one live connection. `token` is the value of the `jwt` cookie
/// captured at the HTTP upgrade, if any. A missing or bad token gets a
/// single ERROR frame back and the socket is closed without registering.
pub async fn handle_socket(
    socket: WebSocket,
    registry: Registry,
    codec: Arc<TokenCodec>,
    token: Option<String>,
) {
    let (mut sender, mut receiver) = socket.split();

    let claims = match authenticate(token.as_deref(), &codec) {
        Ok(claims) => claims,
        Err(reason) => {
            warn!("live-connection handshake rejected: {}", reason);
            let frame = ServerFrame::Error { error: reason };
            let _ = sender
                .send(Message::Text(serde_json::to_string(&frame).unwrap().into()))
                .await;
            let _ = sender.close().await;
            return;
        }
    };

    let username = claims.sub;
    info!("{} connected", username);

    let (conn_id, mut push_rx) = registry.register(&username).await;
    // Cleared once a newer connection replaces this one: we stop polling the
    // dead push channel but keep answering PINGs until the client goes away.
    let mut push_open = true;

    loop {
        tokio::select! {
            frame = push_rx.recv(), if push_open => {
                match frame {
                    Some(frame) => {
                        let text = serde_json::to_string(&frame).unwrap();
                        if sender.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    None => push_open = false,
                }
            }
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = match serde_json::from_str::<ClientFrame>(&text) {
                            Ok(ClientFrame::Ping) => ServerFrame::Pong {
                                message: "Pong".to_string(),
                            },
                            Err(_) => ServerFrame::Pong {
                                message: "what?".to_string(),
                            },
                        };
                        let text = serde_json::to_string(&reply).unwrap();
                        if sender.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        let reply = ServerFrame::Pong {
                            message: "what?".to_string(),
                        };
                        let text = serde_json::to_string(&reply).unwrap();
                        if sender.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    // Transport-level ping/pong is handled by the ws layer.
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!("socket error for {}: {}", username, e);
                        break;
                    }
                }
            }
        }
    }

    registry.unregister(&username, conn_id).await;
    info!("{} disconnected", username);
}

fn authenticate(token: Option<&str>, codec: &TokenCodec) -> Result<Claims, String> {
    let Some(token) = token else {
        return Err("token missing, try again".to_string());
    };
    codec
        .verify(token)
        .map_err(|_| "Authentication failed, please re-authenticate".to_string())
}
