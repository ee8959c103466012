use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use ember_types::api::{ChatDto, ChatHistoryResponse, Claims, SendChatRequest};
use ember_types::events::NotificationKind;

use crate::{AppState, blocking, error::ApiError};

/// Store the message, then publish a MSG notification. The chat row commits
/// before the publish runs, and a push that finds the receiver offline never
/// fails the send.
pub async fn send(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let SendChatRequest { username, message } = req;

    let db = state.db.clone();
    let (sender, receiver) = (claims.sub.clone(), username.clone());
    blocking(move || db.insert_chat(&sender, &receiver, &message)).await?;

    state
        .outbox
        .publish(&claims.sub, &username, NotificationKind::Message)
        .await?;

    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn history(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let me = claims.sub.clone();
    let rows = blocking(move || db.chat_history(&me, &username)).await?;

    Ok(Json(ChatHistoryResponse {
        success: true,
        chats: rows
            .into_iter()
            .map(|r| ChatDto {
                id: r.id,
                sender: r.sender,
                receiver: r.receiver,
                message: r.message,
                date: r.date,
            })
            .collect(),
    }))
}
