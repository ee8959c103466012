use serde::{Deserialize, Serialize};

// -- Token claims --

/// Signed-token claims shared across ember-api (REST middleware) and
/// ember-gateway (WebSocket handshake). Canonical definition lives here in
/// ember-types to eliminate duplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    /// Username of the authenticated user.
    pub sub: String,
    /// Row id of the authenticated user.
    pub id: i64,
    pub iat: i64,
    pub exp: i64,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// The token also travels in the `jwt` cookie; it is echoed in the body for
/// clients that prefer to hold it themselves.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user_id: i64,
    pub username: String,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct WhoamiResponse {
    pub user_id: i64,
    pub username: String,
}

// -- Likes --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LikeRequest {
    pub username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LikeOutcome {
    /// One-directional edge created.
    Liked,
    /// The like was reciprocal; the pair is now matched.
    Matched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnlikeOutcome {
    Unliked,
    /// The pair was matched; the match was dissolved as well.
    UnmatchedToo,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub success: bool,
    pub outcome: LikeOutcome,
}

#[derive(Debug, Serialize)]
pub struct UnlikeResponse {
    pub success: bool,
    pub outcome: UnlikeOutcome,
}

// -- Notifications --

#[derive(Debug, Serialize)]
pub struct NotificationDto {
    pub id: i64,
    pub author: String,
    pub message: String,
    pub read_status: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
    pub success: bool,
    pub notifications: Vec<NotificationDto>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkReadRequest {
    pub ids: Vec<i64>,
}

// -- Chats --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendChatRequest {
    /// Receiving user; the sender is the authenticated identity.
    pub username: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatDto {
    pub id: i64,
    pub sender: String,
    pub receiver: String,
    pub message: String,
    pub date: String,
}

#[derive(Debug, Serialize)]
pub struct ChatHistoryResponse {
    pub success: bool,
    pub chats: Vec<ChatDto>,
}

// -- Profile views --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewRequest {
    pub username: String,
}
