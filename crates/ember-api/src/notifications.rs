use axum::{Extension, Json, extract::State, response::IntoResponse};

use ember_types::api::{Claims, MarkReadRequest, NotificationDto, NotificationsResponse};

use crate::{AppState, blocking, error::ApiError};

/// Unread notifications for the authenticated user, newest first. This is
/// the recovery path for pushes that found no live connection.
pub async fn history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let target = claims.sub.clone();
    let rows = blocking(move || db.unread_notifications(&target)).await?;

    Ok(Json(NotificationsResponse {
        success: true,
        notifications: rows
            .into_iter()
            .map(|r| NotificationDto {
                id: r.id,
                author: r.author,
                message: r.message,
                read_status: r.read_status,
                created_at: r.created_at,
            })
            .collect(),
    }))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<MarkReadRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let target = claims.sub.clone();
    blocking(move || db.mark_notifications_read(&target, &req.ids)).await?;

    Ok(Json(serde_json::json!({ "success": true })))
}
