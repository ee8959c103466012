use axum::{Extension, Json, extract::State, response::IntoResponse};

use ember_types::api::{Claims, ViewRequest};
use ember_types::events::NotificationKind;

use crate::{AppState, blocking, error::ApiError};

/// Record a profile view (repeat views refresh the timestamp), then notify
/// the viewed user. The upsert commits before the publish runs.
pub async fn record(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ViewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let (viewer, viewed) = (claims.sub.clone(), req.username.clone());
    blocking(move || db.record_view(&viewer, &viewed)).await?;

    state
        .outbox
        .publish(&claims.sub, &req.username, NotificationKind::View)
        .await?;

    Ok(Json(serde_json::json!({ "success": true })))
}
