use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use ember_types::api::{Claims, LikeRequest, LikeResponse, UnlikeResponse};

use crate::{AppState, error::ApiError};

/// The acting user is the authenticated identity; the body names only the
/// target.
pub async fn like(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<LikeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.engine.like(&claims.sub, &req.username).await?;
    Ok(Json(LikeResponse {
        success: true,
        outcome,
    }))
}

pub async fn unlike(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.engine.unlike(&claims.sub, &username).await?;
    Ok(Json(UnlikeResponse {
        success: true,
        outcome,
    }))
}
