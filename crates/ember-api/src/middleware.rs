use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::{AppState, error::ApiError};

/// Extract and verify the signed token from the `jwt` cookie, attaching the
/// decoded claims to the request for downstream handlers. Failures are
/// always surfaced with a reason, never treated as anonymous access.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let cookie = jar.get("jwt").ok_or(ApiError::MissingToken)?;

    let claims = state
        .codec
        .verify(cookie.value())
        .map_err(|e| ApiError::InvalidToken(e.to_string()))?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
