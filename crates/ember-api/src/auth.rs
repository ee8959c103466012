use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::error;

use ember_types::api::{AuthResponse, Claims, LoginRequest, RegisterRequest, WhoamiResponse};

use crate::{AppState, blocking, error::ApiError};

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.len() < 3 || req.username.len() > 32 {
        return Err(ApiError::InvalidInput("username must be 3-32 characters"));
    }
    if req.password.len() < 8 {
        return Err(ApiError::InvalidInput("password must be at least 8 characters"));
    }

    // Friendly pre-check; the UNIQUE constraint still guards the race.
    let db = state.db.clone();
    let username = req.username.clone();
    if blocking(move || db.get_user_by_username(&username)).await?.is_some() {
        return Err(ApiError::UsernameTaken);
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("password hashing failed: {}", e);
            ApiError::Internal
        })?
        .to_string();

    let db = state.db.clone();
    let username = req.username.clone();
    let user_id = blocking(move || db.create_user(&username, &password_hash)).await?;

    let token = state.codec.issue(&req.username, user_id);
    let jar = jar.add(session_cookie(token.clone()));

    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            user_id,
            username: req.username,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let username = req.username.clone();
    let user = blocking(move || db.get_user_by_username(&username))
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let parsed_hash = PasswordHash::new(&user.password).map_err(|e| {
        error!("stored password hash unparseable: {}", e);
        ApiError::Internal
    })?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::InvalidCredentials)?;

    let token = state.codec.issue(&user.username, user.id);
    let jar = jar.add(session_cookie(token.clone()));

    Ok((
        jar,
        Json(AuthResponse {
            user_id: user.id,
            username: user.username,
            token,
        }),
    ))
}

/// Logout only clears the client-held cookie; there is no server-side
/// revocation list, so the token itself stays valid until it expires.
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build(("jwt", "")).path("/").build());
    (jar, Json(serde_json::json!({ "success": true })))
}

pub async fn whoami(Extension(claims): Extension<Claims>) -> Json<WhoamiResponse> {
    Json(WhoamiResponse {
        user_id: claims.id,
        username: claims.sub,
    })
}

fn session_cookie(token: String) -> Cookie<'static> {
    // Session cookie on purpose: the token's own exp governs its lifetime.
    Cookie::build(("jwt", token)).path("/").http_only(true).build()
}
