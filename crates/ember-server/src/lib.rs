use std::path::Path;
use std::sync::Arc;

use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use axum_extra::extract::CookieJar;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use ember_api::{AppState, AppStateInner, auth, chats, likes, matching::MatchEngine, notifications, views};
use ember_api::middleware::require_auth;
use ember_db::Database;
use ember_gateway::{connection, outbox::Outbox, registry::Registry};
use ember_token::TokenCodec;

/// Wire up the shared components: one database handle, one connection
/// registry, and the outbox/engine built on top of them.
pub fn build_state(db_path: &Path, token_secret: &str) -> anyhow::Result<AppState> {
    let db = Arc::new(Database::open(db_path)?);
    let codec = Arc::new(TokenCodec::new(token_secret));
    let registry = Registry::new();
    let outbox = Outbox::new(db.clone(), registry.clone());
    let engine = MatchEngine::new(db.clone(), outbox.clone());

    Ok(Arc::new(AppStateInner {
        db,
        codec,
        registry,
        outbox,
        engine,
    }))
}

pub fn app(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", get(auth::logout))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/whoami", get(auth::whoami))
        .route("/likes", post(likes::like))
        .route("/likes/{username}", delete(likes::unlike))
        .route("/notifications", get(notifications::history))
        .route("/notifications/read", put(notifications::mark_read))
        .route("/chats", post(chats::send))
        .route("/chats/{username}", get(chats::history))
        .route("/views", post(views::record))
        .layer(axum::middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state.clone());

    let ws_route = Router::new().route("/ws", get(ws_upgrade)).with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(ws_route)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn ws_upgrade(
    State(state): State<AppState>,
    jar: CookieJar,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    // The live connection authenticates through the same jwt cookie as HTTP;
    // verification happens inside the socket task so a bad token gets an
    // ERROR frame rather than a failed upgrade.
    let token = jar.get("jwt").map(|c| c.value().to_string());
    ws.on_upgrade(move |socket| {
        connection::handle_socket(socket, state.registry.clone(), state.codec.clone(), token)
    })
}
