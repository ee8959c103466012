pub mod auth;
pub mod chats;
pub mod error;
pub mod likes;
pub mod matching;
pub mod middleware;
pub mod notifications;
pub mod views;

use std::sync::Arc;

use ember_db::{Database, StoreError};
use ember_gateway::{outbox::Outbox, registry::Registry};
use ember_token::TokenCodec;

use crate::error::ApiError;
use crate::matching::MatchEngine;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub codec: Arc<TokenCodec>,
    pub registry: Registry,
    pub outbox: Outbox,
    pub engine: MatchEngine,
}

/// Run a blocking store call off the async runtime.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            tracing::error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
        .map_err(ApiError::from)
}
