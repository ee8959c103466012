use std::sync::Arc;

use tracing::debug;

use ember_db::{Database, StoreError};
use ember_types::events::{NotificationKind, ServerFrame};

use crate::registry::Registry;

#[derive(Debug, thiserror::Error)]
pub enum OutboxError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("notification insert task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Durably records a notification, then best-effort pushes it to the
/// target's live connection. The insert commits independently of delivery:
/// a failed push leaves the row for the unread-history query to pick up
/// later, and never surfaces to the caller that triggered the notification.
#[derive(Clone)]
pub struct Outbox {
    db: Arc<Database>,
    registry: Registry,
}

impl Outbox {
    pub fn new(db: Arc<Database>, registry: Registry) -> Self {
        Self { db, registry }
    }

    /// Insert the notification row and return its id, then attempt live
    /// delivery. Only the insert can fail; delivery is fire-and-forget.
    pub async fn publish(
        &self,
        author: &str,
        target: &str,
        kind: NotificationKind,
    ) -> Result<i64, OutboxError> {
        let db = self.db.clone();
        let (author_owned, target_owned) = (author.to_string(), target.to_string());
        let id = tokio::task::spawn_blocking(move || {
            db.insert_notification(&author_owned, &target_owned, kind.as_str())
        })
        .await??;

        let frame = ServerFrame::New {
            id,
            author: author.to_string(),
            message: kind.as_str().to_string(),
            read_status: false,
        };
        if !self.registry.send(target, frame).await {
            debug!("notification {} for {} not delivered live, kept for history", id, target);
        }

        Ok(id)
    }
}
