use std::sync::Arc;

use ember_db::Database;
use ember_gateway::outbox::Outbox;
use ember_types::api::{LikeOutcome, UnlikeOutcome};
use ember_types::events::NotificationKind;

use crate::{blocking, error::ApiError};

/// Transactional rule evaluated on every like and unlike: keeps the like and
/// match tables consistent and emits notifications strictly after the store
/// transaction has committed, so a rollback can never leave a phantom push.
#[derive(Clone)]
pub struct MatchEngine {
    db: Arc<Database>,
    outbox: Outbox,
}

impl MatchEngine {
    pub fn new(db: Arc<Database>, outbox: Outbox) -> Self {
        Self { db, outbox }
    }

    pub async fn like(&self, liker: &str, liked: &str) -> Result<LikeOutcome, ApiError> {
        if liker == liked {
            return Err(ApiError::InvalidUser);
        }

        let db = self.db.clone();
        let (a, b) = (liker.to_string(), liked.to_string());
        let outcome = blocking(move || db.like_user(&a, &b)).await?;

        match outcome {
            LikeOutcome::Liked => {
                self.outbox
                    .publish(liker, liked, NotificationKind::Like)
                    .await?;
            }
            LikeOutcome::Matched => {
                // Two independent publishes, one per side; not a fan-out.
                self.outbox
                    .publish(liker, liked, NotificationKind::Match)
                    .await?;
                self.outbox
                    .publish(liked, liker, NotificationKind::Match)
                    .await?;
            }
        }

        Ok(outcome)
    }

    /// No notification is emitted on unlike or unmatch.
    pub async fn unlike(&self, liker: &str, liked: &str) -> Result<UnlikeOutcome, ApiError> {
        if liker == liked {
            return Err(ApiError::InvalidUser);
        }

        let db = self.db.clone();
        let (a, b) = (liker.to_string(), liked.to_string());
        blocking(move || db.unlike_user(&a, &b)).await
    }
}
