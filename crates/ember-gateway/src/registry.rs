use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use ember_types::events::ServerFrame;

/// Process-wide directory mapping an authenticated username to its currently
/// open live connection. Instantiated once at startup and handed to every
/// handler that needs it; the RwLock carries the guarantee that single-step
/// cooperative scheduling would otherwise provide.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<RwLock<HashMap<String, (Uuid, mpsc::UnboundedSender<ServerFrame>)>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live connection for a user and return the connection id
    /// plus the push channel. Last-registered wins: an older entry for the
    /// same user is overwritten, but the older physical connection is not
    /// closed here — its push channel simply goes dead.
    pub async fn register(&self, username: &str) -> (Uuid, mpsc::UnboundedReceiver<ServerFrame>) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .write()
            .await
            .insert(username.to_string(), (conn_id, tx));
        (conn_id, rx)
    }

    /// Compare-and-remove: evicts the entry only while `conn_id` still owns
    /// it, so a stale close can never unregister a newer connection for the
    /// same user.
    pub async fn unregister(&self, username: &str, conn_id: Uuid) {
        let mut map = self.inner.write().await;
        if let Some((stored, _)) = map.get(username) {
            if *stored == conn_id {
                map.remove(username);
            }
        }
    }

    /// Identity of the user's live connection, if any.
    pub async fn lookup(&self, username: &str) -> Option<Uuid> {
        self.inner.read().await.get(username).map(|(id, _)| *id)
    }

    /// Best-effort push. Returns false when the user has no live connection
    /// or the connection has gone away; never an error. Frames sent to one
    /// connection arrive in `send` order.
    pub async fn send(&self, username: &str, frame: ServerFrame) -> bool {
        match self.inner.read().await.get(username) {
            Some((_, tx)) => tx.send(frame).is_ok(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pong(message: &str) -> ServerFrame {
        ServerFrame::Pong {
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn last_registered_connection_wins() {
        let registry = Registry::new();

        let (first_id, mut first_rx) = registry.register("alice").await;
        let (second_id, mut second_rx) = registry.register("alice").await;
        assert_ne!(first_id, second_id);
        assert_eq!(registry.lookup("alice").await, Some(second_id));

        assert!(registry.send("alice", pong("hello")).await);
        assert_eq!(second_rx.recv().await, Some(pong("hello")));

        // The replaced connection's channel is dead, not fed.
        assert_eq!(first_rx.recv().await, None);
    }

    #[tokio::test]
    async fn stale_unregister_does_not_evict_newer_connection() {
        let registry = Registry::new();

        let (old_id, _old_rx) = registry.register("alice").await;
        let (new_id, mut new_rx) = registry.register("alice").await;

        // The old connection closes late; the new entry must survive.
        registry.unregister("alice", old_id).await;
        assert_eq!(registry.lookup("alice").await, Some(new_id));
        assert!(registry.send("alice", pong("still here")).await);
        assert_eq!(new_rx.recv().await, Some(pong("still here")));

        registry.unregister("alice", new_id).await;
        assert_eq!(registry.lookup("alice").await, None);
    }

    #[tokio::test]
    async fn send_to_absent_user_is_not_delivered() {
        let registry = Registry::new();
        assert!(!registry.send("nobody", pong("anyone?")).await);
    }

    #[tokio::test]
    async fn send_after_receiver_dropped_is_not_delivered() {
        let registry = Registry::new();
        let (_, rx) = registry.register("alice").await;
        drop(rx);
        assert!(!registry.send("alice", pong("gone")).await);
    }
}
