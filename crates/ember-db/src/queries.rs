use rusqlite::{Connection, OptionalExtension};

use crate::Database;
use crate::StoreError;
use crate::models::{ChatRow, NotificationRow, UserRow};
use ember_types::api::{LikeOutcome, UnlikeOutcome};

impl Database {
    // -- Users --

    /// Insert a new user and return their row id. A concurrent insert of the
    /// same username resolves at the UNIQUE constraint.
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<i64, StoreError> {
        self.with_conn(|conn| {
            match conn.execute(
                "INSERT INTO user (username, password) VALUES (?1, ?2)",
                (username, password_hash),
            ) {
                Ok(_) => Ok(conn.last_insert_rowid()),
                Err(e) if is_unique_violation(&e) => Err(StoreError::UsernameTaken),
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>, StoreError> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, username, password, famerating, created_at
                     FROM user WHERE username = ?1",
                    [username],
                    |row| {
                        Ok(UserRow {
                            id: row.get(0)?,
                            username: row.get(1)?,
                            password: row.get(2)?,
                            famerating: row.get(3)?,
                            created_at: row.get(4)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn famerating(&self, username: &str) -> Result<i64, StoreError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT famerating FROM user WHERE username = ?1",
                [username],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(StoreError::InvalidUser)
        })
    }

    // -- Likes & matches --

    /// Record a like inside one transaction: edge insert, famerating bump,
    /// reciprocity check, and match creation all commit together or not at
    /// all. The UNIQUE constraint on (user_id, liked_user_id) is the
    /// authoritative guard against a concurrent duplicate like.
    pub fn like_user(&self, liker: &str, liked: &str) -> Result<LikeOutcome, StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let liker_id = user_id(&tx, liker)?.ok_or(StoreError::InvalidUser)?;
            let liked_id = user_id(&tx, liked)?.ok_or(StoreError::InvalidUser)?;

            if edge_exists(&tx, liker_id, liked_id)? {
                return Err(StoreError::AlreadyLiked);
            }

            match tx.execute(
                "INSERT INTO liked (user_id, liked_user_id) VALUES (?1, ?2)",
                (liker_id, liked_id),
            ) {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => return Err(StoreError::AlreadyLiked),
                Err(e) => return Err(e.into()),
            }

            tx.execute(
                "UPDATE user SET famerating = famerating + 1 WHERE id = ?1",
                [liked_id],
            )?;

            let outcome = if edge_exists(&tx, liked_id, liker_id)? {
                // Reciprocal like. The existing-pair check tolerates a
                // duplicate trigger in either orientation.
                if !pair_matched(&tx, liker_id, liked_id)? {
                    tx.execute(
                        "INSERT INTO matches (userone, usertwo) VALUES (?1, ?2)",
                        (liker_id, liked_id),
                    )?;
                }
                LikeOutcome::Matched
            } else {
                LikeOutcome::Liked
            };

            tx.commit()?;
            Ok(outcome)
        })
    }

    /// Remove a like inside one transaction. If the pair was matched, the
    /// match is dissolved along with both like edges, so a later re-like
    /// starts the pair over from a single edge.
    pub fn unlike_user(&self, liker: &str, liked: &str) -> Result<UnlikeOutcome, StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let liker_id = user_id(&tx, liker)?.ok_or(StoreError::InvalidUser)?;
            let liked_id = user_id(&tx, liked)?.ok_or(StoreError::InvalidUser)?;

            let deleted = tx.execute(
                "DELETE FROM liked WHERE user_id = ?1 AND liked_user_id = ?2",
                (liker_id, liked_id),
            )?;
            if deleted == 0 {
                return Err(StoreError::NotLiked);
            }

            tx.execute(
                "UPDATE user SET famerating = famerating - 1 WHERE id = ?1 AND famerating > 0",
                [liked_id],
            )?;

            let outcome = if pair_matched(&tx, liker_id, liked_id)? {
                tx.execute(
                    "DELETE FROM matches
                     WHERE (userone = ?1 AND usertwo = ?2) OR (userone = ?2 AND usertwo = ?1)",
                    (liker_id, liked_id),
                )?;
                tx.execute(
                    "DELETE FROM liked WHERE user_id = ?2 AND liked_user_id = ?1",
                    (liker_id, liked_id),
                )?;
                tx.execute(
                    "UPDATE user SET famerating = famerating - 1 WHERE id = ?1 AND famerating > 0",
                    [liker_id],
                )?;
                UnlikeOutcome::UnmatchedToo
            } else {
                UnlikeOutcome::Unliked
            };

            tx.commit()?;
            Ok(outcome)
        })
    }

    // -- Notifications --

    /// Durable half of the event outbox: insert the row and return its
    /// generated id. Delivery is someone else's problem.
    pub fn insert_notification(
        &self,
        author: &str,
        target: &str,
        message: &str,
    ) -> Result<i64, StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO notifications (author, target, message) VALUES (?1, ?2, ?3)",
                (author, target, message),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Unread notifications for a target, newest first.
    pub fn unread_notifications(&self, target: &str) -> Result<Vec<NotificationRow>, StoreError> {
        self.with_conn(|conn| {
            if user_id(conn, target)?.is_none() {
                return Err(StoreError::InvalidUser);
            }

            let mut stmt = conn.prepare(
                "SELECT id, author, target, message, read_status, created_at
                 FROM notifications
                 WHERE target = ?1 AND read_status = 0
                 ORDER BY created_at DESC, id DESC",
            )?;
            let rows = stmt
                .query_map([target], |row| {
                    Ok(NotificationRow {
                        id: row.get(0)?,
                        author: row.get(1)?,
                        target: row.get(2)?,
                        message: row.get(3)?,
                        read_status: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Batch mark-read, scoped to the target so one user cannot flip another
    /// user's notifications. Flips false→true only; never reversed here.
    pub fn mark_notifications_read(&self, target: &str, ids: &[i64]) -> Result<(), StoreError> {
        if ids.is_empty() {
            return Ok(());
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{i}")).collect();
            let sql = format!(
                "UPDATE notifications SET read_status = 1
                 WHERE id IN ({}) AND target = ?{}",
                placeholders.join(", "),
                ids.len() + 1
            );

            let mut params: Vec<&dyn rusqlite::types::ToSql> =
                ids.iter().map(|id| id as &dyn rusqlite::types::ToSql).collect();
            params.push(&target);

            conn.execute(&sql, params.as_slice())?;
            Ok(())
        })
    }

    // -- Chats --

    pub fn insert_chat(
        &self,
        sender: &str,
        receiver: &str,
        message: &str,
    ) -> Result<i64, StoreError> {
        self.with_conn(|conn| {
            let sender_id = user_id(conn, sender)?.ok_or(StoreError::InvalidUser)?;
            let receiver_id = user_id(conn, receiver)?.ok_or(StoreError::InvalidUser)?;

            conn.execute(
                "INSERT INTO chat (sender, receiver, message) VALUES (?1, ?2, ?3)",
                (sender_id, receiver_id, message),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Conversation between two users, both directions, oldest first.
    pub fn chat_history(&self, a: &str, b: &str) -> Result<Vec<ChatRow>, StoreError> {
        self.with_conn(|conn| {
            let a_id = user_id(conn, a)?.ok_or(StoreError::InvalidUser)?;
            let b_id = user_id(conn, b)?.ok_or(StoreError::InvalidUser)?;

            let mut stmt = conn.prepare(
                "SELECT c.id, su.username, ru.username, c.message, c.date
                 FROM chat c
                 JOIN user su ON c.sender = su.id
                 JOIN user ru ON c.receiver = ru.id
                 WHERE (c.sender = ?1 AND c.receiver = ?2)
                    OR (c.sender = ?2 AND c.receiver = ?1)
                 ORDER BY c.date ASC, c.id ASC",
            )?;
            let rows = stmt
                .query_map((a_id, b_id), |row| {
                    Ok(ChatRow {
                        id: row.get(0)?,
                        sender: row.get(1)?,
                        receiver: row.get(2)?,
                        message: row.get(3)?,
                        date: row.get(4)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Profile views --

    /// Record that `viewer` looked at `viewed`'s profile. A repeat view
    /// refreshes the timestamp rather than adding a row.
    pub fn record_view(&self, viewer: &str, viewed: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let viewer_id = user_id(conn, viewer)?.ok_or(StoreError::InvalidUser)?;
            let viewed_id = user_id(conn, viewed)?.ok_or(StoreError::InvalidUser)?;

            conn.execute(
                "INSERT INTO viewed (user_id, viewed_user_id) VALUES (?1, ?2)
                 ON CONFLICT(user_id, viewed_user_id)
                 DO UPDATE SET created_at = datetime('now')",
                (viewer_id, viewed_id),
            )?;
            Ok(())
        })
    }
}

fn user_id(conn: &Connection, username: &str) -> Result<Option<i64>, StoreError> {
    let id = conn
        .query_row("SELECT id FROM user WHERE username = ?1", [username], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(id)
}

fn edge_exists(conn: &Connection, liker_id: i64, liked_id: i64) -> Result<bool, StoreError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM liked WHERE user_id = ?1 AND liked_user_id = ?2",
            (liker_id, liked_id),
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn pair_matched(conn: &Connection, a: i64, b: i64) -> Result<bool, StoreError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM matches
             WHERE (userone = ?1 AND usertwo = ?2) OR (userone = ?2 AND usertwo = ?1)",
            (a, b),
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
