use rusqlite::Connection;
use tracing::info;

use crate::StoreError;

pub fn run(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS user (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            famerating  INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS liked (
            user_id        INTEGER NOT NULL REFERENCES user(id),
            liked_user_id  INTEGER NOT NULL REFERENCES user(id),
            created_at     TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(user_id, liked_user_id)
        );

        CREATE TABLE IF NOT EXISTS matches (
            userone     INTEGER NOT NULL REFERENCES user(id),
            usertwo     INTEGER NOT NULL REFERENCES user(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS notifications (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            author       TEXT NOT NULL,
            target       TEXT NOT NULL,
            message      TEXT NOT NULL,
            read_status  INTEGER NOT NULL DEFAULT 0,
            created_at   TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_notifications_target
            ON notifications(target, read_status);

        CREATE TABLE IF NOT EXISTS chat (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            sender    INTEGER NOT NULL REFERENCES user(id),
            receiver  INTEGER NOT NULL REFERENCES user(id),
            message   TEXT NOT NULL,
            date      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_chat_pair
            ON chat(sender, receiver, date);

        CREATE TABLE IF NOT EXISTS viewed (
            user_id         INTEGER NOT NULL REFERENCES user(id),
            viewed_user_id  INTEGER NOT NULL REFERENCES user(id),
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(user_id, viewed_user_id)
        );
        ",
    )?;

    info!("database migrations complete");
    Ok(())
}
