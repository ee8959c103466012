/// Database row types — these map directly to SQLite rows.
/// Distinct from the ember-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub famerating: i64,
    pub created_at: String,
}

pub struct NotificationRow {
    pub id: i64,
    pub author: String,
    pub target: String,
    pub message: String,
    pub read_status: bool,
    pub created_at: String,
}

pub struct ChatRow {
    pub id: i64,
    pub sender: String,
    pub receiver: String,
    pub message: String,
    pub date: String,
}
