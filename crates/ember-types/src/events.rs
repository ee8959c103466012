use serde::{Deserialize, Serialize};

/// Frames sent FROM client TO server over the live connection.
///
/// Anything that does not parse as one of these gets the permissive
/// `PONG "what?"` reply rather than an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientFrame {
    #[serde(rename = "PING")]
    Ping,
}

/// Frames sent FROM server TO client over the live connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerFrame {
    /// Handshake rejection. Sent once, then the connection is closed.
    #[serde(rename = "ERROR")]
    Error { error: String },

    /// Reply to any client frame.
    #[serde(rename = "PONG")]
    Pong { message: String },

    /// A freshly stored notification pushed to its target.
    #[serde(rename = "NEW")]
    New {
        id: i64,
        author: String,
        message: String,
        read_status: bool,
    },
}

/// What a notification is about. The wire string doubles as the
/// `message` column value in the notifications table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Like,
    Match,
    Message,
    View,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Like => "LIKE",
            Self::Match => "MATCH",
            Self::Message => "MSG",
            Self::View => "VIEW",
        }
    }
}
