use thiserror::Error;

/// Store-level failure taxonomy. The API layer maps these onto HTTP
/// status codes and `{code, message}` bodies.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("one or both users do not exist")]
    InvalidUser,
    #[error("you have already liked this user")]
    AlreadyLiked,
    #[error("you have not liked this user")]
    NotLiked,
    #[error("username is already taken")]
    UsernameTaken,
    #[error("database lock poisoned")]
    Poisoned,
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}
