pub mod connection;
pub mod outbox;
pub mod registry;
