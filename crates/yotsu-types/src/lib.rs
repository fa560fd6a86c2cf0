pub mod api;
pub mod events;
pub mod models;
pub mod timestamp;

/// Backend identifiers are SQLite integer row ids.
pub type UserId = i64;
pub type ChannelId = i64;
pub type MessageId = i64;
