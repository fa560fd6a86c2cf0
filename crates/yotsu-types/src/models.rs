use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timestamp;
use crate::{ChannelId, MessageId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Public,
    Private,
    Dm,
    Notes,
}

impl ChannelType {
    /// DM and notes channels never carry a name; their label comes from members.
    pub fn is_named(self) -> bool {
        matches!(self, Self::Public | Self::Private)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub channel_id: ChannelId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: ChannelType,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelRole {
    Owner,
    Admin,
    Member,
}

/// A channel member. Roles only exist in private channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: UserId,
    pub display_name: String,
    #[serde(default)]
    pub role: Option<ChannelRole>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: MessageId,
    pub channel_id: ChannelId,
    pub user_id: UserId,
    pub content: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, alias = "updated_at", with = "timestamp::option")]
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub parent_id: Option<MessageId>,
    #[serde(default)]
    pub has_reactions: bool,
}

impl Message {
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}

/// Per-emoji reaction summary for one message.
///
/// `count` always equals `users.len()`; an aggregate never exists with a
/// count of zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionAggregate {
    pub emoji: String,
    pub count: usize,
    pub users: Vec<UserId>,
}

impl ReactionAggregate {
    pub fn first(emoji: impl Into<String>, user_id: UserId) -> Self {
        Self {
            emoji: emoji.into(),
            count: 1,
            users: vec![user_id],
        }
    }
}
