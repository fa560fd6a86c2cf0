use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Channel, ChannelRole, ChannelType, Member, Message};
use crate::timestamp;
use crate::{ChannelId, MessageId, UserId};

/// Server frame as it arrives on the socket: `{type, data, metadata}`.
/// `metadata` is not consumed by the client.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum EventDecodeError {
    #[error("frame is not a gateway envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("unknown event kind '{0}'")]
    UnknownKind(String),

    #[error("malformed '{kind}' payload: {source}")]
    Payload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("presence payload must carry either online_users or user_id and status")]
    AmbiguousPresence,
}

/// Pushed change, decoded once at the transport boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    /// First frame after the socket is accepted
    ConnectionReady { connection_id: String },

    /// Full list of currently online users; replaces local presence
    PresenceSnapshot { online_users: Vec<UserId> },

    /// A single user came online or went offline
    PresenceChanged { user_id: UserId, online: bool },

    MemberJoined(MemberEvent),
    MemberLeft(MemberEvent),

    ChannelUpdated {
        channel_id: ChannelId,
        name: Option<String>,
        kind: ChannelType,
    },

    /// A channel was created with its initial members
    ChannelInit { channel: Channel, members: Vec<Member> },

    MessageCreated(Message),
    MessageUpdated(MessageEdit),
    MessageDeleted {
        message_id: MessageId,
        channel_id: ChannelId,
    },

    /// A thread parent with replies was deleted; it stays as a tombstone
    MessageSoftDeleted {
        message_id: MessageId,
        channel_id: ChannelId,
    },

    ReactionAdded(ReactionEvent),
    ReactionRemoved(ReactionEvent),

    RoleUpdated {
        channel_id: ChannelId,
        user_id: UserId,
        role: ChannelRole,
    },

    /// The previous owner of a private channel is now an admin
    OwnershipTransferred {
        channel_id: ChannelId,
        new_owner_id: UserId,
        previous_owner_id: UserId,
    },

    SystemError { code: i64, message: String },

    Ping,
    Pong,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MemberEvent {
    pub channel_id: ChannelId,
    pub user_id: UserId,
    pub display_name: String,
    #[serde(default)]
    pub role: Option<ChannelRole>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageEdit {
    pub message_id: MessageId,
    #[serde(default)]
    pub channel_id: Option<ChannelId>,
    pub content: String,
    #[serde(default, alias = "updated_at", with = "timestamp::option")]
    pub edited_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReactionEvent {
    pub message_id: MessageId,
    pub emoji: String,
    pub user_id: UserId,
}

#[derive(Debug, Deserialize)]
struct ConnectionData {
    connection_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PresenceStatus {
    Online,
    Offline,
}

#[derive(Debug, Deserialize)]
struct PresenceData {
    #[serde(default)]
    user_id: Option<UserId>,
    #[serde(default)]
    status: Option<PresenceStatus>,
    #[serde(default)]
    online_users: Option<Vec<UserId>>,
}

#[derive(Debug, Deserialize)]
struct ChannelUpdateData {
    channel_id: ChannelId,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type")]
    kind: ChannelType,
}

#[derive(Debug, Deserialize)]
struct ChannelInitData {
    channel_id: ChannelId,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type")]
    kind: ChannelType,
    #[serde(default)]
    members: Vec<Member>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    message_id: MessageId,
    channel_id: ChannelId,
}

#[derive(Debug, Deserialize)]
struct RoleData {
    channel_id: ChannelId,
    user_id: UserId,
    role: ChannelRole,
}

#[derive(Debug, Deserialize)]
struct OwnershipData {
    channel_id: ChannelId,
    new_owner_id: UserId,
    previous_owner_id: UserId,
}

#[derive(Debug, Deserialize)]
struct SystemErrorData {
    code: i64,
    message: String,
}

impl LiveEvent {
    /// Decode one text frame.
    pub fn decode(text: &str) -> Result<Self, EventDecodeError> {
        let envelope: Envelope = serde_json::from_str(text).map_err(EventDecodeError::Envelope)?;
        let Envelope { kind, data } = envelope;

        fn payload<T: for<'de> Deserialize<'de>>(
            kind: &str,
            data: serde_json::Value,
        ) -> Result<T, EventDecodeError> {
            serde_json::from_value(data).map_err(|source| EventDecodeError::Payload {
                kind: kind.to_string(),
                source,
            })
        }

        let event = match kind.as_str() {
            "connection_id" => {
                let d: ConnectionData = payload(&kind, data)?;
                Self::ConnectionReady {
                    connection_id: d.connection_id,
                }
            }
            "presence" => {
                let d: PresenceData = payload(&kind, data)?;
                match (d.user_id, d.status, d.online_users) {
                    (None, None, Some(online_users)) => Self::PresenceSnapshot { online_users },
                    (Some(user_id), Some(status), None) => Self::PresenceChanged {
                        user_id,
                        online: matches!(status, PresenceStatus::Online),
                    },
                    _ => return Err(EventDecodeError::AmbiguousPresence),
                }
            }
            "member.joined" => Self::MemberJoined(payload(&kind, data)?),
            "member.left" => Self::MemberLeft(payload(&kind, data)?),
            "channel.update" => {
                let d: ChannelUpdateData = payload(&kind, data)?;
                Self::ChannelUpdated {
                    channel_id: d.channel_id,
                    name: d.name,
                    kind: d.kind,
                }
            }
            "channel.init" => {
                let d: ChannelInitData = payload(&kind, data)?;
                Self::ChannelInit {
                    channel: Channel {
                        channel_id: d.channel_id,
                        name: d.name,
                        kind: d.kind,
                        created_at: None,
                    },
                    members: d.members,
                }
            }
            "message.created" => Self::MessageCreated(payload(&kind, data)?),
            "message.updated" => Self::MessageUpdated(payload(&kind, data)?),
            "message.deleted" => {
                let d: MessageRef = payload(&kind, data)?;
                Self::MessageDeleted {
                    message_id: d.message_id,
                    channel_id: d.channel_id,
                }
            }
            "message.soft_deleted" => {
                let d: MessageRef = payload(&kind, data)?;
                Self::MessageSoftDeleted {
                    message_id: d.message_id,
                    channel_id: d.channel_id,
                }
            }
            "reaction.added" => Self::ReactionAdded(payload(&kind, data)?),
            "reaction.removed" => Self::ReactionRemoved(payload(&kind, data)?),
            "role.update" => {
                let d: RoleData = payload(&kind, data)?;
                Self::RoleUpdated {
                    channel_id: d.channel_id,
                    user_id: d.user_id,
                    role: d.role,
                }
            }
            "role.ownership_transferred" => {
                let d: OwnershipData = payload(&kind, data)?;
                Self::OwnershipTransferred {
                    channel_id: d.channel_id,
                    new_owner_id: d.new_owner_id,
                    previous_owner_id: d.previous_owner_id,
                }
            }
            "system.error" => {
                let d: SystemErrorData = payload(&kind, data)?;
                Self::SystemError {
                    code: d.code,
                    message: d.message,
                }
            }
            "ping" => Self::Ping,
            "pong" => Self::Pong,
            _ => return Err(EventDecodeError::UnknownKind(kind)),
        };

        Ok(event)
    }

    /// Returns the channel_id if this event is scoped to a specific channel.
    pub fn channel_id(&self) -> Option<ChannelId> {
        match self {
            Self::MemberJoined(e) | Self::MemberLeft(e) => Some(e.channel_id),
            Self::ChannelUpdated { channel_id, .. }
            | Self::MessageDeleted { channel_id, .. }
            | Self::MessageSoftDeleted { channel_id, .. }
            | Self::RoleUpdated { channel_id, .. }
            | Self::OwnershipTransferred { channel_id, .. } => Some(*channel_id),
            Self::ChannelInit { channel, .. } => Some(channel.channel_id),
            Self::MessageCreated(m) => Some(m.channel_id),
            Self::MessageUpdated(e) => e.channel_id,
            _ => None,
        }
    }
}

/// Commands sent FROM client TO server over WebSocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum GatewayCommand {
    Ping,
    Pong,
    /// Receive channel-scoped events for this channel
    Subscribe { channel_id: ChannelId },
    Unsubscribe { channel_id: ChannelId },
}
