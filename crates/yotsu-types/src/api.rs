use serde::{Deserialize, Serialize};

use crate::models::{ChannelRole, ChannelType};
use crate::{ChannelId, MessageId, UserId};

// -- JWT Claims --

/// Claims carried by backend access tokens. The client only reads them to
/// learn its own user id; signatures are checked by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: UserId,
    #[serde(default)]
    pub exp: Option<u64>,
}

// -- Auth --

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    pub temp_token: String,
    pub totp_uri: String,
}

#[derive(Debug, Serialize)]
pub struct CheckEmailRequest {
    pub email: String,
}

/// Returned by login, 2FA verification and refresh. Which fields are present
/// depends on the flow: a 2FA login yields only `temp_token`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub temp_token: Option<String>,
    #[serde(default)]
    pub user_id: Option<UserId>,
}

#[derive(Debug, Serialize)]
pub struct TotpVerifyRequest {
    pub totp_code: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub user_id: UserId,
}

/// FastAPI error body.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub detail: serde_json::Value,
}

impl ErrorBody {
    /// Validation errors come back as a list of objects; everything else is a string.
    pub fn message(&self) -> String {
        match &self.detail {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

// -- Channels --

#[derive(Debug, Clone, Serialize)]
pub struct CreateChannelRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: ChannelType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<UserId>,
}

impl CreateChannelRequest {
    pub fn named(name: impl Into<String>, kind: ChannelType) -> Self {
        Self {
            name: Some(name.into()),
            kind,
            recipient_id: None,
        }
    }

    pub fn direct(recipient_id: UserId) -> Self {
        Self {
            name: None,
            kind: ChannelType::Dm,
            recipient_id: Some(recipient_id),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateChannelRequest {
    pub name: String,
}

// -- Members --

#[derive(Debug, Serialize)]
pub struct AddMembersRequest {
    pub user_ids: Vec<UserId>,
}

#[derive(Debug, Serialize)]
pub struct UpdateRoleRequest {
    pub role: ChannelRole,
}

/// Body of `POST /members/{channel_id}/transfer`.
#[derive(Debug, Serialize)]
pub struct TransferOwnershipRequest {
    pub user_id: UserId,
}

// -- Messages --

#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest {
    pub channel_id: ChannelId,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<MessageId>,
}

#[derive(Debug, Serialize)]
pub struct EditMessageRequest {
    pub content: String,
}

/// Query string for `GET /messages/channels/{id}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MessageQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<MessageId>,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<MessageId>,
}

// -- Reactions --

#[derive(Debug, Serialize)]
pub struct AddReactionRequest {
    pub emoji: String,
}
