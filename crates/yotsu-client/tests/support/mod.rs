//! In-process backend that keeps its own server-side state and records every
//! call, so tests can assert on round trips as well as on the store.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};

use yotsu_api::{ApiError, ApiResult, Backend};
use yotsu_client::ChatClient;
use yotsu_db::MemoryVault;
use yotsu_types::api::{
    AddMembersRequest, AddReactionRequest, Claims, CreateChannelRequest, EditMessageRequest,
    LoginRequest, MessageQuery, RefreshRequest, RegisterRequest, RegisterResponse,
    SendMessageRequest, TokenResponse, TotpVerifyRequest, TransferOwnershipRequest,
    UpdateChannelRequest, UpdateRoleRequest, VerifyResponse,
};
use yotsu_types::models::{Channel, ChannelRole, ChannelType, Member, Message, ReactionAggregate};
use yotsu_types::{ChannelId, MessageId, UserId};

pub const ANN: UserId = 5;
pub const ANN_EMAIL: &str = "ann@example.com";
pub const BOB_EMAIL: &str = "bob@example.com";
pub const PASSWORD: &str = "correct horse";
pub const TOTP_CODE: &str = "123456";
pub const TEMP_TOKEN: &str = "temp-token";

pub type TestClient = ChatClient<FakeBackend, MemoryVault>;

/// Access token whose only interesting content is the `user_id` claim.
pub fn access_token_for(user_id: UserId) -> String {
    let claims = Claims {
        user_id,
        exp: Some(4_102_444_800),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"server")).unwrap()
}

pub fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, minute, 0).unwrap()
}

pub fn message(id: MessageId, channel_id: ChannelId, minute: u32) -> Message {
    Message {
        message_id: id,
        channel_id,
        user_id: 7,
        content: format!("message {id}"),
        created_at: at(minute),
        edited_at: None,
        display_name: "Cy".into(),
        parent_id: None,
        has_reactions: false,
    }
}

pub fn channel(id: ChannelId, name: Option<&str>, kind: ChannelType) -> Channel {
    Channel {
        channel_id: id,
        name: name.map(str::to_string),
        kind,
        created_at: None,
    }
}

pub fn member(user_id: UserId, name: &str) -> Member {
    Member {
        user_id,
        display_name: name.into(),
        role: None,
    }
}

#[derive(Default)]
pub struct FakeBackend {
    calls: Mutex<Vec<&'static str>>,
    fail_next: Mutex<Option<u16>>,
    next_id: AtomicI64,

    pub channels: Mutex<Vec<Channel>>,
    pub members: Mutex<HashMap<ChannelId, Vec<Member>>>,
    pub messages: Mutex<Vec<Message>>,
    pub reactions: Mutex<HashMap<MessageId, Vec<ReactionAggregate>>>,
    pub valid_refresh_tokens: Mutex<HashSet<String>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1000),
            ..Self::default()
        }
    }

    pub fn with_channels(self, channels: Vec<Channel>) -> Self {
        *self.channels.lock().unwrap() = channels;
        self
    }

    pub fn with_messages(self, messages: Vec<Message>) -> Self {
        *self.messages.lock().unwrap() = messages;
        self
    }

    pub fn with_refresh_token(self, token: &str) -> Self {
        self.valid_refresh_tokens
            .lock()
            .unwrap()
            .insert(token.to_string());
        self
    }

    /// The next call fails with this status.
    pub fn fail_next(&self, status: u16) {
        *self.fail_next.lock().unwrap() = Some(status);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == name).count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn enter(&self, name: &'static str) -> ApiResult<()> {
        self.calls.lock().unwrap().push(name);
        match self.fail_next.lock().unwrap().take() {
            Some(status) => Err(rejected(status, "injected failure")),
            None => Ok(()),
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn issue_tokens(&self, user_id: Option<UserId>) -> TokenResponse {
        let refresh = format!("refresh-{}", self.next_id());
        self.valid_refresh_tokens
            .lock()
            .unwrap()
            .insert(refresh.clone());
        TokenResponse {
            access_token: Some(access_token_for(ANN)),
            refresh_token: Some(refresh),
            temp_token: None,
            user_id,
        }
    }
}

fn rejected(status: u16, detail: &str) -> ApiError {
    ApiError::Status {
        status,
        detail: detail.to_string(),
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn login(&self, req: &LoginRequest) -> ApiResult<TokenResponse> {
        self.enter("login")?;
        match (req.email.as_str(), req.password.as_str()) {
            (ANN_EMAIL, PASSWORD) => Ok(self.issue_tokens(Some(ANN))),
            (BOB_EMAIL, PASSWORD) => Ok(TokenResponse {
                temp_token: Some(TEMP_TOKEN.into()),
                ..TokenResponse::default()
            }),
            _ => Err(rejected(401, "Invalid email or password")),
        }
    }

    async fn register(&self, req: &RegisterRequest) -> ApiResult<RegisterResponse> {
        self.enter("register")?;
        if req.email == ANN_EMAIL {
            return Err(rejected(400, "Email already registered"));
        }
        Ok(RegisterResponse {
            temp_token: TEMP_TOKEN.into(),
            totp_uri: format!("otpauth://totp/Yotsu:{}?secret=ABC", req.email),
        })
    }

    async fn check_email(&self, email: &str) -> ApiResult<bool> {
        self.enter("check_email")?;
        Ok(email != ANN_EMAIL)
    }

    async fn verify_2fa(
        &self,
        temp_token: &str,
        req: &TotpVerifyRequest,
    ) -> ApiResult<TokenResponse> {
        self.enter("verify_2fa")?;
        if temp_token != TEMP_TOKEN || req.totp_code != TOTP_CODE {
            return Err(rejected(401, "Invalid 2FA code"));
        }
        // user id left out on purpose: it must come from the token claims
        Ok(self.issue_tokens(None))
    }

    async fn refresh(&self, req: &RefreshRequest) -> ApiResult<TokenResponse> {
        self.enter("refresh")?;
        let known = self
            .valid_refresh_tokens
            .lock()
            .unwrap()
            .remove(&req.refresh_token);
        if !known {
            return Err(rejected(401, "Invalid refresh token"));
        }
        Ok(self.issue_tokens(None))
    }

    async fn verify_token(&self, token: &str) -> ApiResult<VerifyResponse> {
        self.enter("verify_token")?;
        if token.is_empty() {
            return Err(rejected(401, "Invalid token"));
        }
        Ok(VerifyResponse {
            valid: true,
            user_id: ANN,
        })
    }

    async fn list_channels(&self, _token: &str) -> ApiResult<Vec<Channel>> {
        self.enter("list_channels")?;
        Ok(self.channels.lock().unwrap().clone())
    }

    async fn get_channel(&self, _token: &str, channel_id: ChannelId) -> ApiResult<Channel> {
        self.enter("get_channel")?;
        self.channels
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.channel_id == channel_id)
            .cloned()
            .ok_or_else(|| rejected(404, "Channel not found"))
    }

    async fn create_channel(&self, _token: &str, req: &CreateChannelRequest) -> ApiResult<Channel> {
        self.enter("create_channel")?;
        let created = Channel {
            channel_id: self.next_id(),
            name: req.name.clone(),
            kind: req.kind,
            created_at: Some(at(0)),
        };
        self.channels.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update_channel(
        &self,
        _token: &str,
        channel_id: ChannelId,
        req: &UpdateChannelRequest,
    ) -> ApiResult<Channel> {
        self.enter("update_channel")?;
        let mut channels = self.channels.lock().unwrap();
        let channel = channels
            .iter_mut()
            .find(|c| c.channel_id == channel_id)
            .ok_or_else(|| rejected(404, "Channel not found"))?;
        channel.name = Some(req.name.clone());
        Ok(channel.clone())
    }

    async fn list_members(&self, _token: &str, channel_id: ChannelId) -> ApiResult<Vec<Member>> {
        self.enter("list_members")?;
        Ok(self
            .members
            .lock()
            .unwrap()
            .get(&channel_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_members(
        &self,
        _token: &str,
        channel_id: ChannelId,
        req: &AddMembersRequest,
    ) -> ApiResult<()> {
        self.enter("add_members")?;
        let mut members = self.members.lock().unwrap();
        let list = members.entry(channel_id).or_default();
        for &user_id in &req.user_ids {
            list.push(member(user_id, &format!("user {user_id}")));
        }
        Ok(())
    }

    async fn remove_member(
        &self,
        _token: &str,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> ApiResult<()> {
        self.enter("remove_member")?;
        if let Some(list) = self.members.lock().unwrap().get_mut(&channel_id) {
            list.retain(|m| m.user_id != user_id);
        }
        if user_id == ANN {
            self.channels
                .lock()
                .unwrap()
                .retain(|c| c.channel_id != channel_id);
        }
        Ok(())
    }

    async fn update_member_role(
        &self,
        _token: &str,
        _channel_id: ChannelId,
        _user_id: UserId,
        _req: &UpdateRoleRequest,
    ) -> ApiResult<()> {
        self.enter("update_member_role")
    }

    async fn transfer_ownership(
        &self,
        _token: &str,
        channel_id: ChannelId,
        req: &TransferOwnershipRequest,
    ) -> ApiResult<()> {
        self.enter("transfer_ownership")?;
        let mut members = self.members.lock().unwrap();
        let list = members
            .get_mut(&channel_id)
            .ok_or_else(|| rejected(404, "Channel not found"))?;
        if !list.iter().any(|m| m.user_id == req.user_id) {
            return Err(rejected(400, "New owner must be a member of the channel"));
        }
        for m in list.iter_mut() {
            if m.user_id == req.user_id {
                m.role = Some(ChannelRole::Owner);
            } else if m.role == Some(ChannelRole::Owner) {
                m.role = Some(ChannelRole::Admin);
            }
        }
        Ok(())
    }

    /// Newest `limit` messages older than `before`, returned newest first.
    async fn list_messages(
        &self,
        _token: &str,
        channel_id: ChannelId,
        query: &MessageQuery,
    ) -> ApiResult<Vec<Message>> {
        self.enter("list_messages")?;
        let mut matching: Vec<Message> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.channel_id == channel_id && m.parent_id == query.parent_id)
            .filter(|m| query.before.is_none_or(|before| m.message_id < before))
            .cloned()
            .collect();
        matching.sort_by_key(|m| m.message_id);
        let skip = matching.len().saturating_sub(query.limit as usize);
        Ok(matching.split_off(skip).into_iter().rev().collect())
    }

    async fn send_message(&self, _token: &str, req: &SendMessageRequest) -> ApiResult<Message> {
        self.enter("send_message")?;
        let sent = Message {
            message_id: self.next_id(),
            channel_id: req.channel_id,
            user_id: ANN,
            content: req.content.clone(),
            created_at: at(59),
            edited_at: None,
            display_name: "Ann".into(),
            parent_id: req.parent_id,
            has_reactions: false,
        };
        self.messages.lock().unwrap().push(sent.clone());
        Ok(sent)
    }

    async fn edit_message(
        &self,
        _token: &str,
        message_id: MessageId,
        req: &EditMessageRequest,
    ) -> ApiResult<Message> {
        self.enter("edit_message")?;
        let mut messages = self.messages.lock().unwrap();
        let message = messages
            .iter_mut()
            .find(|m| m.message_id == message_id)
            .ok_or_else(|| rejected(404, "Message not found"))?;
        message.content = req.content.clone();
        message.edited_at = Some(at(58));
        let mut edited = message.clone();
        // the edit response does not carry the reaction flag
        edited.has_reactions = false;
        Ok(edited)
    }

    async fn delete_message(&self, _token: &str, message_id: MessageId) -> ApiResult<()> {
        self.enter("delete_message")?;
        self.messages
            .lock()
            .unwrap()
            .retain(|m| m.message_id != message_id);
        Ok(())
    }

    async fn list_reactions(
        &self,
        _token: &str,
        message_id: MessageId,
    ) -> ApiResult<Vec<ReactionAggregate>> {
        self.enter("list_reactions")?;
        Ok(self
            .reactions
            .lock()
            .unwrap()
            .get(&message_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_reaction(
        &self,
        _token: &str,
        _message_id: MessageId,
        _req: &AddReactionRequest,
    ) -> ApiResult<()> {
        self.enter("add_reaction")
    }

    async fn remove_reaction(
        &self,
        _token: &str,
        _message_id: MessageId,
        _emoji: &str,
    ) -> ApiResult<()> {
        self.enter("remove_reaction")
    }
}

pub fn client(backend: FakeBackend) -> TestClient {
    ChatClient::new(backend, MemoryVault::default())
}

/// A client already logged in as [`ANN`], with the login call forgotten.
pub async fn logged_in(backend: FakeBackend) -> TestClient {
    let client = client(backend);
    client.login(ANN_EMAIL, PASSWORD).await.unwrap();
    client.backend().clear_calls();
    client
}
