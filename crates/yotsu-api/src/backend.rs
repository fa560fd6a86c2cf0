use async_trait::async_trait;
use reqwest::Method;

use yotsu_types::api::{
    AddMembersRequest, AddReactionRequest, CheckEmailRequest, CreateChannelRequest,
    EditMessageRequest, LoginRequest, MessageQuery, RefreshRequest, RegisterRequest,
    RegisterResponse, SendMessageRequest, TokenResponse, TotpVerifyRequest,
    TransferOwnershipRequest, UpdateChannelRequest, UpdateRoleRequest, VerifyResponse,
};
use yotsu_types::models::{Channel, Member, Message, ReactionAggregate};
use yotsu_types::{ChannelId, MessageId, UserId};

use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};

/// The backend contract the client consumes. Every method that takes a
/// `token` sends it as a bearer credential.
#[async_trait]
pub trait Backend: Send + Sync {
    // -- Auth --

    async fn login(&self, req: &LoginRequest) -> ApiResult<TokenResponse>;

    async fn register(&self, req: &RegisterRequest) -> ApiResult<RegisterResponse>;

    /// `Ok(false)` when the address is already registered.
    async fn check_email(&self, email: &str) -> ApiResult<bool>;

    /// `temp_token` is the bearer for this call.
    async fn verify_2fa(&self, temp_token: &str, req: &TotpVerifyRequest)
    -> ApiResult<TokenResponse>;

    async fn refresh(&self, req: &RefreshRequest) -> ApiResult<TokenResponse>;

    async fn verify_token(&self, token: &str) -> ApiResult<VerifyResponse>;

    // -- Channels --

    async fn list_channels(&self, token: &str) -> ApiResult<Vec<Channel>>;

    async fn get_channel(&self, token: &str, channel_id: ChannelId) -> ApiResult<Channel>;

    async fn create_channel(&self, token: &str, req: &CreateChannelRequest) -> ApiResult<Channel>;

    async fn update_channel(
        &self,
        token: &str,
        channel_id: ChannelId,
        req: &UpdateChannelRequest,
    ) -> ApiResult<Channel>;

    // -- Members --

    async fn list_members(&self, token: &str, channel_id: ChannelId) -> ApiResult<Vec<Member>>;

    async fn add_members(
        &self,
        token: &str,
        channel_id: ChannelId,
        req: &AddMembersRequest,
    ) -> ApiResult<()>;

    async fn remove_member(&self, token: &str, channel_id: ChannelId, user_id: UserId)
    -> ApiResult<()>;

    async fn update_member_role(
        &self,
        token: &str,
        channel_id: ChannelId,
        user_id: UserId,
        req: &UpdateRoleRequest,
    ) -> ApiResult<()>;

    /// Only the current owner may call this; they become an admin.
    async fn transfer_ownership(
        &self,
        token: &str,
        channel_id: ChannelId,
        req: &TransferOwnershipRequest,
    ) -> ApiResult<()>;

    // -- Messages --

    async fn list_messages(
        &self,
        token: &str,
        channel_id: ChannelId,
        query: &MessageQuery,
    ) -> ApiResult<Vec<Message>>;

    async fn send_message(&self, token: &str, req: &SendMessageRequest) -> ApiResult<Message>;

    async fn edit_message(
        &self,
        token: &str,
        message_id: MessageId,
        req: &EditMessageRequest,
    ) -> ApiResult<Message>;

    async fn delete_message(&self, token: &str, message_id: MessageId) -> ApiResult<()>;

    // -- Reactions --

    async fn list_reactions(
        &self,
        token: &str,
        message_id: MessageId,
    ) -> ApiResult<Vec<ReactionAggregate>>;

    async fn add_reaction(
        &self,
        token: &str,
        message_id: MessageId,
        req: &AddReactionRequest,
    ) -> ApiResult<()>;

    async fn remove_reaction(&self, token: &str, message_id: MessageId, emoji: &str)
    -> ApiResult<()>;
}

#[async_trait]
impl Backend for ApiClient {
    // -- Auth --

    async fn login(&self, req: &LoginRequest) -> ApiResult<TokenResponse> {
        let builder = self.request(Method::POST, &["auth", "login"], None)?.json(req);
        self.send_json(builder).await
    }

    async fn register(&self, req: &RegisterRequest) -> ApiResult<RegisterResponse> {
        let builder = self.request(Method::POST, &["auth", "register"], None)?.json(req);
        self.send_json(builder).await
    }

    async fn check_email(&self, email: &str) -> ApiResult<bool> {
        let body = CheckEmailRequest {
            email: email.to_string(),
        };
        let builder = self
            .request(Method::POST, &["auth", "check-email"], None)?
            .json(&body);
        match self.send_unit(builder).await {
            Ok(()) => Ok(true),
            Err(ApiError::Status { status: 409, .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn verify_2fa(
        &self,
        temp_token: &str,
        req: &TotpVerifyRequest,
    ) -> ApiResult<TokenResponse> {
        let builder = self
            .request(Method::POST, &["auth", "verify-2fa"], Some(temp_token))?
            .json(req);
        self.send_json(builder).await
    }

    async fn refresh(&self, req: &RefreshRequest) -> ApiResult<TokenResponse> {
        let builder = self.request(Method::POST, &["auth", "refresh"], None)?.json(req);
        self.send_json(builder).await
    }

    async fn verify_token(&self, token: &str) -> ApiResult<VerifyResponse> {
        let builder = self.request(Method::GET, &["auth", "verify"], Some(token))?;
        self.send_json(builder).await
    }

    // -- Channels --

    async fn list_channels(&self, token: &str) -> ApiResult<Vec<Channel>> {
        let builder = self.request(Method::GET, &["channels"], Some(token))?;
        self.send_json(builder).await
    }

    async fn get_channel(&self, token: &str, channel_id: ChannelId) -> ApiResult<Channel> {
        let id = channel_id.to_string();
        let builder = self.request(Method::GET, &["channels", &id], Some(token))?;
        self.send_json(builder).await
    }

    async fn create_channel(&self, token: &str, req: &CreateChannelRequest) -> ApiResult<Channel> {
        let builder = self
            .request(Method::POST, &["channels"], Some(token))?
            .json(req);
        self.send_json(builder).await
    }

    async fn update_channel(
        &self,
        token: &str,
        channel_id: ChannelId,
        req: &UpdateChannelRequest,
    ) -> ApiResult<Channel> {
        let id = channel_id.to_string();
        let builder = self
            .request(Method::PATCH, &["channels", &id], Some(token))?
            .json(req);
        self.send_json(builder).await
    }

    // -- Members --

    async fn list_members(&self, token: &str, channel_id: ChannelId) -> ApiResult<Vec<Member>> {
        let id = channel_id.to_string();
        let builder = self.request(Method::GET, &["members", &id], Some(token))?;
        self.send_json(builder).await
    }

    async fn add_members(
        &self,
        token: &str,
        channel_id: ChannelId,
        req: &AddMembersRequest,
    ) -> ApiResult<()> {
        let id = channel_id.to_string();
        let builder = self
            .request(Method::POST, &["members", &id], Some(token))?
            .json(req);
        self.send_unit(builder).await
    }

    async fn remove_member(
        &self,
        token: &str,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> ApiResult<()> {
        let (cid, uid) = (channel_id.to_string(), user_id.to_string());
        let builder = self.request(Method::DELETE, &["members", &cid, &uid], Some(token))?;
        self.send_unit(builder).await
    }

    async fn update_member_role(
        &self,
        token: &str,
        channel_id: ChannelId,
        user_id: UserId,
        req: &UpdateRoleRequest,
    ) -> ApiResult<()> {
        let (cid, uid) = (channel_id.to_string(), user_id.to_string());
        let builder = self
            .request(Method::PUT, &["members", &cid, &uid, "role"], Some(token))?
            .json(req);
        self.send_unit(builder).await
    }

    async fn transfer_ownership(
        &self,
        token: &str,
        channel_id: ChannelId,
        req: &TransferOwnershipRequest,
    ) -> ApiResult<()> {
        let id = channel_id.to_string();
        let builder = self
            .request(Method::POST, &["members", &id, "transfer"], Some(token))?
            .json(req);
        self.send_unit(builder).await
    }

    // -- Messages --

    async fn list_messages(
        &self,
        token: &str,
        channel_id: ChannelId,
        query: &MessageQuery,
    ) -> ApiResult<Vec<Message>> {
        let id = channel_id.to_string();
        let builder = self
            .request(Method::GET, &["messages", "channels", &id], Some(token))?
            .query(query);
        self.send_json(builder).await
    }

    async fn send_message(&self, token: &str, req: &SendMessageRequest) -> ApiResult<Message> {
        let builder = self
            .request(Method::POST, &["messages"], Some(token))?
            .json(req);
        self.send_json(builder).await
    }

    async fn edit_message(
        &self,
        token: &str,
        message_id: MessageId,
        req: &EditMessageRequest,
    ) -> ApiResult<Message> {
        let id = message_id.to_string();
        let builder = self
            .request(Method::PUT, &["messages", &id], Some(token))?
            .json(req);
        self.send_json(builder).await
    }

    async fn delete_message(&self, token: &str, message_id: MessageId) -> ApiResult<()> {
        let id = message_id.to_string();
        let builder = self.request(Method::DELETE, &["messages", &id], Some(token))?;
        self.send_unit(builder).await
    }

    // -- Reactions --

    async fn list_reactions(
        &self,
        token: &str,
        message_id: MessageId,
    ) -> ApiResult<Vec<ReactionAggregate>> {
        let id = message_id.to_string();
        let builder = self.request(Method::GET, &["reactions", "messages", &id], Some(token))?;
        self.send_json(builder).await
    }

    async fn add_reaction(
        &self,
        token: &str,
        message_id: MessageId,
        req: &AddReactionRequest,
    ) -> ApiResult<()> {
        let id = message_id.to_string();
        let builder = self
            .request(Method::POST, &["reactions", "messages", &id], Some(token))?
            .json(req);
        self.send_unit(builder).await
    }

    async fn remove_reaction(
        &self,
        token: &str,
        message_id: MessageId,
        emoji: &str,
    ) -> ApiResult<()> {
        let id = message_id.to_string();
        let builder = self.request(
            Method::DELETE,
            &["reactions", "messages", &id, emoji],
            Some(token),
        )?;
        self.send_unit(builder).await
    }
}
