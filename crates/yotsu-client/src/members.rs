use tracing::{debug, info};

use yotsu_api::Backend;
use yotsu_db::TokenVault;
use yotsu_types::api::{AddMembersRequest, TransferOwnershipRequest, UpdateRoleRequest};
use yotsu_types::models::{ChannelRole, Member};
use yotsu_types::{ChannelId, UserId};

use crate::{ChatClient, ClientError, ClientResult, sync_failure};

impl<B: Backend, V: TokenVault> ChatClient<B, V> {
    /// Replace the channel's member list with the server's.
    pub async fn fetch_channel_members(&self, channel_id: ChannelId) -> ClientResult<Vec<Member>> {
        let token = self.access_token()?;
        let members = self
            .backend
            .list_members(&token, channel_id)
            .await
            .map_err(|e| sync_failure("fetch_channel_members", e))?;

        debug!("Loaded {} members of channel {}", members.len(), channel_id);
        self.write(|store| store.replace_members(channel_id, members.clone()));
        Ok(members)
    }

    /// Evict a channel's member list, e.g. when its detail view closes.
    pub fn clear_channel_members(&self, channel_id: ChannelId) {
        self.write(|store| store.clear_members(channel_id));
    }

    /// Add users to a channel, then reload its members so display names and
    /// roles come from the server.
    pub async fn add_members(
        &self,
        channel_id: ChannelId,
        user_ids: Vec<UserId>,
    ) -> ClientResult<Vec<Member>> {
        let token = self.access_token()?;
        let req = AddMembersRequest { user_ids };
        self.backend
            .add_members(&token, channel_id, &req)
            .await
            .map_err(|e| sync_failure("add_members", e))?;

        self.fetch_channel_members(channel_id).await
    }

    /// Remove a member. Removing yourself is leaving: the member list is
    /// evicted and the channel directory reloaded.
    pub async fn remove_member(&self, channel_id: ChannelId, user_id: UserId) -> ClientResult<()> {
        let token = self.access_token()?;
        self.backend
            .remove_member(&token, channel_id, user_id)
            .await
            .map_err(|e| sync_failure("remove_member", e))?;

        let leaving = self.read(|store| store.current_user() == Some(user_id));
        if leaving {
            info!("Left channel {}", channel_id);
            self.write(|store| store.clear_members(channel_id));
            self.refresh_channels().await?;
        } else {
            self.write(|store| store.remove_member(channel_id, user_id));
        }
        Ok(())
    }

    pub async fn update_member_role(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
        role: ChannelRole,
    ) -> ClientResult<()> {
        let token = self.access_token()?;
        let req = UpdateRoleRequest { role };
        self.backend
            .update_member_role(&token, channel_id, user_id, &req)
            .await
            .map_err(|e| sync_failure("update_member_role", e))?;

        self.write(|store| store.set_member_role(channel_id, user_id, role));
        Ok(())
    }

    /// Hand ownership of a private channel to another member. The current
    /// user stays on as an admin.
    pub async fn transfer_ownership(
        &self,
        channel_id: ChannelId,
        new_owner_id: UserId,
    ) -> ClientResult<()> {
        let token = self.access_token()?;
        let previous_owner_id = self
            .read(|store| store.current_user())
            .ok_or(ClientError::NotAuthenticated)?;
        let req = TransferOwnershipRequest {
            user_id: new_owner_id,
        };
        self.backend
            .transfer_ownership(&token, channel_id, &req)
            .await
            .map_err(|e| sync_failure("transfer_ownership", e))?;

        info!("Transferred channel {} to user {}", channel_id, new_owner_id);
        self.write(|store| store.transfer_ownership(channel_id, new_owner_id, previous_owner_id));
        Ok(())
    }
}
