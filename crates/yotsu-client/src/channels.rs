use tracing::{debug, info};

use yotsu_api::Backend;
use yotsu_db::TokenVault;
use yotsu_types::api::{CreateChannelRequest, UpdateChannelRequest};
use yotsu_types::models::Channel;
use yotsu_types::{ChannelId, UserId};

use crate::{ChatClient, ClientResult, sync_failure};

impl<B: Backend, V: TokenVault> ChatClient<B, V> {
    /// Fetch the full channel set and replace the local directory with it.
    pub async fn refresh_channels(&self) -> ClientResult<()> {
        let token = self.access_token()?;
        let channels = self
            .backend
            .list_channels(&token)
            .await
            .map_err(|e| sync_failure("refresh_channels", e))?;

        debug!("Loaded {} channels", channels.len());
        self.write(|store| store.replace_channels(channels));
        Ok(())
    }

    /// Same round trip as [`refresh_channels`](Self::refresh_channels),
    /// returning the directory as it now stands.
    pub async fn list_channels(&self) -> ClientResult<Vec<Channel>> {
        self.refresh_channels().await?;
        Ok(self.read(|store| store.channels().cloned().collect()))
    }

    pub async fn get_channel(&self, channel_id: ChannelId) -> ClientResult<Channel> {
        let token = self.access_token()?;
        let channel = self
            .backend
            .get_channel(&token, channel_id)
            .await
            .map_err(|e| sync_failure("get_channel", e))?;

        Ok(self.write(|store| store.upsert_channel(channel).clone()))
    }

    /// Create a channel and store the server's representation. DM and notes
    /// channels come back without a name.
    pub async fn create_channel(&self, req: &CreateChannelRequest) -> ClientResult<Channel> {
        let token = self.access_token()?;
        let channel = self
            .backend
            .create_channel(&token, req)
            .await
            .map_err(|e| sync_failure("create_channel", e))?;

        let channel_id = channel.channel_id;
        info!("Created {:?} channel {}", channel.kind, channel_id);
        Ok(self.write(|store| store.upsert_channel(channel).clone()))
    }

    /// Rename a channel. The local entry is replaced by what the server returns.
    pub async fn update_channel(&self, channel_id: ChannelId, name: &str) -> ClientResult<Channel> {
        let token = self.access_token()?;
        let req = UpdateChannelRequest {
            name: name.to_string(),
        };
        let channel = self
            .backend
            .update_channel(&token, channel_id, &req)
            .await
            .map_err(|e| sync_failure("update_channel", e))?;

        Ok(self.write(|store| store.upsert_channel(channel).clone()))
    }

    /// Someone joined `channel_id`. Refreshes the directory only when it was
    /// the current user and the channel is not known locally yet. Returns
    /// whether a refresh ran.
    pub async fn handle_join_event(
        &self,
        channel_id: ChannelId,
        joined_user_id: UserId,
    ) -> ClientResult<bool> {
        let stale = self.read(|store| {
            store.current_user() == Some(joined_user_id) && !store.has_channel(channel_id)
        });
        if !stale {
            return Ok(false);
        }
        debug!("Joined channel {} not in directory, refreshing", channel_id);
        self.refresh_channels().await?;
        Ok(true)
    }

    /// Someone left `channel_id`. Refreshes the directory only when it was the
    /// current user and the channel is still listed locally.
    pub async fn handle_leave_event(
        &self,
        channel_id: ChannelId,
        left_user_id: UserId,
    ) -> ClientResult<bool> {
        let stale = self.read(|store| {
            store.current_user() == Some(left_user_id) && store.has_channel(channel_id)
        });
        if !stale {
            return Ok(false);
        }
        debug!("Left channel {} still in directory, refreshing", channel_id);
        self.write(|store| store.clear_members(channel_id));
        self.refresh_channels().await?;
        Ok(true)
    }
}
