use tracing::debug;

use yotsu_api::Backend;
use yotsu_db::TokenVault;
use yotsu_store::PageOutcome;
use yotsu_types::api::{EditMessageRequest, MessageQuery, SendMessageRequest};
use yotsu_types::models::Message;
use yotsu_types::{ChannelId, MessageId};

use crate::{ChatClient, ClientResult, sync_failure};

impl<B: Backend, V: TokenVault> ChatClient<B, V> {
    /// Fetch one page of a channel's top-level messages.
    ///
    /// Without `before` the page replaces the timeline; with it the page is
    /// prepended as older history. Either way the timeline ends up sorted by
    /// `created_at`, and `has_more` turns false once a page comes back shorter
    /// than `limit`.
    pub async fn fetch_messages(
        &self,
        channel_id: ChannelId,
        before: Option<MessageId>,
        limit: u32,
    ) -> ClientResult<PageOutcome> {
        let token = self.access_token()?;
        let query = MessageQuery {
            before,
            limit,
            parent_id: None,
        };
        let page = self
            .backend
            .list_messages(&token, channel_id, &query)
            .await
            .map_err(|e| sync_failure("fetch_messages", e))?;

        let outcome = self.write(|store| store.apply_message_page(channel_id, page, before, limit));
        debug!(
            channel_id,
            received = outcome.received,
            has_more = outcome.has_more,
            "fetched messages"
        );
        Ok(outcome)
    }

    /// Fetch the page before the oldest loaded message, using the configured
    /// page size. `None` once history is exhausted.
    pub async fn load_older_messages(
        &self,
        channel_id: ChannelId,
    ) -> ClientResult<Option<PageOutcome>> {
        let (has_more, oldest) = self.read(|store| {
            (
                store.has_more_messages(channel_id),
                store.oldest_message_id(channel_id),
            )
        });
        if !has_more {
            return Ok(None);
        }
        self.fetch_messages(channel_id, oldest, self.page_size)
            .await
            .map(Some)
    }

    /// Load the replies to `parent_id`, replacing any loaded thread.
    pub async fn fetch_thread(
        &self,
        channel_id: ChannelId,
        parent_id: MessageId,
    ) -> ClientResult<Vec<Message>> {
        let token = self.access_token()?;
        let query = MessageQuery {
            before: None,
            limit: self.page_size,
            parent_id: Some(parent_id),
        };
        let replies = self
            .backend
            .list_messages(&token, channel_id, &query)
            .await
            .map_err(|e| sync_failure("fetch_thread", e))?;

        Ok(self.write(|store| {
            store.replace_thread(parent_id, replies);
            store.thread(parent_id).map(<[Message]>::to_vec).unwrap_or_default()
        }))
    }

    /// Send a message and store it once the server confirms it. Nothing is
    /// shown before then.
    pub async fn create_message(
        &self,
        channel_id: ChannelId,
        content: &str,
        parent_id: Option<MessageId>,
    ) -> ClientResult<Message> {
        let token = self.access_token()?;
        let req = SendMessageRequest {
            channel_id,
            content: content.to_string(),
            parent_id,
        };
        let message = self
            .backend
            .send_message(&token, &req)
            .await
            .map_err(|e| sync_failure("create_message", e))?;

        self.write(|store| store.push_message(message.clone()));
        Ok(message)
    }

    /// Edit a message. The stored copy is replaced in place by the server's.
    pub async fn update_message(
        &self,
        message_id: MessageId,
        content: &str,
    ) -> ClientResult<Message> {
        let token = self.access_token()?;
        let req = EditMessageRequest {
            content: content.to_string(),
        };
        let message = self
            .backend
            .edit_message(&token, message_id, &req)
            .await
            .map_err(|e| sync_failure("update_message", e))?;

        self.write(|store| store.replace_message(message.clone()));
        Ok(message)
    }

    /// Delete a message. `channel_hint` narrows the lookup when the caller
    /// knows the owning channel; otherwise every loaded bucket is searched.
    pub async fn delete_message(
        &self,
        message_id: MessageId,
        channel_hint: Option<ChannelId>,
    ) -> ClientResult<()> {
        let token = self.access_token()?;
        self.backend
            .delete_message(&token, message_id)
            .await
            .map_err(|e| sync_failure("delete_message", e))?;

        self.write(|store| store.remove_message(message_id, channel_hint));
        Ok(())
    }
}
