use tracing::debug;

use yotsu_api::Backend;
use yotsu_db::TokenVault;
use yotsu_types::MessageId;
use yotsu_types::api::AddReactionRequest;

use crate::{ChatClient, ClientResult, sync_failure};

impl<B: Backend, V: TokenVault> ChatClient<B, V> {
    /// Load a message's reaction aggregates. Skipped (returning false) unless
    /// the stored message is flagged as having reactions.
    pub async fn fetch_reactions_for_message(&self, message_id: MessageId) -> ClientResult<bool> {
        let flagged = self.read(|store| store.message(message_id).is_some_and(|m| m.has_reactions));
        if !flagged {
            return Ok(false);
        }

        let token = self.access_token()?;
        let aggregates = self
            .backend
            .list_reactions(&token, message_id)
            .await
            .map_err(|e| sync_failure("fetch_reactions_for_message", e))?;

        debug!("Loaded {} reactions for message {}", aggregates.len(), message_id);
        self.write(|store| store.replace_reactions(message_id, aggregates));
        Ok(true)
    }

    /// React as the current user. The server also echoes this back as a live
    /// event; the second application is a no-op.
    pub async fn add_reaction(&self, message_id: MessageId, emoji: &str) -> ClientResult<()> {
        let token = self.access_token()?;
        let req = AddReactionRequest {
            emoji: emoji.to_string(),
        };
        self.backend
            .add_reaction(&token, message_id, &req)
            .await
            .map_err(|e| sync_failure("add_reaction", e))?;

        self.write(|store| {
            if let Some(user_id) = store.current_user() {
                store.add_reaction(message_id, emoji, user_id);
            }
        });
        Ok(())
    }

    pub async fn remove_reaction(&self, message_id: MessageId, emoji: &str) -> ClientResult<()> {
        let token = self.access_token()?;
        self.backend
            .remove_reaction(&token, message_id, emoji)
            .await
            .map_err(|e| sync_failure("remove_reaction", e))?;

        self.write(|store| {
            if let Some(user_id) = store.current_user() {
                store.remove_reaction(message_id, emoji, user_id);
            }
        });
        Ok(())
    }
}
