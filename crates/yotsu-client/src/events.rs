use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use yotsu_api::Backend;
use yotsu_db::TokenVault;
use yotsu_types::events::{LiveEvent, MemberEvent, MessageEdit, ReactionEvent};
use yotsu_types::models::{Member, Message};
use yotsu_types::{ChannelId, MessageId, UserId};

use crate::{ChatClient, ClientResult};

impl<B: Backend, V: TokenVault> ChatClient<B, V> {
    /// Apply live events until the gateway stream ends, then clear presence.
    pub async fn run_event_loop(&self, mut events: mpsc::UnboundedReceiver<LiveEvent>) {
        while let Some(event) = events.recv().await {
            if let Err(e) = self.handle_event(event).await {
                warn!("Live event handling failed: {}", e);
            }
        }
        info!("Live event stream ended, clearing presence");
        self.write(|store| store.clear_presence());
    }

    /// Patch the store with one pushed change. Events about channels, messages
    /// or members that are not loaded are ignored.
    pub async fn handle_event(&self, event: LiveEvent) -> ClientResult<()> {
        match event {
            LiveEvent::ConnectionReady { connection_id } => {
                debug!("Gateway connection {} ready", connection_id);
            }
            LiveEvent::PresenceSnapshot { online_users } => {
                debug!("Presence snapshot: {} online", online_users.len());
                self.write(|store| store.replace_presence(online_users));
            }
            LiveEvent::PresenceChanged { user_id, online } => {
                self.update_presence(user_id, online);
            }
            LiveEvent::MemberJoined(joined) => {
                let (channel_id, user_id) = (joined.channel_id, joined.user_id);
                self.write(|store| store.upsert_member(channel_id, member_from(joined)));
                self.handle_join_event(channel_id, user_id).await?;
            }
            LiveEvent::MemberLeft(left) => {
                let (channel_id, user_id) = (left.channel_id, left.user_id);
                self.write(|store| store.remove_member(channel_id, user_id));
                self.handle_leave_event(channel_id, user_id).await?;
            }
            LiveEvent::ChannelUpdated {
                channel_id,
                name,
                kind,
            } => {
                self.write(|store| store.apply_channel_update(channel_id, name, kind));
            }
            LiveEvent::ChannelInit { channel, members } => {
                let channel_id = channel.channel_id;
                debug!("Channel {} created with {} members", channel_id, members.len());
                self.write(|store| {
                    store.upsert_channel(channel);
                    store.replace_members(channel_id, members);
                });
            }
            LiveEvent::MessageCreated(message) => {
                self.handle_message_created(message);
            }
            LiveEvent::MessageUpdated(edit) => {
                self.handle_message_updated(&edit);
            }
            LiveEvent::MessageDeleted {
                message_id,
                channel_id,
            } => {
                self.handle_message_deleted(message_id, Some(channel_id));
            }
            LiveEvent::MessageSoftDeleted {
                message_id,
                channel_id,
            } => {
                self.write(|store| store.soft_delete_message(message_id, Some(channel_id)));
            }
            LiveEvent::ReactionAdded(reaction) => {
                self.handle_reaction_added(&reaction);
            }
            LiveEvent::ReactionRemoved(reaction) => {
                self.handle_reaction_removed(&reaction);
            }
            LiveEvent::RoleUpdated {
                channel_id,
                user_id,
                role,
            } => {
                self.write(|store| store.set_member_role(channel_id, user_id, role));
            }
            LiveEvent::OwnershipTransferred {
                channel_id,
                new_owner_id,
                previous_owner_id,
            } => {
                self.write(|store| {
                    store.transfer_ownership(channel_id, new_owner_id, previous_owner_id)
                });
            }
            LiveEvent::SystemError { code, message } => {
                error!("Gateway error {}: {}", code, message);
            }
            LiveEvent::Ping | LiveEvent::Pong => {}
        }
        Ok(())
    }

    /// Mark a user online or offline. Going offline when not present is a no-op.
    pub fn update_presence(&self, user_id: UserId, online: bool) {
        self.write(|store| store.update_presence(user_id, online));
    }

    /// Returns false when the message was already present or its timeline
    /// is not loaded.
    pub fn handle_message_created(&self, message: Message) -> bool {
        self.write(|store| store.insert_live_message(message))
    }

    pub fn handle_message_updated(&self, edit: &MessageEdit) -> bool {
        self.write(|store| store.apply_message_edit(edit))
    }

    pub fn handle_message_deleted(
        &self,
        message_id: MessageId,
        channel_hint: Option<ChannelId>,
    ) -> bool {
        self.write(|store| store.remove_message(message_id, channel_hint).is_some())
    }

    pub fn handle_reaction_added(&self, reaction: &ReactionEvent) -> bool {
        self.write(|store| {
            store.add_reaction(reaction.message_id, &reaction.emoji, reaction.user_id)
        })
    }

    pub fn handle_reaction_removed(&self, reaction: &ReactionEvent) -> bool {
        self.write(|store| {
            store.remove_reaction(reaction.message_id, &reaction.emoji, reaction.user_id)
        })
    }
}

fn member_from(event: MemberEvent) -> Member {
    Member {
        user_id: event.user_id,
        display_name: event.display_name,
        role: event.role,
    }
}
