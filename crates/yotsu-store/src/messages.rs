use chrono::Utc;
use tracing::trace;

use yotsu_types::events::MessageEdit;
use yotsu_types::models::Message;
use yotsu_types::{ChannelId, MessageId};

use crate::Store;

/// Content the backend gives a thread parent deleted while it still has replies.
pub const DELETED_PLACEHOLDER: &str = "This message was deleted";

/// Result of merging one fetched page into a channel timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOutcome {
    /// Messages in the page as received
    pub received: usize,
    /// Messages that were not already present
    pub added: usize,
    /// False once a page came back shorter than the requested limit
    pub has_more: bool,
}

impl Store {
    // -- Timeline --

    /// Merge a fetched page. Without `before` the page replaces the timeline
    /// (initial load); with `before` it is prepended as older history. The
    /// result is always re-sorted ascending by `created_at`.
    pub fn apply_message_page(
        &mut self,
        channel_id: ChannelId,
        page: Vec<Message>,
        before: Option<MessageId>,
        limit: u32,
    ) -> PageOutcome {
        let received = page.len();
        let has_more = received >= limit as usize;

        let added = match before {
            None => {
                let mut timeline = page;
                sort_chronologically(&mut timeline);
                let added = timeline.len();
                self.messages.insert(channel_id, timeline);
                added
            }
            Some(_) => {
                let timeline = self.messages.entry(channel_id).or_default();
                let mut older: Vec<Message> = page
                    .into_iter()
                    .filter(|m| !timeline.iter().any(|e| e.message_id == m.message_id))
                    .collect();
                let added = older.len();
                older.append(timeline);
                sort_chronologically(&mut older);
                *timeline = older;
                added
            }
        };

        self.has_more.insert(channel_id, has_more);
        trace!(channel_id, received, added, has_more, "applied message page");

        PageOutcome {
            received,
            added,
            has_more,
        }
    }

    /// Whether older history may still exist. Unfetched channels report true.
    pub fn has_more_messages(&self, channel_id: ChannelId) -> bool {
        self.has_more.get(&channel_id).copied().unwrap_or(true)
    }

    pub fn messages(&self, channel_id: ChannelId) -> Option<&[Message]> {
        self.messages.get(&channel_id).map(Vec::as_slice)
    }

    /// Cursor for the next older page.
    pub fn oldest_message_id(&self, channel_id: ChannelId) -> Option<MessageId> {
        self.messages
            .get(&channel_id)
            .and_then(|timeline| timeline.first())
            .map(|m| m.message_id)
    }

    // -- Threads --

    pub fn replace_thread(&mut self, parent_id: MessageId, mut replies: Vec<Message>) {
        sort_chronologically(&mut replies);
        self.threads.insert(parent_id, replies);
    }

    pub fn thread(&self, parent_id: MessageId) -> Option<&[Message]> {
        self.threads.get(&parent_id).map(Vec::as_slice)
    }

    // -- Writes --

    /// Store a server-confirmed send. A top-level message opens the channel's
    /// timeline if needed; a reply lands only in a loaded thread.
    pub fn push_message(&mut self, message: Message) -> bool {
        let bucket = match message.parent_id {
            Some(parent_id) => self.threads.get_mut(&parent_id),
            None => Some(self.messages.entry(message.channel_id).or_default()),
        };
        bucket.is_some_and(|bucket| insert_unique(bucket, message))
    }

    /// Store a pushed `message.created`. Idempotent, and a no-op when the
    /// target timeline or thread has not been loaded. The pushed payload has
    /// no display name, so it is taken from the loaded member list.
    pub fn insert_live_message(&mut self, mut message: Message) -> bool {
        if message.display_name.is_empty() {
            if let Some(author) = self.member(message.channel_id, message.user_id) {
                message.display_name = author.display_name.clone();
            }
        }
        let bucket = match message.parent_id {
            Some(parent_id) => self.threads.get_mut(&parent_id),
            None => self.messages.get_mut(&message.channel_id),
        };
        bucket.is_some_and(|bucket| insert_unique(bucket, message))
    }

    /// Replace a message in place with the server's representation.
    pub fn replace_message(&mut self, mut message: Message) -> bool {
        let hint = Some(message.channel_id);
        let Some(existing) = self.find_message_mut(message.message_id, hint) else {
            return false;
        };
        // edit responses do not carry the reaction flag
        message.has_reactions |= existing.has_reactions;
        *existing = message;
        true
    }

    pub fn apply_message_edit(&mut self, edit: &MessageEdit) -> bool {
        let Some(existing) = self.find_message_mut(edit.message_id, edit.channel_id) else {
            return false;
        };
        existing.content = edit.content.clone();
        if edit.edited_at.is_some() {
            existing.edited_at = edit.edited_at;
        }
        true
    }

    /// Remove a message from whichever timeline or thread holds it, along with
    /// its reactions and its own thread. The channel hint is tried first.
    pub fn remove_message(
        &mut self,
        message_id: MessageId,
        channel_hint: Option<ChannelId>,
    ) -> Option<Message> {
        let removed = self.take_message(message_id, channel_hint);
        if removed.is_some() {
            self.reactions.remove(&message_id);
            self.threads.remove(&message_id);
        }
        removed
    }

    /// Turn a thread parent into a tombstone; its replies stay. The backend
    /// bumps `updated_at` when it does this, so the tombstone counts as edited.
    pub fn soft_delete_message(
        &mut self,
        message_id: MessageId,
        channel_hint: Option<ChannelId>,
    ) -> bool {
        let Some(existing) = self.find_message_mut(message_id, channel_hint) else {
            return false;
        };
        existing.content = DELETED_PLACEHOLDER.to_string();
        existing.edited_at = Some(Utc::now());
        existing.has_reactions = false;
        self.reactions.remove(&message_id);
        true
    }

    pub fn message(&self, message_id: MessageId) -> Option<&Message> {
        self.messages
            .values()
            .chain(self.threads.values())
            .flat_map(|bucket| bucket.iter())
            .find(|m| m.message_id == message_id)
    }

    pub(crate) fn find_message_mut(
        &mut self,
        message_id: MessageId,
        channel_hint: Option<ChannelId>,
    ) -> Option<&mut Message> {
        if let Some(channel_id) = channel_hint {
            let pos = self
                .messages
                .get(&channel_id)
                .and_then(|timeline| timeline.iter().position(|m| m.message_id == message_id));
            if let Some(pos) = pos {
                return self.messages.get_mut(&channel_id).map(|timeline| &mut timeline[pos]);
            }
        }

        self.messages
            .values_mut()
            .chain(self.threads.values_mut())
            .flat_map(|bucket| bucket.iter_mut())
            .find(|m| m.message_id == message_id)
    }

    fn take_message(
        &mut self,
        message_id: MessageId,
        channel_hint: Option<ChannelId>,
    ) -> Option<Message> {
        if let Some(timeline) = channel_hint.and_then(|c| self.messages.get_mut(&c)) {
            if let Some(pos) = timeline.iter().position(|m| m.message_id == message_id) {
                return Some(timeline.remove(pos));
            }
        }

        for bucket in self.messages.values_mut().chain(self.threads.values_mut()) {
            if let Some(pos) = bucket.iter().position(|m| m.message_id == message_id) {
                return Some(bucket.remove(pos));
            }
        }

        None
    }
}

fn insert_unique(bucket: &mut Vec<Message>, message: Message) -> bool {
    if bucket.iter().any(|m| m.message_id == message.message_id) {
        return false;
    }
    bucket.push(message);
    true
}

/// Stable, so equal timestamps keep arrival order.
fn sort_chronologically(messages: &mut [Message]) {
    messages.sort_by_key(|m| m.created_at);
}
