use std::collections::hash_map::Entry;

use yotsu_types::models::ReactionAggregate;
use yotsu_types::{MessageId, UserId};

use crate::Store;

impl Store {
    // -- Reactions --

    /// Replace the aggregates for one message with the server's list.
    pub fn replace_reactions(&mut self, message_id: MessageId, aggregates: Vec<ReactionAggregate>) {
        let aggregates: Vec<ReactionAggregate> = aggregates
            .into_iter()
            .map(|mut agg| {
                agg.count = agg.users.len();
                agg
            })
            .filter(|agg| agg.count > 0)
            .collect();
        self.set_reaction_flag(message_id, !aggregates.is_empty());
        self.reactions.insert(message_id, aggregates);
    }

    pub fn reactions(&self, message_id: MessageId) -> &[ReactionAggregate] {
        self.reactions
            .get(&message_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Count one user's reaction. A new emoji is appended after existing ones.
    ///
    /// Returns false when the user was already counted for that emoji, when
    /// the message is not loaded, or when it is flagged as having reactions
    /// whose aggregates were never fetched. In the last case a one-user list
    /// would hide the real counts, so it is left to
    /// `fetch_reactions_for_message`.
    pub fn add_reaction(&mut self, message_id: MessageId, emoji: &str, user_id: UserId) -> bool {
        let Some(flagged) = self.message(message_id).map(|m| m.has_reactions) else {
            return false;
        };
        let aggregates = match self.reactions.entry(message_id) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(_) if flagged => return false,
            Entry::Vacant(slot) => slot.insert(Vec::new()),
        };
        let added = match aggregates.iter_mut().find(|agg| agg.emoji == emoji) {
            Some(agg) if agg.users.contains(&user_id) => false,
            Some(agg) => {
                agg.users.push(user_id);
                agg.count = agg.users.len();
                true
            }
            None => {
                aggregates.push(ReactionAggregate::first(emoji, user_id));
                true
            }
        };
        self.set_reaction_flag(message_id, true);
        added
    }

    /// Uncount one user's reaction, dropping the aggregate when it empties.
    /// Returns false when there was nothing to remove.
    pub fn remove_reaction(&mut self, message_id: MessageId, emoji: &str, user_id: UserId) -> bool {
        let Some(aggregates) = self.reactions.get_mut(&message_id) else {
            return false;
        };
        let Some(pos) = aggregates.iter().position(|agg| agg.emoji == emoji) else {
            return false;
        };

        let agg = &mut aggregates[pos];
        let before = agg.users.len();
        agg.users.retain(|&u| u != user_id);
        agg.count = agg.users.len();
        let removed = agg.count != before;

        if agg.count == 0 {
            aggregates.remove(pos);
        }
        let any_left = !aggregates.is_empty();
        self.set_reaction_flag(message_id, any_left);
        removed
    }

    fn set_reaction_flag(&mut self, message_id: MessageId, has_reactions: bool) {
        if let Some(message) = self.find_message_mut(message_id, None) {
            message.has_reactions = has_reactions;
        }
    }
}
