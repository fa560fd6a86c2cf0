use std::collections::btree_map::Entry;

use yotsu_types::ChannelId;
use yotsu_types::models::{Channel, ChannelType};

use crate::Store;

impl Store {
    // -- Channels --

    /// Replace the directory wholesale with the server's list.
    pub fn replace_channels(&mut self, channels: Vec<Channel>) {
        self.channels = channels
            .into_iter()
            .map(normalize)
            .map(|c| (c.channel_id, c))
            .collect();
    }

    /// Insert or replace one channel keyed by its id, returning the stored entry.
    pub fn upsert_channel(&mut self, channel: Channel) -> &Channel {
        let channel = normalize(channel);
        match self.channels.entry(channel.channel_id) {
            Entry::Occupied(mut slot) => {
                slot.insert(channel);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(channel),
        }
    }

    /// Apply a pushed `channel.update`. Unknown channels are ignored.
    pub fn apply_channel_update(
        &mut self,
        channel_id: ChannelId,
        name: Option<String>,
        kind: ChannelType,
    ) -> bool {
        let Some(channel) = self.channels.get_mut(&channel_id) else {
            return false;
        };
        channel.kind = kind;
        channel.name = if kind.is_named() { name } else { None };
        true
    }

    pub fn channel(&self, channel_id: ChannelId) -> Option<&Channel> {
        self.channels.get(&channel_id)
    }

    pub fn has_channel(&self, channel_id: ChannelId) -> bool {
        self.channels.contains_key(&channel_id)
    }

    /// Channels ordered by id.
    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

/// DM and notes channels are nameless by contract.
fn normalize(mut channel: Channel) -> Channel {
    if !channel.kind.is_named() {
        channel.name = None;
    }
    channel
}
