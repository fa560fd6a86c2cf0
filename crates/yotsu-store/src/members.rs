use yotsu_types::models::{ChannelRole, Member};
use yotsu_types::{ChannelId, UserId};

use crate::Store;

impl Store {
    // -- Members --

    pub fn replace_members(&mut self, channel_id: ChannelId, members: Vec<Member>) {
        self.members.insert(channel_id, members);
    }

    /// Evict a channel's member list. Nothing expires on its own.
    pub fn clear_members(&mut self, channel_id: ChannelId) {
        self.members.remove(&channel_id);
    }

    pub fn members(&self, channel_id: ChannelId) -> Option<&[Member]> {
        self.members.get(&channel_id).map(Vec::as_slice)
    }

    pub fn member(&self, channel_id: ChannelId, user_id: UserId) -> Option<&Member> {
        self.members
            .get(&channel_id)
            .and_then(|members| members.iter().find(|m| m.user_id == user_id))
    }

    /// Add a member to an already loaded list. Unloaded channels are left alone.
    pub fn upsert_member(&mut self, channel_id: ChannelId, member: Member) -> bool {
        let Some(members) = self.members.get_mut(&channel_id) else {
            return false;
        };
        match members.iter_mut().find(|m| m.user_id == member.user_id) {
            Some(existing) => *existing = member,
            None => members.push(member),
        }
        true
    }

    pub fn remove_member(&mut self, channel_id: ChannelId, user_id: UserId) -> bool {
        let Some(members) = self.members.get_mut(&channel_id) else {
            return false;
        };
        let before = members.len();
        members.retain(|m| m.user_id != user_id);
        members.len() != before
    }

    /// Apply an ownership transfer to a loaded list: the new owner becomes
    /// `Owner` and the previous owner drops to `Admin`.
    pub fn transfer_ownership(
        &mut self,
        channel_id: ChannelId,
        new_owner_id: UserId,
        previous_owner_id: UserId,
    ) -> bool {
        let Some(members) = self.members.get_mut(&channel_id) else {
            return false;
        };
        for member in members.iter_mut() {
            if member.user_id == new_owner_id {
                member.role = Some(ChannelRole::Owner);
            } else if member.user_id == previous_owner_id {
                member.role = Some(ChannelRole::Admin);
            }
        }
        true
    }

    pub fn set_member_role(
        &mut self,
        channel_id: ChannelId,
        user_id: UserId,
        role: ChannelRole,
    ) -> bool {
        self.members
            .get_mut(&channel_id)
            .and_then(|members| members.iter_mut().find(|m| m.user_id == user_id))
            .map(|member| member.role = Some(role))
            .is_some()
    }
}
