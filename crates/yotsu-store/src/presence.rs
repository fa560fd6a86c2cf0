use yotsu_types::UserId;

use crate::Store;

impl Store {
    // -- Presence --

    /// Set or clear one user's presence. Clearing an absent user is a no-op.
    pub fn update_presence(&mut self, user_id: UserId, online: bool) {
        if online {
            self.presence.insert(user_id);
        } else {
            self.presence.remove(&user_id);
        }
    }

    /// Replace the whole presence map from a server snapshot.
    pub fn replace_presence(&mut self, online_users: impl IntoIterator<Item = UserId>) {
        self.presence = online_users.into_iter().collect();
    }

    pub fn clear_presence(&mut self) {
        self.presence.clear();
    }

    pub fn is_online(&self, user_id: UserId) -> bool {
        self.presence.contains(&user_id)
    }

    pub fn online_count(&self) -> usize {
        self.presence.len()
    }

    /// Online user ids, ascending.
    pub fn online_users(&self) -> Vec<UserId> {
        let mut users: Vec<UserId> = self.presence.iter().copied().collect();
        users.sort_unstable();
        users
    }
}
