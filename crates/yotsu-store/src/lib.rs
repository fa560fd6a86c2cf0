//! In-memory entity store for the chat client.
//!
//! The store is the single source of truth for anything a view renders. It is
//! synchronous and does no IO: sync operations mutate it only after the
//! backend confirmed a change, and live event handlers patch it directly.
//! Every write is "last writer wins" on the affected key.

pub mod channels;
pub mod members;
pub mod messages;
pub mod presence;
pub mod reactions;
pub mod session;

use std::collections::{BTreeMap, HashMap, HashSet};

use yotsu_types::models::{Channel, Member, Message, ReactionAggregate};
use yotsu_types::{ChannelId, MessageId, UserId};

pub use messages::PageOutcome;
pub use session::{Session, SessionState};

#[derive(Debug, Default)]
pub struct Store {
    session: Session,

    /// Online users; absence means offline
    presence: HashSet<UserId>,

    channels: BTreeMap<ChannelId, Channel>,

    /// channel_id -> members, in server order
    members: HashMap<ChannelId, Vec<Member>>,

    /// channel_id -> top-level messages, ascending by created_at
    messages: HashMap<ChannelId, Vec<Message>>,

    /// channel_id -> whether older pages may exist
    has_more: HashMap<ChannelId, bool>,

    /// parent message_id -> replies, ascending by created_at
    threads: HashMap<MessageId, Vec<Message>>,

    /// message_id -> aggregates in first-seen emoji order
    reactions: HashMap<MessageId, Vec<ReactionAggregate>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every slice, session included. Used on logout.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// The current user's id, if a session carries one.
    pub fn current_user(&self) -> Option<UserId> {
        self.session.user_id()
    }
}
