//! Owned store of all channel records.

use std::collections::HashMap;

use crate::channel::{Channel, ChannelId};

/// Keyed store of channels, insertion order retained for listing.
///
/// All access goes through the registry, which holds the ledger exclusively;
/// one `&mut` borrow per operation is what makes each channel's
/// read-modify-write atomic.
#[derive(Debug, Default)]
pub struct ChannelLedger {
    channels: HashMap<ChannelId, Channel>,
    order: Vec<ChannelId>,
}

impl ChannelLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, channel: Channel) {
        debug_assert!(!self.channels.contains_key(&channel.id()));

        self.order.push(channel.id());
        self.channels.insert(channel.id(), channel);
    }

    pub fn get(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: ChannelId) -> Option<&mut Channel> {
        self.channels.get_mut(&id)
    }

    /// All channel ids ever created, oldest first.
    pub fn ids(&self) -> &[ChannelId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
