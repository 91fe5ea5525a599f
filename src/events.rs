//! Success notifications for external observers.

use crate::{
    abiencode::types::{Address, U256},
    channel::ChannelId,
};

/// Emitted by the registry after a state transition has committed. Failed
/// operations emit nothing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Opened {
        id: ChannelId,
        sender: Address,
        amount: U256,
    },
    Joined {
        id: ChannelId,
        receiver: Address,
        amount: U256,
    },
    Closed {
        id: ChannelId,
        sender_balance: U256,
        receiver_balance: U256,
    },
}

/// Where the registry publishes its notifications.
pub trait EventSink {
    fn publish(&self, event: ChannelEvent);
}

impl<S: EventSink + ?Sized> EventSink for &S {
    fn publish(&self, event: ChannelEvent) {
        (**self).publish(event)
    }
}

/// Sink for callers without observability needs.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _: ChannelEvent) {}
}
