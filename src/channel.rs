//! Channel records and the lifecycle state machine.

pub mod settlement;

use crate::abiencode::types::{Address, Hash, U256};

/// Identifies a channel: keccak digest of the opening parties and fresh
/// registry entropy. Never reused.
pub type ChannelId = Hash;

/// Lifecycle of a channel.
///
/// Transitions are one-directional and total: `Opened → Joined → Closed`.
/// There is no cancelled or expired state; a channel that is never joined
/// simply stays open and keeps its escrow.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChannelStatus {
    /// The sender has deposited; waiting for the receiver to join.
    Opened,
    /// Both deposits are escrowed; off-chain updates may be exchanged.
    Joined,
    /// Settled and paid out. Terminal, the record is immutable.
    Closed,
}

/// The acting party in a two-party channel.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Role {
    Sender,
    Receiver,
}

impl Role {
    pub fn other(self) -> Role {
        match self {
            Role::Sender => Role::Receiver,
            Role::Receiver => Role::Sender,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Role::Sender => 0,
            Role::Receiver => 1,
        }
    }
}

/// A single channel as stored by the ledger.
///
/// The balances hold the parties' deposits until close, at which point they
/// are overwritten with the final co-signed split. Their sum is the total
/// escrow for this channel either way.
#[derive(Debug, Copy, Clone)]
pub struct Channel {
    id: ChannelId,
    token: Address,
    sender: Address,
    receiver: Address,
    sender_balance: U256,
    receiver_balance: U256,
    nonce: u64,
    status: ChannelStatus,
}

impl Channel {
    pub(crate) fn open(
        id: ChannelId,
        token: Address,
        sender: Address,
        receiver: Address,
        deposit: U256,
    ) -> Self {
        debug_assert!(sender != receiver);
        debug_assert!(!deposit.is_zero());

        Channel {
            id,
            token,
            sender,
            receiver,
            sender_balance: deposit,
            receiver_balance: U256::zero(),
            nonce: 0,
            status: ChannelStatus::Opened,
        }
    }

    /// Record the receiver's deposit; `Opened → Joined`.
    pub(crate) fn join(&mut self, deposit: U256) {
        debug_assert_eq!(self.status, ChannelStatus::Opened);
        debug_assert!(!deposit.is_zero());

        self.receiver_balance = deposit;
        self.status = ChannelStatus::Joined;
    }

    /// Record the final co-signed split; `Joined → Closed`.
    ///
    /// The caller has already verified both signatures and that the split
    /// sums to [total_escrow][Self::total_escrow].
    pub(crate) fn close(&mut self, sender_balance: U256, receiver_balance: U256, nonce: u64) {
        debug_assert_eq!(self.status, ChannelStatus::Joined);

        self.sender_balance = sender_balance;
        self.receiver_balance = receiver_balance;
        self.nonce = nonce;
        self.status = ChannelStatus::Closed;
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }
    pub fn token(&self) -> Address {
        self.token
    }
    pub fn sender(&self) -> Address {
        self.sender
    }
    pub fn receiver(&self) -> Address {
        self.receiver
    }
    pub fn sender_balance(&self) -> U256 {
        self.sender_balance
    }
    pub fn receiver_balance(&self) -> U256 {
        self.receiver_balance
    }
    pub fn nonce(&self) -> u64 {
        self.nonce
    }
    pub fn status(&self) -> ChannelStatus {
        self.status
    }

    /// Sum of both parties' deposits. Fixed once the receiver has joined;
    /// every accepted settlement must disburse exactly this amount.
    pub fn total_escrow(&self) -> U256 {
        // Cannot overflow: join refuses a deposit that would.
        self.sender_balance + self.receiver_balance
    }
}
