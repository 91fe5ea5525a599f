//! Two-party payment channels with custodial escrow.
//!
//! A sender opens a channel by depositing a fungible token, the receiver
//! joins with their own deposit, and both parties then exchange co-signed
//! balance updates off the ledger. Only `open`, `join` and the final `close`
//! touch the shared state: at close the registry recovers both signers from
//! a canonical digest of `(channel_id, sender_balance, receiver_balance,
//! nonce)` and pays out the agreed split from escrow.

mod abiencode {
    mod error;
    mod hashing;
    mod ser;

    pub mod types;

    pub use error::{Error, Result};
    pub use hashing::to_hash;
    pub use ser::{to_writer, Serializer, Writer};

    #[cfg(test)]
    mod tests;
}

pub mod sig;

pub mod channel;
pub mod escrow;
pub mod events;
pub mod ledger;
pub mod registry;
pub mod token;

pub use abiencode::types::{Address, Hash, Signature, U256};
pub use registry::ChannelRegistry;
