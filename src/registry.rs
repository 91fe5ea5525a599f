//! The protocol engine: orchestrates `open`, `join` and `close` against the
//! channel ledger, the escrow accountant and the signature verifier.
//!
//! Every operation checks all of its preconditions before moving funds or
//! mutating a record, so a failed call leaves no trace. The registry holds
//! the ledger exclusively, which serializes all operations on a channel.

use rand::{CryptoRng, Rng};
use serde::Serialize;

use crate::{
    abiencode::{
        self,
        types::{Address, Hash, Signature, U256},
    },
    channel::{
        settlement::{CoSignedSettlement, SettlementState},
        Channel, ChannelId, ChannelStatus,
    },
    escrow::EscrowAccountant,
    events::{ChannelEvent, EventSink},
    ledger::ChannelLedger,
    sig,
    token::{self, TokenLedger},
};

#[derive(Debug, PartialEq, Eq)]
pub enum OpenError {
    /// Deposits must be non-zero.
    InvalidAmount,
    /// Sender and receiver cannot be the same account.
    SameParty,
    Token(token::Error),
}
impl From<token::Error> for OpenError {
    fn from(e: token::Error) -> Self {
        Self::Token(e)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum JoinError {
    NotFound,
    /// The caller is not the receiver the sender designated at open.
    WrongReceiver { expected: Address, actual: Address },
    InvalidAmount,
    WrongState {
        expected: ChannelStatus,
        actual: ChannelStatus,
    },
    /// The joint deposit would not fit in a balance. Real token supplies
    /// never get here.
    DepositOverflow,
    Token(token::Error),
}
impl From<token::Error> for JoinError {
    fn from(e: token::Error) -> Self {
        Self::Token(e)
    }
}

#[derive(Debug)]
pub enum CloseError {
    NotFound,
    WrongState {
        expected: ChannelStatus,
        actual: ChannelStatus,
    },
    AbiEncode(abiencode::Error),
    /// The signature could not be decoded or recovered at all.
    RecoveryFailed(sig::Error),
    /// The sender's signature recovers to someone other than the sender.
    InvalidSenderSignature(Address),
    /// The receiver's signature recovers to someone other than the receiver.
    InvalidReceiverSignature(Address),
    /// The submitted split does not disburse exactly the escrowed total.
    BalanceMismatch {
        escrowed: U256,
        sender_balance: U256,
        receiver_balance: U256,
    },
    Token(token::Error),
}
impl From<abiencode::Error> for CloseError {
    fn from(e: abiencode::Error) -> Self {
        Self::AbiEncode(e)
    }
}
impl From<sig::Error> for CloseError {
    fn from(e: sig::Error) -> Self {
        Self::RecoveryFailed(e)
    }
}
impl From<token::Error> for CloseError {
    fn from(e: token::Error) -> Self {
        Self::Token(e)
    }
}

/// Ingredients of a fresh channel id. The counter makes every id unique for
/// the lifetime of the registry, the salt makes ids from distinct registries
/// independent.
#[derive(Serialize)]
struct ChannelSeed {
    sender: Address,
    receiver: Address,
    counter: u64,
    salt: Hash,
}

/// Owns the channel ledger and escrow and exposes the operation surface:
/// [open_channel][Self::open_channel], [join_channel][Self::join_channel],
/// [close_channel][Self::close_channel], plus the listing and record
/// accessors clients use to locate channels.
#[derive(Debug)]
pub struct ChannelRegistry<T: TokenLedger, E: EventSink> {
    ledger: ChannelLedger,
    escrow: EscrowAccountant<T>,
    sink: E,
    salt: Hash,
    counter: u64,
}

impl<T: TokenLedger, E: EventSink> ChannelRegistry<T, E> {
    pub fn new<R: Rng + CryptoRng>(
        tokens: T,
        custodian: Address,
        sink: E,
        rng: &mut R,
    ) -> Self {
        ChannelRegistry {
            ledger: ChannelLedger::new(),
            escrow: EscrowAccountant::new(tokens, custodian),
            sink,
            salt: rng.gen(),
            counter: 0,
        }
    }

    /// The escrow account. Depositors must approve this address for at least
    /// their deposit before calling open or join.
    pub fn custodian(&self) -> Address {
        self.escrow.custodian()
    }

    pub fn token_ledger(&self) -> &T {
        self.escrow.ledger()
    }

    pub fn token_ledger_mut(&mut self) -> &mut T {
        self.escrow.ledger_mut()
    }

    /// Record read accessor.
    pub fn channel(&self, id: ChannelId) -> Option<&Channel> {
        self.ledger.get(id)
    }

    /// All channel ids ever created, oldest first.
    pub fn channel_ids(&self) -> &[ChannelId] {
        self.ledger.ids()
    }

    /// Total custodial balance for `token`, across all channels using it.
    pub fn escrow_held(&self, token: Address) -> U256 {
        self.escrow.held(token)
    }

    fn next_channel_id(&mut self, sender: Address, receiver: Address) -> ChannelId {
        let seed = ChannelSeed {
            sender,
            receiver,
            counter: self.counter,
            salt: self.salt,
        };
        self.counter += 1;
        abiencode::to_hash(&seed).expect("static seed encoding cannot fail")
    }

    /// Open a channel: pull `amount` of `token` from `caller` into escrow
    /// and create an `Opened` record with `caller` as sender.
    pub fn open_channel(
        &mut self,
        token: Address,
        receiver: Address,
        amount: U256,
        caller: Address,
    ) -> Result<ChannelId, OpenError> {
        if amount.is_zero() {
            return Err(OpenError::InvalidAmount);
        }
        if receiver == caller {
            return Err(OpenError::SameParty);
        }

        let id = self.next_channel_id(caller, receiver);
        self.escrow.collect(token, caller, amount)?;
        self.ledger
            .insert(Channel::open(id, token, caller, receiver, amount));

        self.sink.publish(ChannelEvent::Opened {
            id,
            sender: caller,
            amount,
        });
        Ok(id)
    }

    /// Join a channel as its designated receiver: pull `amount` of the
    /// channel's token from `caller` into escrow, `Opened → Joined`.
    pub fn join_channel(
        &mut self,
        id: ChannelId,
        amount: U256,
        caller: Address,
    ) -> Result<(), JoinError> {
        let channel = self.ledger.get(id).ok_or(JoinError::NotFound)?;
        if caller != channel.receiver() {
            return Err(JoinError::WrongReceiver {
                expected: channel.receiver(),
                actual: caller,
            });
        }
        if amount.is_zero() {
            return Err(JoinError::InvalidAmount);
        }
        if channel.status() != ChannelStatus::Opened {
            return Err(JoinError::WrongState {
                expected: ChannelStatus::Opened,
                actual: channel.status(),
            });
        }
        if channel.sender_balance().checked_add(amount).is_none() {
            return Err(JoinError::DepositOverflow);
        }
        let token = channel.token();

        self.escrow.collect(token, caller, amount)?;
        self.ledger
            .get_mut(id)
            .expect("presence checked above")
            .join(amount);

        self.sink.publish(ChannelEvent::Joined {
            id,
            receiver: caller,
            amount,
        });
        Ok(())
    }

    /// Close a channel with a co-signed settlement: verify both signatures
    /// over the canonical digest, check the split disburses exactly the
    /// escrowed total, pay out, `Joined → Closed`.
    ///
    /// Callable by anyone holding both signatures. The submitted nonce is
    /// not compared against a stored high-water mark; any validly co-signed
    /// tuple settles the channel (cooperative model, no dispute window).
    pub fn close_channel(
        &mut self,
        id: ChannelId,
        nonce: u64,
        sender_balance: U256,
        receiver_balance: U256,
        sender_sig: Signature,
        receiver_sig: Signature,
    ) -> Result<(), CloseError> {
        let channel = self.ledger.get(id).ok_or(CloseError::NotFound)?;
        if channel.status() != ChannelStatus::Joined {
            return Err(CloseError::WrongState {
                expected: ChannelStatus::Joined,
                actual: channel.status(),
            });
        }

        let state = SettlementState {
            channel_id: id,
            sender_balance,
            receiver_balance,
            nonce,
        };
        let digest = state.digest()?;

        // Both signatures are checked independently, sender first.
        let recovered = sig::recover_signer(digest, sender_sig)?;
        if recovered != channel.sender() {
            return Err(CloseError::InvalidSenderSignature(recovered));
        }
        let recovered = sig::recover_signer(digest, receiver_sig)?;
        if recovered != channel.receiver() {
            return Err(CloseError::InvalidReceiverSignature(recovered));
        }

        // Fail closed: never disburse more or less than was escrowed.
        let escrowed = channel.total_escrow();
        if sender_balance.checked_add(receiver_balance) != Some(escrowed) {
            return Err(CloseError::BalanceMismatch {
                escrowed,
                sender_balance,
                receiver_balance,
            });
        }

        let token = channel.token();
        let sender = channel.sender();
        let receiver = channel.receiver();

        self.escrow.disburse(token, sender, sender_balance)?;
        self.escrow.disburse(token, receiver, receiver_balance)?;
        self.ledger
            .get_mut(id)
            .expect("presence checked above")
            .close(sender_balance, receiver_balance, nonce);

        self.sink.publish(ChannelEvent::Closed {
            id,
            sender_balance,
            receiver_balance,
        });
        Ok(())
    }

    /// [close_channel][Self::close_channel] from an off-chain
    /// [CoSignedSettlement].
    pub fn close_channel_with(&mut self, settlement: &CoSignedSettlement) -> Result<(), CloseError> {
        self.close_channel(
            settlement.state.channel_id,
            settlement.state.nonce,
            settlement.state.sender_balance,
            settlement.state.receiver_balance,
            settlement.sender_sig,
            settlement.receiver_sig,
        )
    }
}
