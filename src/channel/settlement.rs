//! Off-chain settlement states and their co-signing.
//!
//! After joining, the parties alternately propose new balance splits by
//! incrementing the nonce and collecting both signatures over the digest of
//! the new state. Nothing here touches the shared ledger; only the final
//! [CoSignedSettlement] is ever submitted, via
//! [close_channel][crate::registry::ChannelRegistry::close_channel].

use serde::Serialize;

use super::{Channel, ChannelId, Role};
use crate::{
    abiencode::{
        self,
        types::{Address, Hash, Signature, U256},
    },
    sig::{self, Signer},
};

/// The tuple both parties sign: one candidate final state of a channel.
#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct SettlementState {
    pub channel_id: ChannelId,
    pub sender_balance: U256,
    pub receiver_balance: U256,
    pub nonce: u64,
}

#[derive(Debug, PartialEq, Eq)]
pub enum TransferError {
    /// The paying party does not have `requested` left in the channel.
    InsufficientBalance {
        payer: Role,
        available: U256,
        requested: U256,
    },
}

impl SettlementState {
    /// Canonical digest: `channel_id`, `sender_balance`, `receiver_balance`,
    /// `nonce`, each in a fixed-width slot, keccak hashed. Signing applies
    /// the eth-signed-message prefix on top.
    pub fn digest(&self) -> Result<Hash, abiencode::Error> {
        abiencode::to_hash(self)
    }

    /// Successor state in which `payer` moves `amount` to the other party.
    ///
    /// The balance sum is preserved and the nonce incremented, so a stale
    /// state never shares a digest with its successors.
    pub fn transfer(&self, payer: Role, amount: U256) -> Result<Self, TransferError> {
        let (from, to) = match payer {
            Role::Sender => (self.sender_balance, self.receiver_balance),
            Role::Receiver => (self.receiver_balance, self.sender_balance),
        };

        let from = from
            .checked_sub(amount)
            .ok_or(TransferError::InsufficientBalance {
                payer,
                available: from,
                requested: amount,
            })?;
        // Cannot overflow: the sum is preserved.
        let to = to + amount;

        let (sender_balance, receiver_balance) = match payer {
            Role::Sender => (from, to),
            Role::Receiver => (to, from),
        };

        Ok(SettlementState {
            channel_id: self.channel_id,
            sender_balance,
            receiver_balance,
            nonce: self.nonce + 1,
        })
    }
}

/// The starting point for off-chain updates: the deposits as recorded by the
/// ledger after the receiver joined, at nonce 0.
impl From<&Channel> for SettlementState {
    fn from(channel: &Channel) -> Self {
        SettlementState {
            channel_id: channel.id(),
            sender_balance: channel.sender_balance(),
            receiver_balance: channel.receiver_balance(),
            nonce: channel.nonce(),
        }
    }
}

#[derive(Debug)]
pub enum SignError {
    AbiEncode(abiencode::Error),
    AlreadySigned(Role),
}
impl From<abiencode::Error> for SignError {
    fn from(e: abiencode::Error) -> Self {
        Self::AbiEncode(e)
    }
}

#[derive(Debug)]
pub enum AddSignatureError {
    AbiEncode(abiencode::Error),
    RecoveryFailed(sig::Error),
    /// The signature is valid but was not produced by the party expected to
    /// sign as `role`.
    SignerMismatch { role: Role, recovered: Address },
    AlreadySigned(Role),
}
impl From<abiencode::Error> for AddSignatureError {
    fn from(e: abiencode::Error) -> Self {
        Self::AbiEncode(e)
    }
}
impl From<sig::Error> for AddSignatureError {
    fn from(e: sig::Error) -> Self {
        Self::RecoveryFailed(e)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum CoSignError {
    MissingSignature(Role),
}

/// Collects the two parties' signatures over a single settlement state.
#[derive(Debug)]
pub struct SettlementUpdate {
    state: SettlementState,
    signatures: [Option<Signature>; 2],
}

impl SettlementUpdate {
    pub fn new(state: SettlementState) -> Self {
        SettlementUpdate {
            state,
            signatures: [None; 2],
        }
    }

    pub fn state(&self) -> SettlementState {
        self.state
    }

    /// Sign the state with our own key, acting as `role`.
    pub fn accept(&mut self, role: Role, signer: &Signer) -> Result<Signature, SignError> {
        match self.signatures[role.index()] {
            Some(_) => Err(SignError::AlreadySigned(role)),
            None => {
                let sig = signer.sign_eth(self.state.digest()?);
                self.signatures[role.index()] = Some(sig);
                Ok(sig)
            }
        }
    }

    /// Record the counterparty's signature after checking it recovers to the
    /// address expected for `role`.
    pub fn add_signature(
        &mut self,
        role: Role,
        expected: Address,
        sig: Signature,
    ) -> Result<(), AddSignatureError> {
        let recovered = sig::recover_signer(self.state.digest()?, sig)?;
        if recovered != expected {
            return Err(AddSignatureError::SignerMismatch { role, recovered });
        }

        match self.signatures[role.index()] {
            Some(_) => Err(AddSignatureError::AlreadySigned(role)),
            None => {
                self.signatures[role.index()] = Some(sig);
                Ok(())
            }
        }
    }

    /// A state is only valid for future settlement once both parties signed.
    pub fn into_co_signed(self) -> Result<CoSignedSettlement, CoSignError> {
        let sender_sig = self.signatures[Role::Sender.index()]
            .ok_or(CoSignError::MissingSignature(Role::Sender))?;
        let receiver_sig = self.signatures[Role::Receiver.index()]
            .ok_or(CoSignError::MissingSignature(Role::Receiver))?;

        Ok(CoSignedSettlement {
            state: self.state,
            sender_sig,
            receiver_sig,
        })
    }
}

/// A settlement state carrying both signatures, ready to close the channel.
#[derive(Debug, Copy, Clone)]
pub struct CoSignedSettlement {
    pub state: SettlementState,
    pub sender_sig: Signature,
    pub receiver_sig: Signature,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn state() -> SettlementState {
        SettlementState {
            channel_id: Hash([0x11; 32]),
            sender_balance: U256::from(100),
            receiver_balance: U256::from(50),
            nonce: 0,
        }
    }

    #[test]
    fn transfer_moves_balance_and_bumps_nonce() {
        let next = state().transfer(Role::Sender, U256::from(10)).unwrap();
        assert_eq!(next.sender_balance, U256::from(90));
        assert_eq!(next.receiver_balance, U256::from(60));
        assert_eq!(next.nonce, 1);

        let next = next.transfer(Role::Receiver, U256::from(5)).unwrap();
        assert_eq!(next.sender_balance, U256::from(95));
        assert_eq!(next.receiver_balance, U256::from(55));
        assert_eq!(next.nonce, 2);
    }

    #[test]
    fn transfer_preserves_the_balance_sum() {
        let base = state();
        let next = base.transfer(Role::Sender, U256::from(37)).unwrap();
        assert_eq!(
            next.sender_balance + next.receiver_balance,
            base.sender_balance + base.receiver_balance
        );
    }

    #[test]
    fn overdraw_is_rejected() {
        let err = state()
            .transfer(Role::Receiver, U256::from(51))
            .unwrap_err();
        assert_eq!(
            err,
            TransferError::InsufficientBalance {
                payer: Role::Receiver,
                available: U256::from(50),
                requested: U256::from(51),
            }
        );
    }

    #[test]
    fn digest_differs_between_states() {
        let base = state();
        let next = base.transfer(Role::Sender, U256::from(10)).unwrap();
        assert_ne!(base.digest().unwrap(), next.digest().unwrap());

        // Same balances, different nonce: still a different digest.
        let replayed = SettlementState { nonce: 7, ..base };
        assert_ne!(base.digest().unwrap(), replayed.digest().unwrap());
    }

    #[test]
    fn co_signing_collects_both_roles() {
        let mut rng = StdRng::seed_from_u64(10);
        let sender = Signer::new(&mut rng);
        let receiver = Signer::new(&mut rng);

        let mut update = SettlementUpdate::new(state());
        let sender_sig = update.accept(Role::Sender, &sender).unwrap();

        // The receiver checks the sender's signature, then counter-signs.
        let mut counterparty = SettlementUpdate::new(state());
        counterparty
            .add_signature(Role::Sender, sender.address(), sender_sig)
            .unwrap();
        let receiver_sig = counterparty.accept(Role::Receiver, &receiver).unwrap();

        update
            .add_signature(Role::Receiver, receiver.address(), receiver_sig)
            .unwrap();

        let co_signed = update.into_co_signed().unwrap();
        assert_eq!(co_signed.state, state());
        assert_eq!(co_signed.sender_sig, sender_sig);
        assert_eq!(co_signed.receiver_sig, receiver_sig);
    }

    #[test]
    fn missing_signature_blocks_settlement() {
        let mut rng = StdRng::seed_from_u64(11);
        let sender = Signer::new(&mut rng);

        let mut update = SettlementUpdate::new(state());
        update.accept(Role::Sender, &sender).unwrap();

        assert_eq!(
            update.into_co_signed().unwrap_err(),
            CoSignError::MissingSignature(Role::Receiver)
        );
    }

    #[test]
    fn double_signing_is_rejected() {
        let mut rng = StdRng::seed_from_u64(12);
        let sender = Signer::new(&mut rng);

        let mut update = SettlementUpdate::new(state());
        update.accept(Role::Sender, &sender).unwrap();
        assert!(matches!(
            update.accept(Role::Sender, &sender),
            Err(SignError::AlreadySigned(Role::Sender))
        ));
    }

    #[test]
    fn signature_from_the_wrong_party_is_rejected() {
        let mut rng = StdRng::seed_from_u64(13);
        let sender = Signer::new(&mut rng);
        let receiver = Signer::new(&mut rng);

        let mut update = SettlementUpdate::new(state());
        let sig = update.accept(Role::Sender, &sender).unwrap();

        // The receiver expects the sender's address but gets a signature made
        // by someone else entirely.
        let intruder = Signer::new(&mut rng);
        let forged = intruder.sign_eth(state().digest().unwrap());

        let mut counterparty = SettlementUpdate::new(state());
        assert!(matches!(
            counterparty.add_signature(Role::Sender, sender.address(), forged),
            Err(AddSignatureError::SignerMismatch {
                role: Role::Sender,
                ..
            })
        ));

        // The genuine signature attached to the wrong role fails too.
        assert!(matches!(
            counterparty.add_signature(Role::Receiver, receiver.address(), sig),
            Err(AddSignatureError::SignerMismatch {
                role: Role::Receiver,
                ..
            })
        ));
    }
}
