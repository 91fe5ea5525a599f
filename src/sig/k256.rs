//! Signer using the k256 Rust crate (implementation of ecdsa in Rust).

use crate::abiencode::types::{Address, Hash, Signature};
use k256::{
    ecdsa::{
        recoverable,
        signature::{hazmat::PrehashSigner, Signature as k256Signature},
        SigningKey, VerifyingKey,
    },
    elliptic_curve::sec1::ToEncodedPoint,
};
use sha3::{Digest, Keccak256};

use super::hash_to_eth_signed_msg_hash;

#[derive(Debug)]
pub enum Error {
    /// The recovery byte is not 27 or 28.
    NonCanonicalRecoveryId(u8),
    /// `s` is in the upper half of the curve order; the unique low-`s` form
    /// of the same signature would be accepted instead.
    NonCanonicalS,
    /// `r‖s` did not decode to a signature or recovery yielded no key.
    RecoveryFailed(k256::ecdsa::Error),
}

impl From<k256::ecdsa::Error> for Error {
    fn from(e: k256::ecdsa::Error) -> Self {
        Self::RecoveryFailed(e)
    }
}

#[derive(Debug)]
pub struct Signer {
    key: SigningKey,
    addr: Address,
}

impl From<VerifyingKey> for Address {
    fn from(key: VerifyingKey) -> Self {
        // Convert the key into an EncodedPoint (on the curve), which has the
        // data we need in bytes [1..]. The first byte is an artifact of the
        // SEC1 uncompressed encoding and not part of the public key.
        let pk_bytes: [u8; 65] = key.to_encoded_point(false).as_bytes().try_into().unwrap();

        let hash: [u8; 32] = Keccak256::digest(&pk_bytes[1..]).into();

        let mut addr = Address([0; 20]);
        addr.0.copy_from_slice(&hash[32 - 20..]);
        addr
    }
}

impl Signer {
    pub fn new<R: rand::Rng + rand::CryptoRng>(rng: &mut R) -> Self {
        let key = SigningKey::random(rng);
        let addr = key.verifying_key().into();

        Self { key, addr }
    }

    pub fn address(&self) -> Address {
        self.addr
    }

    pub fn sign_eth(&self, msg: Hash) -> Signature {
        // "\x19Ethereum Signed Message:\n32" format
        let hash = hash_to_eth_signed_msg_hash(msg);

        let sig: recoverable::Signature = self.key.sign_prehash(&hash.0).unwrap();

        // The recoverable signature already has the layout we need: 65 bytes
        // containing r, s and v in this order. Only v needs the offset of 27
        // for the signature to match what on-chain verifiers expect.
        let mut sig_bytes: [u8; 65] = sig.as_bytes().try_into().expect(
            "Unreachable: Signature size doesn't match, something big must have changed in the dependency",
        );
        // The library produces low-s signatures, which recover_signer relies on.
        debug_assert!(sig_bytes[32] & 0x80 == 0);
        sig_bytes[64] += 27;

        Signature(sig_bytes)
    }

    pub fn recover_signer(&self, msg: Hash, eth_sig: Signature) -> Result<Address, Error> {
        recover_signer(msg, eth_sig)
    }
}

/// Recover the signer's address from a digest and a 65-byte signature.
///
/// `msg` is the digest given to [Signer::sign_eth], without the
/// `Ethereum Signed Message` prefix (it is applied here).
pub fn recover_signer(msg: Hash, eth_sig: Signature) -> Result<Address, Error> {
    // "\x19Ethereum Signed Message:\n32" format
    let hash = hash_to_eth_signed_msg_hash(msg);

    let v = eth_sig.0[64];
    if v != 27 && v != 28 {
        return Err(Error::NonCanonicalRecoveryId(v));
    }
    // s >= 2^255 implies s > n/2 (the curve order starts with 0xff...fe), so
    // the high bit alone already proves the signature is malleable.
    if eth_sig.0[32] & 0x80 != 0 {
        return Err(Error::NonCanonicalS);
    }

    // Undo adding the 27, to go back to the format expected below
    let mut sig_bytes: [u8; 65] = eth_sig.0;
    sig_bytes[64] -= 27;

    let sig = recoverable::Signature::from_bytes(&sig_bytes)?;
    let verifying_key = sig.recover_verifying_key_from_digest_bytes(&hash.0.into())?;
    Ok(verifying_key.into())
}
