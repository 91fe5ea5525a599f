//! Handles the creation and verification of (Ethereum) Signatures.
//!
//! Settlement digests are signed with a recoverable ECDSA signature; the
//! registry never stores public keys and instead recovers the signer's
//! [Address][crate::Address] from the digest and the 65-byte signature.
//! Non-canonical signatures (a recovery byte other than 27/28 or a high `s`
//! value) are rejected rather than normalized, so every accepted signature
//! has exactly one valid byte representation.

use crate::abiencode::types::Hash;
use sha3::{Digest, Keccak256};

#[cfg(feature = "k256")]
mod k256;
#[cfg(feature = "k256")]
pub use self::k256::{recover_signer, Error, Signer};

#[cfg(feature = "secp256k1")]
pub mod secp256k1;
#[cfg(all(feature = "secp256k1", not(feature = "k256")))]
pub use self::secp256k1::{recover_signer, Error, Signer};

#[cfg(not(any(feature = "k256", feature = "secp256k1")))]
compile_error!("enable at least one signature backend: `k256` (default) or `secp256k1`");


/// Add the `\x19Ethereum Signed Message\n<length>` prefix to hash.
///
/// Domain separation: a signature over a settlement digest can never be
/// mistaken for a signature over raw transaction data.
fn hash_to_eth_signed_msg_hash(hash: Hash) -> Hash {
    // Packed encoding => We can't use the serializer
    let mut hasher = Keccak256::new();
    hasher.update(b"\x19Ethereum Signed Message:\n32");
    hasher.update(hash.0);
    Hash(hasher.finalize().into())
}
