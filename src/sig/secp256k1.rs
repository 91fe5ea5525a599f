//! Signer using the secp256k1 crate (bindings to the C libsecp256k1).

use crate::abiencode::types::{Address, Hash, Signature};
use secp256k1::{
    ecdsa::{RecoverableSignature, RecoveryId},
    All, Message, Secp256k1, SecretKey,
};

use super::hash_to_eth_signed_msg_hash;

#[derive(Debug)]
pub enum Error {
    /// The recovery byte is not 27 or 28.
    NonCanonicalRecoveryId(u8),
    /// `s` is in the upper half of the curve order.
    NonCanonicalS,
    /// `r‖s` did not decode to a signature or recovery yielded no key.
    RecoveryFailed(secp256k1::Error),
}

impl From<secp256k1::Error> for Error {
    fn from(e: secp256k1::Error) -> Self {
        Self::RecoveryFailed(e)
    }
}

#[derive(Debug)]
pub struct Signer {
    secp: Secp256k1<All>,
    key: SecretKey,
    addr: Address,
}

impl Signer {
    pub fn new<R: rand::Rng + rand::CryptoRng>(rng: &mut R) -> Self {
        let secp = Secp256k1::new();
        let key = SecretKey::new(rng);
        let addr = key.public_key(&secp).into();

        Self { secp, key, addr }
    }

    pub fn address(&self) -> Address {
        self.addr
    }

    /// Sign a hash using an Ethereum 65-byte recoverable signature.
    pub fn sign_eth(&self, msg: Hash) -> Signature {
        // "\x19Ethereum Signed Message:\n32" format
        let hash = hash_to_eth_signed_msg_hash(msg);

        // sign_ecdsa_recoverable gives us the recovery id needed for v, so
        // the verifier can recover the address without knowing the key.
        let sig = self
            .secp
            .sign_ecdsa_recoverable(&Message::from(hash), &self.key);

        let (recid, rs) = sig.serialize_compact();

        // The library only produces canonical (low-s) signatures, see EIP-2.
        debug_assert!(rs[32] & 0x80 == 0);

        // v is offset by 27 so the value does not collide with other binary
        // prefixes used in Bitcoin; Ethereum kept the offset.
        let v: u8 = 27 + recid.to_i32() as u8;

        Signature::new(&rs, v)
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
    let hash = hash_to_eth_signed_msg_hash(msg);

    let v = eth_sig.0[64];
    if v != 27 && v != 28 {
        return Err(Error::NonCanonicalRecoveryId(v));
    }
    // s >= 2^255 implies s > n/2, which already proves malleability.
    if eth_sig.0[32] & 0x80 != 0 {
        return Err(Error::NonCanonicalS);
    }

    let rs = &eth_sig.0[..64];
    let recid = RecoveryId::from_i32((v - 27).into())?;
    let sig = RecoverableSignature::from_compact(rs, recid)?;

    let secp = Secp256k1::new();
    let pk = secp.recover_ecdsa(&Message::from(hash), &sig)?;

    Ok(pk.into())
}
