//! Hashing and ECDSA (secp256k1) primitives used by transactions and blocks.
//!
//! Public keys travel as base64 of the 64 coordinate bytes (x || y) and
//! signatures as hex of the 64-byte compact (r || s) form.

use crate::constants::{HASH_SIZE, PUBLIC_KEY_COORDS_SIZE};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use secp256k1::{ecdsa, All, Message, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

static SECP256K1_CONTEXT: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

/// Tag byte prefixed to an uncompressed SEC1 point.
const UNCOMPRESSED_TAG: u8 = 0x04;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("hash is not a 32-byte hex digest")]
    InvalidHash,
    #[error("public key is not a valid secp256k1 point")]
    InvalidPublicKey,
    #[error("signature is not a valid compact hex signature")]
    InvalidSignatureEncoding,
    #[error("signature verification failed")]
    VerificationFailed,
}

/// SHA-256 of `bytes` as 64 lowercase hex characters.
pub fn hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Serialized public key (base64 of x || y).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicKey(String);

impl PublicKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn decode(&self) -> Result<secp256k1::PublicKey, CryptoError> {
        let coords = STANDARD
            .decode(&self.0)
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        if coords.len() != PUBLIC_KEY_COORDS_SIZE {
            return Err(CryptoError::InvalidPublicKey);
        }
        let mut sec1 = Vec::with_capacity(PUBLIC_KEY_COORDS_SIZE + 1);
        sec1.push(UNCOMPRESSED_TAG);
        sec1.extend_from_slice(&coords);
        secp256k1::PublicKey::from_slice(&sec1).map_err(|_| CryptoError::InvalidPublicKey)
    }
}

impl From<&secp256k1::PublicKey> for PublicKey {
    fn from(key: &secp256k1::PublicKey) -> Self {
        let sec1 = key.serialize_uncompressed();
        PublicKey(STANDARD.encode(&sec1[1..]))
    }
}

impl From<String> for PublicKey {
    fn from(s: String) -> Self {
        PublicKey(s)
    }
}

impl From<&str> for PublicKey {
    fn from(s: &str) -> Self {
        PublicKey(s.to_string())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hex-encoded compact ECDSA signature.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(String);

impl Signature {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn decode(&self) -> Result<ecdsa::Signature, CryptoError> {
        let bytes = hex::decode(&self.0).map_err(|_| CryptoError::InvalidSignatureEncoding)?;
        ecdsa::Signature::from_compact(&bytes).map_err(|_| CryptoError::InvalidSignatureEncoding)
    }
}

impl From<String> for Signature {
    fn from(s: String) -> Self {
        Signature(s)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn digest_message(hash_hex: &str) -> Result<Message, CryptoError> {
    let bytes = hex::decode(hash_hex).map_err(|_| CryptoError::InvalidHash)?;
    let digest: [u8; HASH_SIZE] = bytes.try_into().map_err(|_| CryptoError::InvalidHash)?;
    Ok(Message::from_digest(digest))
}

#[derive(Debug, Clone)]
pub struct KeyPair {
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl KeyPair {
    /// Generates a new random key pair from the OS random number generator.
    pub fn generate() -> Self {
        let secret_key = SecretKey::new(&mut OsRng);
        Self::from_secret_key(secret_key)
    }

    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let point = secp256k1::PublicKey::from_secret_key(&SECP256K1_CONTEXT, &secret_key);
        KeyPair {
            secret_key,
            public_key: PublicKey::from(&point),
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Signs the digest that `hash_hex` encodes.
    pub fn sign(&self, hash_hex: &str) -> Result<Signature, CryptoError> {
        let message = digest_message(hash_hex)?;
        let signature = SECP256K1_CONTEXT.sign_ecdsa(&message, &self.secret_key);
        Ok(Signature(hex::encode(signature.serialize_compact())))
    }
}

/// Checks that `signature` over `hash_hex` was produced by the owner of `public_key`.
pub fn verify(
    public_key: &PublicKey,
    signature: &Signature,
    hash_hex: &str,
) -> Result<(), CryptoError> {
    let point = public_key.decode()?;
    let signature = signature.decode()?;
    let message = digest_message(hash_hex)?;
    SECP256K1_CONTEXT
        .verify_ecdsa(&message, &signature, &point)
        .map_err(|_| CryptoError::VerificationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_sha256_hex() {
        assert_eq!(
            hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash(b"").len(), 64);
    }

    #[test]
    fn public_key_is_base64_of_coordinates() {
        let keys = KeyPair::generate();
        let raw = STANDARD.decode(keys.public_key().as_str()).unwrap();
        assert_eq!(raw.len(), PUBLIC_KEY_COORDS_SIZE);
        assert!(keys.public_key().decode().is_ok());
    }

    #[test]
    fn sign_and_verify() {
        let keys = KeyPair::generate();
        let h = hash(b"pay bob 10");
        let signature = keys.sign(&h).unwrap();
        assert_eq!(signature.as_str().len(), 128);
        assert!(verify(keys.public_key(), &signature, &h).is_ok());
    }

    #[test]
    fn verify_rejects_other_key() {
        let alice = KeyPair::generate();
        let mallory = KeyPair::generate();
        let h = hash(b"pay bob 10");
        let signature = alice.sign(&h).unwrap();
        assert_eq!(
            verify(mallory.public_key(), &signature, &h),
            Err(CryptoError::VerificationFailed)
        );
    }

    #[test]
    fn verify_rejects_altered_hash() {
        let keys = KeyPair::generate();
        let signature = keys.sign(&hash(b"original")).unwrap();
        assert_eq!(
            verify(keys.public_key(), &signature, &hash(b"tampered")),
            Err(CryptoError::VerificationFailed)
        );
    }

    #[test]
    fn malformed_inputs_are_reported() {
        let keys = KeyPair::generate();
        let h = hash(b"x");
        let signature = keys.sign(&h).unwrap();

        assert_eq!(keys.sign("not-hex"), Err(CryptoError::InvalidHash));
        assert_eq!(keys.sign("abcd"), Err(CryptoError::InvalidHash));
        assert_eq!(
            verify(&PublicKey::from("genesis"), &signature, &h),
            Err(CryptoError::InvalidPublicKey)
        );
        assert_eq!(
            verify(keys.public_key(), &Signature::from("zz".to_string()), &h),
            Err(CryptoError::InvalidSignatureEncoding)
        );
    }
}
