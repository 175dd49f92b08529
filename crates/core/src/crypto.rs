//! P-256 ECDSA primitives for signing and verification.
//!
//! Every signature covers `hash(message)`: the SHA-256 digest is handed to
//! the curve as a prehash, never the raw message. Signing is RFC 6979
//! deterministic, so the same key and message always give the same `(r, s)`.

use crate::hash::{hash, Hash};
use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::ecdsa::{Signature as EcdsaSignature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Length of a packed (SEC1 uncompressed) P-256 public key.
pub const PACKED_PUBLIC_KEY_LEN: usize = 65;

/// Length of the `r || s` signature wire encoding.
pub const SIGNATURE_LEN: usize = 64;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("key generation failed: {0}")]
    KeyGen(String),
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid public key")]
    InvalidPublicKey,
    #[error("invalid private key")]
    InvalidPrivateKey,
    #[error("invalid hex encoding")]
    InvalidHex,
    #[error("signing failed")]
    Signing,
}

/// A 32-byte address: the SHA-256 hash of a packed public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// The zero address (all zeros).
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create an address from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive the address of a public key.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        Self(hash(&public_key.pack()).0)
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to a lowercase hex string, the same form it serializes to.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a hex string (with or without 0x prefix).
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidHex)?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| CryptoError::InvalidHex)?;
        Ok(Self(arr))
    }
}

impl From<Hash> for Address {
    fn from(h: Hash) -> Self {
        Self(h.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", &self.to_hex()[..10])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A public key in packed SEC1 uncompressed form (`0x04 || X || Y`).
///
/// Unpacking does not check that the point is on the curve; a key that
/// does not decode simply never verifies anything. The empty key is the
/// sender of a genesis transaction.
#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PublicKey(#[serde(with = "hex")] Vec<u8>);

impl PublicKey {
    /// Pack to the uncompressed point encoding.
    pub fn pack(&self) -> Vec<u8> {
        self.0.clone()
    }

    /// Unpack from bytes produced by [`PublicKey::pack`]. Bit-exact, unchecked.
    pub fn unpack(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }

    /// True for the empty "nobody" key.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Derive the address from this public key.
    pub fn to_address(&self) -> Address {
        Address::from_public_key(self)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidHex)?;
        Ok(Self(bytes))
    }

    /// Decode into a curve point. Fails for anything that is not a valid
    /// P-256 point.
    pub fn verifying_key(&self) -> Result<VerifyingKey, CryptoError> {
        VerifyingKey::from_sec1_bytes(&self.0).map_err(|_| CryptoError::InvalidPublicKey)
    }
}

impl From<&VerifyingKey> for PublicKey {
    fn from(key: &VerifyingKey) -> Self {
        Self(key.to_encoded_point(false).as_bytes().to_vec())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = &self.0[..self.0.len().min(8)];
        write!(f, "PublicKey({})", hex::encode(shown))
    }
}

/// An ECDSA signature as the pair of unsigned integers `(r, s)`, each held
/// big-endian and zero-padded to 32 bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    r: [u8; 32],
    s: [u8; 32],
}

impl Signature {
    pub fn new(r: [u8; 32], s: [u8; 32]) -> Self {
        Self { r, s }
    }

    pub fn r(&self) -> &[u8; 32] {
        &self.r
    }

    pub fn s(&self) -> &[u8; 32] {
        &self.s
    }

    /// The 64-byte wire encoding `r || s`.
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        let mut out = [0u8; SIGNATURE_LEN];
        out[..32].copy_from_slice(&self.r);
        out[32..].copy_from_slice(&self.s);
        out
    }

    /// Parse the wire encoding. Anything but exactly 64 bytes is rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != SIGNATURE_LEN {
            return Err(CryptoError::InvalidSignature);
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Ok(Self { r, s })
    }

    fn from_ecdsa(sig: &EcdsaSignature) -> Self {
        let bytes = sig.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Self { r, s }
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", hex::encode(&self.r[..8]))
    }
}

/// The signing capability the ledger needs from key management.
pub trait Signer {
    /// Sign `hash(message)`.
    fn sign(&self, message: &[u8]) -> Result<Signature, CryptoError>;

    /// The public key matching the signing key.
    fn public_key(&self) -> PublicKey;
}

/// A P-256 keypair for signing and verification.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
    pub public_key: PublicKey,
}

impl Keypair {
    /// Generate a new random keypair from the OS entropy source.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut bytes = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| CryptoError::KeyGen(e.to_string()))?;
        let signing_key = SigningKey::from_slice(&bytes)
            .map_err(|_| CryptoError::KeyGen("drawn scalar is not a valid key".into()))?;
        Ok(Self::from_signing_key(signing_key))
    }

    /// Create a keypair from a private scalar (32 bytes, big-endian).
    pub fn from_private_key(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_slice(bytes).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self::from_signing_key(signing_key))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let public_key = PublicKey::from(signing_key.verifying_key());
        Self {
            signing_key,
            public_key,
        }
    }

    /// Get the private key bytes.
    pub fn private_key(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.signing_key.to_bytes());
        out
    }

    /// Get the address derived from the public key.
    pub fn address(&self) -> Address {
        self.public_key.to_address()
    }

    /// Sign `hash(message)`.
    pub fn sign(&self, message: &[u8]) -> Result<Signature, CryptoError> {
        let digest = hash(message);
        let sig: EcdsaSignature = self
            .signing_key
            .sign_prehash(digest.as_bytes())
            .map_err(|_| CryptoError::Signing)?;
        Ok(Signature::from_ecdsa(&sig))
    }

    /// Verify a signature against our public key.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        verify_signature(&self.public_key, message, signature)
    }
}

impl Signer for Keypair {
    fn sign(&self, message: &[u8]) -> Result<Signature, CryptoError> {
        Keypair::sign(self, message)
    }

    fn public_key(&self) -> PublicKey {
        self.public_key.clone()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address())
            .finish()
    }
}

/// Sign `hash(message)` with any signing capability.
pub fn sign<S: Signer + ?Sized>(signer: &S, message: &[u8]) -> Result<Signature, CryptoError> {
    signer.sign(message)
}

/// Check `signature` over `hash(message)`. Malformed keys or signatures
/// yield `false`.
pub fn verify_signature(public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
    let Ok(verifying_key) = public_key.verifying_key() else {
        return false;
    };
    let Ok(sig) = EcdsaSignature::from_slice(&signature.to_bytes()) else {
        return false;
    };
    let digest = hash(message);
    verifying_key.verify_prehash(digest.as_bytes(), &sig).is_ok()
}
