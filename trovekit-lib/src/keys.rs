//! Role-tagged Ed25519 keys with human-typeable encodings.
//!
//! Account and treasure keys are encoded as bech32m strings under distinct
//! human-readable prefixes, so a key pasted or scanned into the wrong slot
//! fails to decode instead of quietly verifying nothing. Secret keys are
//! one-way: deriving the public key is deterministic, and a [`Keypair`] can
//! only be built by derivation, never from two unrelated halves.

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bech32::{FromBase32, ToBase32, Variant};
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;

use crate::errors::{DecodeError, VerifyError};

/// Which of the two protocol identities a key belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyRole {
    /// The user or device planting and claiming treasures.
    Account,
    /// A single plantable, claimable treasure.
    Treasure,
}

impl KeyRole {
    /// Human-readable bech32 prefix for secret keys of this role.
    pub fn secret_hrp(self) -> &'static str {
        match self {
            KeyRole::Account => "tas",
            KeyRole::Treasure => "tts",
        }
    }

    /// Human-readable bech32 prefix for public keys of this role.
    pub fn public_hrp(self) -> &'static str {
        match self {
            KeyRole::Account => "tap",
            KeyRole::Treasure => "ttp",
        }
    }
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyRole::Account => f.write_str("account"),
            KeyRole::Treasure => f.write_str("treasure"),
        }
    }
}

/// A role-tagged Ed25519 secret key.
#[derive(Clone)]
pub struct SecretKey {
    role: KeyRole,
    key: SigningKey,
}

impl SecretKey {
    /// Generate a fresh random secret key. Never fails.
    pub fn generate(role: KeyRole) -> Self {
        Self {
            role,
            key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Build a secret key from raw bytes.
    pub fn from_bytes(role: KeyRole, bytes: [u8; 32]) -> Self {
        Self {
            role,
            key: SigningKey::from_bytes(&bytes),
        }
    }

    /// Decode a human-typeable secret key string for the given role.
    ///
    /// Pure and deterministic. Fails on a wrong prefix, wrong bech32 variant,
    /// or unusable key bytes.
    pub fn decode(role: KeyRole, encoded: &str) -> Result<Self, DecodeError> {
        let bytes = decode_bech32(role.secret_hrp(), encoded)?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| DecodeError::InvalidKey("wrong secret key length".into()))?;
        Ok(Self::from_bytes(role, bytes))
    }

    /// Encode as a human-typeable bech32m string.
    pub fn encode(&self) -> String {
        encode_bech32(self.role.secret_hrp(), self.key.as_bytes())
    }

    pub fn role(&self) -> KeyRole {
        self.role
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.key.to_bytes()
    }

    /// Derive the public key. Deterministic: the same secret always derives
    /// the same public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            role: self.role,
            key: self.key.verifying_key(),
        }
    }

    /// Sign a message, surfacing signer failures to the caller.
    pub fn sign(&self, message: &[u8]) -> Result<Signature, SigningFailure> {
        self.key
            .try_sign(message)
            .map(Signature)
            .map_err(|e| SigningFailure(e.to_string()))
    }
}

impl fmt::Debug for SecretKey {
    // Never print key material.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// The signer reported an error for this message.
#[derive(Debug)]
pub struct SigningFailure(pub String);

impl fmt::Display for SigningFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "signer failure: {}", self.0)
    }
}

impl std::error::Error for SigningFailure {}

/// A role-tagged Ed25519 public key: identity reference and verification key.
#[derive(Clone)]
pub struct PublicKey {
    role: KeyRole,
    key: VerifyingKey,
}

impl PublicKey {
    /// Decode a bech32m public key string for the given role.
    pub fn decode(role: KeyRole, encoded: &str) -> Result<Self, DecodeError> {
        let bytes = decode_bech32(role.public_hrp(), encoded)?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| DecodeError::InvalidKey("wrong public key length".into()))?;
        let key = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| DecodeError::InvalidKey(e.to_string()))?;
        Ok(Self { role, key })
    }

    /// Encode as a bech32m string.
    pub fn encode(&self) -> String {
        encode_bech32(self.role.public_hrp(), self.key.as_bytes())
    }

    pub fn role(&self) -> KeyRole {
        self.role
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.key.to_bytes()
    }

    /// Shortened display form for page headings and logs.
    pub fn abbrev(&self) -> String {
        let encoded = self.encode();
        let head: String = encoded.chars().take(14).collect();
        format!("{}\u{2026}", head)
    }

    /// Verify a signature over `message` by the holder of this key's secret.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), VerifyError> {
        self.key
            .verify_strict(message, &signature.0)
            .map_err(|_| VerifyError::Signature { signer: self.role })
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.role == other.role && self.key.as_bytes() == other.key.as_bytes()
    }
}

impl Eq for PublicKey {}

impl std::hash::Hash for PublicKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.role.hash(state);
        self.key.as_bytes().hash(state);
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("role", &self.role)
            .field("key", &self.encode())
            .finish()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// A derived secret/public pair.
///
/// Only constructible through derivation, so the public half is always
/// exactly the key derived from the secret half.
#[derive(Clone, Debug)]
pub struct Keypair {
    secret: SecretKey,
    public: PublicKey,
}

impl Keypair {
    /// Generate a fresh random keypair for the given role.
    pub fn generate(role: KeyRole) -> Self {
        Self::from_secret(SecretKey::generate(role))
    }

    /// Derive the pair from a secret key.
    pub fn from_secret(secret: SecretKey) -> Self {
        let public = secret.public_key();
        Self { secret, public }
    }

    pub fn secret(&self) -> &SecretKey {
        &self.secret
    }

    pub fn public(&self) -> &PublicKey {
        &self.public
    }
}

/// A protocol identity: a keypair slot that is either fully populated or
/// fully absent, never half of one.
#[derive(Clone, Debug, Default)]
pub struct Identity {
    keypair: Option<Keypair>,
}

impl Identity {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_keypair(keypair: Keypair) -> Self {
        Self {
            keypair: Some(keypair),
        }
    }

    pub fn keypair(&self) -> Option<&Keypair> {
        self.keypair.as_ref()
    }

    pub fn secret_key(&self) -> Option<&SecretKey> {
        self.keypair.as_ref().map(Keypair::secret)
    }

    /// The public key, guaranteed derived from the stored secret key.
    pub fn public_key(&self) -> Option<&PublicKey> {
        self.keypair.as_ref().map(Keypair::public)
    }

    pub fn is_populated(&self) -> bool {
        self.keypair.is_some()
    }
}

/// An Ed25519 signature, base64 encoded on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature(ed25519_dalek::Signature);

impl Signature {
    /// Encode as base64 for the wire.
    pub fn encode(&self) -> String {
        BASE64.encode(self.0.to_bytes())
    }

    /// Decode a base64 signature string.
    pub fn decode(encoded: &str) -> Result<Self, DecodeError> {
        let bytes = BASE64.decode(encoded)?;
        let signature = ed25519_dalek::Signature::from_slice(&bytes)
            .map_err(|e| DecodeError::InvalidSignature(e.to_string()))?;
        Ok(Self(signature))
    }
}

fn encode_bech32(hrp: &'static str, bytes: &[u8]) -> String {
    // The HRP constants on KeyRole are valid, so encoding cannot fail.
    bech32::encode(hrp, bytes.to_base32(), Variant::Bech32m).expect("static hrp")
}

fn decode_bech32(hrp: &'static str, encoded: &str) -> Result<Vec<u8>, DecodeError> {
    let (found_hrp, data, variant) = bech32::decode(encoded)?;

    if found_hrp != hrp {
        return Err(DecodeError::WrongHrp {
            expected: hrp,
            found: found_hrp,
        });
    }

    if variant != Variant::Bech32m {
        return Err(DecodeError::WrongVariant);
    }

    Ok(Vec::<u8>::from_base32(&data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_key_round_trips_through_encoding() {
        let secret = SecretKey::generate(KeyRole::Treasure);
        let encoded = secret.encode();
        assert!(encoded.starts_with("tts1"));

        let decoded = SecretKey::decode(KeyRole::Treasure, &encoded).unwrap();
        assert_eq!(decoded.to_bytes(), secret.to_bytes());
        assert_eq!(decoded.public_key(), secret.public_key());
    }

    #[test]
    fn derivation_is_deterministic() {
        let secret = SecretKey::generate(KeyRole::Account);
        assert_eq!(secret.public_key(), secret.public_key());
    }

    #[test]
    fn malformed_secret_keys_are_rejected() {
        assert!(SecretKey::decode(KeyRole::Account, "").is_err());
        assert!(SecretKey::decode(KeyRole::Account, "not-a-key").is_err());
    }

    #[test]
    fn wrong_role_prefix_is_rejected() {
        let treasure = SecretKey::generate(KeyRole::Treasure);
        let err = SecretKey::decode(KeyRole::Account, &treasure.encode()).unwrap_err();
        assert!(matches!(err, DecodeError::WrongHrp { expected: "tas", .. }));
    }

    #[test]
    fn public_key_round_trips_through_encoding() {
        let public = SecretKey::generate(KeyRole::Treasure).public_key();
        let decoded = PublicKey::decode(KeyRole::Treasure, &public.encode()).unwrap();
        assert_eq!(decoded, public);
    }

    #[test]
    fn signature_round_trips_through_encoding() {
        let secret = SecretKey::generate(KeyRole::Account);
        let signature = secret.sign(b"message").unwrap();
        let decoded = Signature::decode(&signature.encode()).unwrap();
        assert_eq!(decoded, signature);
    }

    #[test]
    fn sign_and_verify() {
        let keypair = Keypair::generate(KeyRole::Treasure);
        let signature = keypair.secret().sign(b"message").unwrap();
        assert!(keypair.public().verify(b"message", &signature).is_ok());
        assert!(keypair.public().verify(b"other", &signature).is_err());
    }

    #[test]
    fn identity_is_all_or_nothing() {
        let empty = Identity::empty();
        assert!(!empty.is_populated());
        assert!(empty.public_key().is_none());

        let populated = Identity::from_keypair(Keypair::generate(KeyRole::Account));
        let derived = populated.secret_key().unwrap().public_key();
        assert_eq!(populated.public_key(), Some(&derived));
    }

    #[test]
    fn secret_key_debug_hides_key_material() {
        let secret = SecretKey::generate(KeyRole::Account);
        let rendered = format!("{:?}", secret);
        assert!(!rendered.contains(&secret.encode()));
    }
}
