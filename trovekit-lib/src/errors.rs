//! Error types for trovekit core operations.
//!
//! Every fallible operation on the crypto surface returns one of these enums
//! instead of a null sentinel, so a failure can never be mistaken for success
//! at a call site.

use thiserror::Error;

use crate::keys::KeyRole;

/// Malformed key material or locator input.
///
/// Decode errors are non-fatal: the caller discards the offending input and
/// may retry with new input. They never leave a half-updated identity behind.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The string is not valid bech32 at all.
    #[error("malformed bech32 string: {0}")]
    Bech32(#[from] bech32::Error),

    /// Valid bech32, but carrying the wrong human-readable prefix.
    #[error("wrong key prefix: expected {expected:?}, found {found:?}")]
    WrongHrp {
        /// Prefix required for this role and key kind.
        expected: &'static str,
        /// Prefix actually present in the input.
        found: String,
    },

    /// Valid bech32, but not the bech32m variant keys are encoded with.
    #[error("wrong bech32 variant, expected bech32m")]
    WrongVariant,

    /// The decoded payload is not a usable key.
    #[error("invalid key bytes: {0}")]
    InvalidKey(String),

    /// A signature string that is not valid base64.
    #[error("malformed signature encoding: {0}")]
    SignatureEncoding(#[from] base64::DecodeError),

    /// Base64 decoded, but the bytes are not a valid signature.
    #[error("invalid signature bytes: {0}")]
    InvalidSignature(String),

    /// Image bytes on the wire that are not valid base64.
    #[error("malformed image encoding: {0}")]
    ImageEncoding(base64::DecodeError),

    /// A URL that does not carry an encoded secret key where one is expected.
    #[error("unrecognized locator URL")]
    UnrecognizedLocator,
}

/// Failures while assembling a plant or claim request.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The account identity has no key material.
    #[error("account identity is not populated")]
    MissingAccountIdentity,

    /// The treasure identity has no key material.
    #[error("treasure identity is not populated")]
    MissingTreasureIdentity,

    /// No treasure image was provided for planting.
    #[error("no treasure image provided")]
    MissingImage,

    /// The signer reported a failure; the request is abandoned whole.
    #[error("signing failed: {0}")]
    Signing(String),
}

impl ProtocolError {
    /// True for failures caught before any cryptographic work started.
    pub fn is_precondition(&self) -> bool {
        !matches!(self, ProtocolError::Signing(_))
    }
}

/// Failures while verifying an assembled request.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// A field of the request would not decode.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A signature decoded but does not verify over the binding message.
    #[error("{signer} signature does not verify")]
    Signature {
        /// Which of the two signers produced the bad signature.
        signer: KeyRole,
    },
}
