//! Locator URLs: shareable, scannable links embedding an encoded secret key.
//!
//! A locator is the payload printed into a treasure's QR code and the link a
//! finder can bookmark. It carries the bech32m secret key as a `key` query
//! parameter, so decoding a locator is the left inverse of building one:
//! `decode_locator(role, plant_url(sk))` yields `sk` and its derived public
//! key.

use crate::errors::DecodeError;
use crate::keys::{KeyRole, Keypair, SecretKey};

pub static PLANT_URL_PREFIX: &str = "https://trovekit.app/plant?key=";
pub static CLAIM_URL_PREFIX: &str = "https://trovekit.app/claim?key=";
pub static PLANT_URL_PREFIX_LOCAL: &str = "http://localhost:8000/plant?key=";
pub static CLAIM_URL_PREFIX_LOCAL: &str = "http://localhost:8000/claim?key=";

/// Bech32 data charset, for the cheap syntactic pre-filter.
const BECH32_CHARSET: &str = "qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// The result of decoding a locator: key material plus the normalized claim
/// link to show or store for the decoded key.
#[derive(Clone, Debug)]
pub struct DecodedLocator {
    keypair: Keypair,
    claim_url: String,
}

impl DecodedLocator {
    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    pub fn into_keypair(self) -> Keypair {
        self.keypair
    }

    /// Normalized claim URL for the embedded key.
    pub fn claim_url(&self) -> &str {
        &self.claim_url
    }
}

/// Build the plant-page locator for a secret key.
pub fn plant_url(secret: &SecretKey) -> String {
    format!("{}{}", PLANT_URL_PREFIX, secret.encode())
}

/// Build the claim-page locator for a secret key.
pub fn claim_url(secret: &SecretKey) -> String {
    format!("{}{}", CLAIM_URL_PREFIX, secret.encode())
}

/// Cheap syntactic pre-filter for scanned payloads.
///
/// Applied to every decoded camera frame before any key-revealing work: the
/// payload must start with a recognized locator prefix and the embedded key
/// must look like a bech32m secret key (known prefix, data charset only).
/// Payloads failing this check are discardable without touching session
/// state; payloads passing it commit the session to a full decode.
pub fn sanity_check(raw: &str) -> bool {
    match key_payload(raw) {
        Some(payload) => looks_like_secret_key(payload),
        None => false,
    }
}

/// Decode a locator into the embedded keypair for the given role.
///
/// Left inverse of [`plant_url`]/[`claim_url`]. Fails without revealing
/// anything on an unrecognized prefix or malformed key.
pub fn decode_locator(role: KeyRole, raw: &str) -> Result<DecodedLocator, DecodeError> {
    let payload = key_payload(raw).ok_or(DecodeError::UnrecognizedLocator)?;
    let secret = SecretKey::decode(role, payload)?;
    let claim_url = claim_url(&secret);
    Ok(DecodedLocator {
        keypair: Keypair::from_secret(secret),
        claim_url,
    })
}

/// Strip a recognized locator prefix, leaving the encoded key.
fn key_payload(raw: &str) -> Option<&str> {
    let raw = raw.trim();
    [
        PLANT_URL_PREFIX,
        CLAIM_URL_PREFIX,
        PLANT_URL_PREFIX_LOCAL,
        CLAIM_URL_PREFIX_LOCAL,
    ]
    .iter()
    .find_map(|prefix| raw.strip_prefix(prefix))
}

fn looks_like_secret_key(payload: &str) -> bool {
    [KeyRole::Account, KeyRole::Treasure].iter().any(|role| {
        payload
            .strip_prefix(role.secret_hrp())
            .and_then(|rest| rest.strip_prefix('1'))
            .is_some_and(|data| {
                !data.is_empty() && data.chars().all(|c| BECH32_CHARSET.contains(c))
            })
    })
}
