//! Request and response bodies for the trovekit backend wire contract.
//!
//! Field names are compatibility-significant: they are the JSON bodies the
//! backend accepts and returns. Keys are bech32m strings, signatures and
//! images are base64.

use serde::{Deserialize, Serialize};

/// A request to plant a treasure.
#[derive(Clone, Debug, Serialize, Deserialize, Hash, Eq, PartialEq)]
pub struct PlantRequest {
    /// The public key of the account planting the treasure, bech32m encoded.
    pub account_public_key: String,
    /// The public key representing the treasure, bech32m encoded.
    pub treasure_public_key: String,
    /// The treasure image, base64 encoded.
    pub image: String,
    /// A base64-encoded signature by the account key of
    /// the string "plant",
    /// appended by the treasure public key bytes.
    pub account_signature: String,
    /// A base64-encoded signature by the treasure key of
    /// the string "plant",
    /// appended by the account public key bytes,
    /// appended by the sha256 digest of the image.
    pub treasure_signature: String,
}

/// A request to claim a treasure.
#[derive(Clone, Debug, Serialize, Deserialize, Hash, Eq, PartialEq)]
pub struct ClaimRequest {
    /// The public key of the claiming account, bech32m encoded.
    pub account_public_key: String,
    /// The public key of the treasure, bech32m encoded.
    pub treasure_public_key: String,
    /// A base64-encoded signature by the account key of
    /// the string "claim",
    /// appended by the treasure public key bytes.
    pub account_signature: String,
    /// A base64-encoded signature by the treasure key of
    /// the string "claim",
    /// appended by the account public key bytes.
    pub treasure_signature: String,
}

/// Acknowledgement for an accepted plant.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlantResponse {
    /// Where the planted treasure can be viewed.
    pub return_url: String,
}

/// Acknowledgement for an accepted claim.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClaimResponse {
    pub message: String,
    pub return_url: String,
}

/// Query whether a treasure has been planted.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExistsRequest {
    pub treasure_public_key: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExistsResponse {
    pub treasure_exists: bool,
}

/// A server-generated treasure identity for out-of-band creation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateResponse {
    /// Renderable QR markup for the treasure's locator.
    pub qrcode: String,
    /// The treasure secret key, bech32m encoded.
    pub secret_key: String,
}
