//! The dual-signature plant and claim protocol.
//!
//! Every request carries two signatures. On plant, the treasure key signs
//! over the account public key and the image digest, and the account key
//! signs over the treasure public key; on claim, each side signs over the
//! other's public key. Binding each signature to the counterpart keeps a
//! captured signature from being replayed against a different pairing, and
//! binding the treasure's plant signature to the digest pins the planted
//! record to one image.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::digest::ImageDigest;
use crate::errors::{DecodeError, ProtocolError, VerifyError};
use crate::keys::{Identity, KeyRole, PublicKey, SecretKey, Signature};
use crate::request::{ClaimRequest, PlantRequest};

const PLANT_CONTEXT: &[u8] = b"plant";
const CLAIM_CONTEXT: &[u8] = b"claim";

/// With the treasure secret key, sign
///
/// - "plant", appended with
/// - the account public key, appended with
/// - the digest of the treasure image
pub fn sign_plant_for_treasure(
    treasure_secret: &SecretKey,
    account_public: &PublicKey,
    digest: &ImageDigest,
) -> Result<Signature, ProtocolError> {
    sign(treasure_secret, &plant_treasure_message(account_public, digest))
}

/// With the treasure public key, verify the plant signature.
pub fn verify_plant_for_treasure(
    treasure_public: &PublicKey,
    account_public: &PublicKey,
    digest: &ImageDigest,
    signature: &Signature,
) -> Result<(), VerifyError> {
    treasure_public.verify(&plant_treasure_message(account_public, digest), signature)
}

/// With the account secret key, sign
///
/// - "plant", appended with
/// - the treasure public key
pub fn sign_plant_for_account(
    account_secret: &SecretKey,
    treasure_public: &PublicKey,
) -> Result<Signature, ProtocolError> {
    sign(account_secret, &counterpart_message(PLANT_CONTEXT, treasure_public))
}

/// With the account public key, verify the plant signature.
pub fn verify_plant_for_account(
    account_public: &PublicKey,
    treasure_public: &PublicKey,
    signature: &Signature,
) -> Result<(), VerifyError> {
    account_public.verify(&counterpart_message(PLANT_CONTEXT, treasure_public), signature)
}

/// With the treasure secret key, sign
///
/// - "claim", appended with
/// - the account public key
pub fn sign_claim_for_treasure(
    treasure_secret: &SecretKey,
    account_public: &PublicKey,
) -> Result<Signature, ProtocolError> {
    sign(treasure_secret, &counterpart_message(CLAIM_CONTEXT, account_public))
}

/// With the treasure public key, verify the claim signature.
pub fn verify_claim_for_treasure(
    treasure_public: &PublicKey,
    account_public: &PublicKey,
    signature: &Signature,
) -> Result<(), VerifyError> {
    treasure_public.verify(&counterpart_message(CLAIM_CONTEXT, account_public), signature)
}

/// With the account secret key, sign
///
/// - "claim", appended with
/// - the treasure public key
pub fn sign_claim_for_account(
    account_secret: &SecretKey,
    treasure_public: &PublicKey,
) -> Result<Signature, ProtocolError> {
    sign(account_secret, &counterpart_message(CLAIM_CONTEXT, treasure_public))
}

/// With the account public key, verify the claim signature.
pub fn verify_claim_for_account(
    account_public: &PublicKey,
    treasure_public: &PublicKey,
    signature: &Signature,
) -> Result<(), VerifyError> {
    account_public.verify(&counterpart_message(CLAIM_CONTEXT, treasure_public), signature)
}

/// UI-gating predicate for planting. The builder re-validates independently.
pub fn ready_to_plant(account: &Identity, treasure: &Identity, image: Option<&[u8]>) -> bool {
    account.is_populated() && treasure.is_populated() && image.is_some()
}

/// UI-gating predicate for claiming. The builder re-validates independently.
pub fn ready_to_claim(account: &Identity, treasure: &Identity) -> bool {
    account.is_populated() && treasure.is_populated()
}

/// Assemble a plant request from the two identities and the image.
///
/// Preconditions are checked before any cryptographic work, and a signing
/// failure abandons the request whole; no partial request is ever returned.
pub fn build_plant_request(
    account: &Identity,
    treasure: &Identity,
    image: Option<&[u8]>,
) -> Result<PlantRequest, ProtocolError> {
    let account = account
        .keypair()
        .ok_or(ProtocolError::MissingAccountIdentity)?;
    let treasure = treasure
        .keypair()
        .ok_or(ProtocolError::MissingTreasureIdentity)?;
    let image = image.ok_or(ProtocolError::MissingImage)?;

    let digest = ImageDigest::of(image);
    let treasure_signature = sign_plant_for_treasure(treasure.secret(), account.public(), &digest)?;
    let account_signature = sign_plant_for_account(account.secret(), treasure.public())?;

    Ok(PlantRequest {
        account_public_key: account.public().encode(),
        treasure_public_key: treasure.public().encode(),
        image: BASE64.encode(image),
        account_signature: account_signature.encode(),
        treasure_signature: treasure_signature.encode(),
    })
}

/// Assemble a claim request from the two identities.
pub fn build_claim_request(
    account: &Identity,
    treasure: &Identity,
) -> Result<ClaimRequest, ProtocolError> {
    let account = account
        .keypair()
        .ok_or(ProtocolError::MissingAccountIdentity)?;
    let treasure = treasure
        .keypair()
        .ok_or(ProtocolError::MissingTreasureIdentity)?;

    let treasure_signature = sign_claim_for_treasure(treasure.secret(), account.public())?;
    let account_signature = sign_claim_for_account(account.secret(), treasure.public())?;

    Ok(ClaimRequest {
        account_public_key: account.public().encode(),
        treasure_public_key: treasure.public().encode(),
        account_signature: account_signature.encode(),
        treasure_signature: treasure_signature.encode(),
    })
}

/// Verify both signatures of an assembled plant request.
///
/// Recomputes the image digest from the request body, the way the backend
/// does on receipt.
pub fn verify_plant_request(request: &PlantRequest) -> Result<(), VerifyError> {
    let account_public = PublicKey::decode(KeyRole::Account, &request.account_public_key)?;
    let treasure_public = PublicKey::decode(KeyRole::Treasure, &request.treasure_public_key)?;
    let account_signature = Signature::decode(&request.account_signature)?;
    let treasure_signature = Signature::decode(&request.treasure_signature)?;
    let image = BASE64
        .decode(&request.image)
        .map_err(DecodeError::ImageEncoding)?;

    let digest = ImageDigest::of(&image);
    verify_plant_for_treasure(&treasure_public, &account_public, &digest, &treasure_signature)?;
    verify_plant_for_account(&account_public, &treasure_public, &account_signature)?;
    Ok(())
}

/// Verify both signatures of an assembled claim request.
pub fn verify_claim_request(request: &ClaimRequest) -> Result<(), VerifyError> {
    let account_public = PublicKey::decode(KeyRole::Account, &request.account_public_key)?;
    let treasure_public = PublicKey::decode(KeyRole::Treasure, &request.treasure_public_key)?;
    let account_signature = Signature::decode(&request.account_signature)?;
    let treasure_signature = Signature::decode(&request.treasure_signature)?;

    verify_claim_for_treasure(&treasure_public, &account_public, &treasure_signature)?;
    verify_claim_for_account(&account_public, &treasure_public, &account_signature)?;
    Ok(())
}

fn plant_treasure_message(account_public: &PublicKey, digest: &ImageDigest) -> Vec<u8> {
    let mut message = Vec::from(PLANT_CONTEXT);
    message.extend_from_slice(&account_public.to_bytes());
    message.extend_from_slice(digest.as_bytes());
    message
}

fn counterpart_message(context: &[u8], counterpart: &PublicKey) -> Vec<u8> {
    let mut message = Vec::from(context);
    message.extend_from_slice(&counterpart.to_bytes());
    message
}

fn sign(secret: &SecretKey, message: &[u8]) -> Result<Signature, ProtocolError> {
    secret
        .sign(message)
        .map_err(|e| ProtocolError::Signing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Keypair;

    fn identities() -> (Identity, Identity) {
        (
            Identity::from_keypair(Keypair::generate(KeyRole::Account)),
            Identity::from_keypair(Keypair::generate(KeyRole::Treasure)),
        )
    }

    #[test]
    fn plant_request_verifies() {
        let (account, treasure) = identities();
        let request = build_plant_request(&account, &treasure, Some(b"image bytes")).unwrap();
        verify_plant_request(&request).unwrap();
    }

    #[test]
    fn claim_request_verifies() {
        let (account, treasure) = identities();
        let request = build_claim_request(&account, &treasure).unwrap();
        verify_claim_request(&request).unwrap();
    }

    #[test]
    fn plant_requires_both_identities_and_image() {
        let (account, treasure) = identities();

        let err = build_plant_request(&Identity::empty(), &treasure, Some(b"i")).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingAccountIdentity));
        assert!(err.is_precondition());

        let err = build_plant_request(&account, &Identity::empty(), Some(b"i")).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingTreasureIdentity));

        let err = build_plant_request(&account, &treasure, None).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingImage));
    }

    #[test]
    fn claim_requires_both_identities() {
        let (account, treasure) = identities();
        assert!(build_claim_request(&Identity::empty(), &treasure).is_err());
        assert!(build_claim_request(&account, &Identity::empty()).is_err());
        assert!(build_claim_request(&account, &treasure).is_ok());
    }

    #[test]
    fn readiness_mirrors_preconditions() {
        let (account, treasure) = identities();
        assert!(ready_to_plant(&account, &treasure, Some(b"i")));
        assert!(!ready_to_plant(&account, &treasure, None));
        assert!(!ready_to_plant(&Identity::empty(), &treasure, Some(b"i")));
        assert!(ready_to_claim(&account, &treasure));
        assert!(!ready_to_claim(&account, &Identity::empty()));
    }

    #[test]
    fn treasure_signature_binds_the_image() {
        let (account, treasure) = identities();
        let one = build_plant_request(&account, &treasure, Some(b"first image")).unwrap();
        let two = build_plant_request(&account, &treasure, Some(b"second image")).unwrap();

        // Treasure signature covers the digest; account signature does not.
        assert_ne!(one.treasure_signature, two.treasure_signature);
        assert_eq!(one.account_signature, two.account_signature);
    }

    #[test]
    fn signatures_bind_the_pairing() {
        let (account, treasure) = identities();
        let (other_account, other_treasure) = identities();

        let mut request = build_claim_request(&account, &treasure).unwrap();
        request.account_public_key = other_account.public_key().unwrap().encode();
        assert!(verify_claim_request(&request).is_err());

        let mut request = build_claim_request(&account, &treasure).unwrap();
        request.treasure_public_key = other_treasure.public_key().unwrap().encode();
        assert!(verify_claim_request(&request).is_err());
    }

    #[test]
    fn tampered_image_fails_verification() {
        let (account, treasure) = identities();
        let mut request = build_plant_request(&account, &treasure, Some(b"image")).unwrap();
        request.image = BASE64.encode(b"different image");
        assert!(verify_plant_request(&request).is_err());
    }

    #[test]
    fn plant_and_claim_signatures_are_not_interchangeable() {
        let (account, treasure) = identities();
        let claim = build_claim_request(&account, &treasure).unwrap();
        let plant = build_plant_request(&account, &treasure, Some(b"image")).unwrap();

        // Same signer, same counterpart key, different context string.
        assert_ne!(claim.account_signature, plant.account_signature);
    }
}
