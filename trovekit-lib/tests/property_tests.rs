//! Property-based tests for the key codec and locator round trips.

use proptest::prelude::*;

use trovekit_lib::locator;
use trovekit_lib::{KeyRole, SecretKey};

proptest! {
    /// Any secret key survives the encode/decode round trip unchanged.
    #[test]
    fn secret_key_round_trip(bytes in any::<[u8; 32]>()) {
        for role in [KeyRole::Account, KeyRole::Treasure] {
            let secret = SecretKey::from_bytes(role, bytes);
            let decoded = SecretKey::decode(role, &secret.encode()).unwrap();
            prop_assert_eq!(decoded.to_bytes(), secret.to_bytes());
        }
    }

    /// Decoding a locator is the left inverse of building one, and yields
    /// exactly the derived public key.
    #[test]
    fn locator_round_trip(bytes in any::<[u8; 32]>()) {
        let secret = SecretKey::from_bytes(KeyRole::Treasure, bytes);

        for url in [locator::plant_url(&secret), locator::claim_url(&secret)] {
            let decoded = locator::decode_locator(KeyRole::Treasure, &url).unwrap();
            prop_assert_eq!(decoded.keypair().secret().to_bytes(), secret.to_bytes());
            prop_assert_eq!(decoded.keypair().public(), &secret.public_key());
        }
    }

    /// Every locator the builders produce passes the syntactic pre-filter.
    #[test]
    fn built_locators_pass_sanity_check(bytes in any::<[u8; 32]>()) {
        let secret = SecretKey::from_bytes(KeyRole::Treasure, bytes);
        prop_assert!(locator::sanity_check(&locator::plant_url(&secret)));
        prop_assert!(locator::sanity_check(&locator::claim_url(&secret)));
    }

    /// Derivation is deterministic for any key bytes.
    #[test]
    fn derivation_is_deterministic(bytes in any::<[u8; 32]>()) {
        let secret = SecretKey::from_bytes(KeyRole::Account, bytes);
        prop_assert_eq!(secret.public_key(), secret.public_key());
    }

    /// Arbitrary garbage never decodes and never panics.
    #[test]
    fn garbage_never_decodes_to_a_key(garbage in "[ -~]{0,80}") {
        // Printable ASCII that is not a bech32m key under our HRPs.
        prop_assume!(!garbage.starts_with("tas1") && !garbage.starts_with("tts1"));
        prop_assert!(SecretKey::decode(KeyRole::Account, &garbage).is_err());
        prop_assert!(SecretKey::decode(KeyRole::Treasure, &garbage).is_err());
    }
}
