//! The two process-wide identity slots and their update paths.
//!
//! One slot per role: the account doing the planting/claiming, and the
//! treasure being planted or claimed. A slot's identity is replaced as a
//! single unit, so subscribers can never observe a public key that was not
//! derived from the stored secret key, and each replacement notifies
//! subscribers exactly once.
//!
//! Three producers feed a slot: manual text entry, a completed scan session,
//! and a page-load locator. Manual entry and URL loads invalidate any scan
//! commit still in flight for the role by bumping the slot's generation; a
//! scan commit carrying a stale generation is discarded, never applied.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use trovekit_lib::locator;
use trovekit_lib::{DecodeError, Identity, KeyRole, Keypair, PublicKey, SecretKey};

/// What subscribers see on every slot update.
#[derive(Clone, Debug, Default)]
pub struct IdentitySnapshot {
    /// The slot's identity, fully populated or fully absent.
    pub identity: Identity,
    /// Normalized claim locator for the current key, when one is known.
    pub claim_url: Option<String>,
}

/// One role's identity slot.
pub(crate) struct Slot {
    role: KeyRole,
    tx: watch::Sender<IdentitySnapshot>,
    scanning: AtomicBool,
    generation: AtomicU64,
}

impl Slot {
    fn new(role: KeyRole) -> Self {
        let (tx, _rx) = watch::channel(IdentitySnapshot::default());
        Self {
            role,
            tx,
            scanning: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    /// Take the exclusive scan claim for this role. False if already held.
    pub(crate) fn claim_scan(&self) -> bool {
        self.scanning
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub(crate) fn release_scan(&self) {
        self.scanning.store(false, Ordering::SeqCst);
    }

    pub(crate) fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::SeqCst)
    }

    /// Start a new writer epoch; outcomes from older epochs are discarded.
    pub(crate) fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Replace the identity unconditionally and notify subscribers once.
    pub(crate) fn publish(&self, identity: Identity, claim_url: Option<String>) {
        debug!(role = %self.role, populated = identity.is_populated(), "identity updated");
        self.tx.send_replace(IdentitySnapshot {
            identity,
            claim_url,
        });
    }

    /// Apply a scan outcome, unless a newer writer superseded it.
    pub(crate) fn commit_if_current(
        &self,
        generation: u64,
        keypair: Keypair,
        claim_url: String,
    ) -> bool {
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(role = %self.role, "stale scan commit discarded");
            return false;
        }
        self.publish(Identity::from_keypair(keypair), Some(claim_url));
        true
    }

    fn snapshot(&self) -> IdentitySnapshot {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<IdentitySnapshot> {
        self.tx.subscribe()
    }
}

/// Owns the current account and treasure identities.
pub struct IdentityManager {
    account: Arc<Slot>,
    treasure: Arc<Slot>,
}

impl IdentityManager {
    pub fn new() -> Self {
        Self {
            account: Arc::new(Slot::new(KeyRole::Account)),
            treasure: Arc::new(Slot::new(KeyRole::Treasure)),
        }
    }

    pub(crate) fn slot(&self, role: KeyRole) -> &Arc<Slot> {
        match role {
            KeyRole::Account => &self.account,
            KeyRole::Treasure => &self.treasure,
        }
    }

    /// Current identity for a role.
    pub fn identity(&self, role: KeyRole) -> Identity {
        self.slot(role).snapshot().identity
    }

    /// Current public key for a role, if the slot is populated.
    pub fn public_key(&self, role: KeyRole) -> Option<PublicKey> {
        self.identity(role).public_key().cloned()
    }

    /// Normalized claim locator for the role's current key, if known.
    pub fn claim_url(&self, role: KeyRole) -> Option<String> {
        self.slot(role).snapshot().claim_url
    }

    /// Subscribe to a role's updates. Receivers see every replacement.
    pub fn subscribe(&self, role: KeyRole) -> watch::Receiver<IdentitySnapshot> {
        self.slot(role).subscribe()
    }

    /// True while a scan session holds the camera for this role.
    pub fn scan_in_progress(&self, role: KeyRole) -> bool {
        self.slot(role).is_scanning()
    }

    /// Manual text entry: decode, derive, and replace the slot atomically.
    ///
    /// On decode failure the slot is cleared to fully absent and subscribers
    /// are notified of the cleared state. Either way, any scan commit still
    /// in flight for this role is superseded.
    pub fn set_secret_key(&self, role: KeyRole, text: &str) -> Result<PublicKey, DecodeError> {
        let slot = self.slot(role);
        slot.bump_generation();

        match SecretKey::decode(role, text.trim()) {
            Ok(secret) => {
                let claim_url =
                    (role == KeyRole::Treasure).then(|| locator::claim_url(&secret));
                let keypair = Keypair::from_secret(secret);
                let public = keypair.public().clone();
                slot.publish(Identity::from_keypair(keypair), claim_url);
                Ok(public)
            }
            Err(err) => {
                slot.publish(Identity::empty(), None);
                Err(err)
            }
        }
    }

    /// Generate a fresh random key for the role and store it.
    ///
    /// Returns the keypair so the caller can display the encoded secret.
    pub fn generate(&self, role: KeyRole) -> Keypair {
        let slot = self.slot(role);
        slot.bump_generation();

        let keypair = Keypair::generate(role);
        let claim_url = (role == KeyRole::Treasure).then(|| locator::claim_url(keypair.secret()));
        slot.publish(Identity::from_keypair(keypair.clone()), claim_url);
        keypair
    }

    /// Page-load path: decode a locator URL and commit it like a completed
    /// scan, without a camera resource.
    ///
    /// On failure nothing is mutated; the caller may retry with other input.
    pub fn load_from_url(&self, role: KeyRole, url: &str) -> Result<PublicKey, DecodeError> {
        let slot = self.slot(role);
        slot.bump_generation();

        let decoded = locator::decode_locator(role, url)?;
        let claim_url = decoded.claim_url().to_string();
        let keypair = decoded.into_keypair();
        let public = keypair.public().clone();
        slot.publish(Identity::from_keypair(keypair), Some(claim_url));
        Ok(public)
    }
}

impl Default for IdentityManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_entry_populates_the_slot() {
        let manager = IdentityManager::new();
        let secret = SecretKey::generate(KeyRole::Account);

        let public = manager
            .set_secret_key(KeyRole::Account, &secret.encode())
            .unwrap();
        assert_eq!(public, secret.public_key());
        assert_eq!(manager.public_key(KeyRole::Account), Some(public));
        // Account keys have no claim link.
        assert!(manager.claim_url(KeyRole::Account).is_none());
    }

    #[test]
    fn manual_entry_trims_whitespace() {
        let manager = IdentityManager::new();
        let secret = SecretKey::generate(KeyRole::Treasure);
        let text = format!("  {}\n", secret.encode());
        assert!(manager.set_secret_key(KeyRole::Treasure, &text).is_ok());
    }

    #[test]
    fn failed_entry_clears_the_slot() {
        let manager = IdentityManager::new();
        let secret = SecretKey::generate(KeyRole::Treasure);
        manager
            .set_secret_key(KeyRole::Treasure, &secret.encode())
            .unwrap();

        assert!(manager
            .set_secret_key(KeyRole::Treasure, "not-a-key")
            .is_err());
        assert!(!manager.identity(KeyRole::Treasure).is_populated());
        assert!(manager.claim_url(KeyRole::Treasure).is_none());
    }

    #[test]
    fn treasure_entry_records_the_claim_url() {
        let manager = IdentityManager::new();
        let secret = SecretKey::generate(KeyRole::Treasure);
        manager
            .set_secret_key(KeyRole::Treasure, &secret.encode())
            .unwrap();
        assert_eq!(
            manager.claim_url(KeyRole::Treasure),
            Some(locator::claim_url(&secret))
        );
    }

    #[test]
    fn subscribers_are_notified_once_per_update() {
        let manager = IdentityManager::new();
        let mut rx = manager.subscribe(KeyRole::Account);
        assert!(!rx.has_changed().unwrap());

        manager.generate(KeyRole::Account);
        assert!(rx.has_changed().unwrap());
        let snapshot = rx.borrow_and_update().clone();
        assert!(snapshot.identity.is_populated());
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn load_from_url_matches_the_scan_commit_path() {
        let manager = IdentityManager::new();
        let secret = SecretKey::generate(KeyRole::Treasure);
        let url = locator::plant_url(&secret);

        let public = manager.load_from_url(KeyRole::Treasure, &url).unwrap();
        assert_eq!(public, secret.public_key());
        assert_eq!(
            manager.claim_url(KeyRole::Treasure),
            Some(locator::claim_url(&secret))
        );
    }

    #[test]
    fn failed_url_load_mutates_nothing() {
        let manager = IdentityManager::new();
        let secret = SecretKey::generate(KeyRole::Treasure);
        manager
            .set_secret_key(KeyRole::Treasure, &secret.encode())
            .unwrap();

        assert!(manager
            .load_from_url(KeyRole::Treasure, "https://example.com/?key=x")
            .is_err());
        assert!(manager.identity(KeyRole::Treasure).is_populated());
    }

    #[test]
    fn stale_commit_is_discarded() {
        let manager = IdentityManager::new();
        let slot = manager.slot(KeyRole::Treasure);
        let generation = slot.bump_generation();

        // A newer writer arrives before the scan commit lands.
        manager.generate(KeyRole::Treasure);
        let late = Keypair::generate(KeyRole::Treasure);
        let claim_url = locator::claim_url(late.secret());
        assert!(!slot.commit_if_current(generation, late.clone(), claim_url));

        // The newer value is untouched.
        assert_ne!(
            manager.public_key(KeyRole::Treasure).unwrap(),
            late.public().clone()
        );
    }
}
