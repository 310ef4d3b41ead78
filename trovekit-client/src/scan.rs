//! The scan-session state machine.
//!
//! A session mediates between the camera/decoder (an untrusted source that
//! keeps producing frames asynchronously) and the identity slot it is meant
//! to fill. Frames arrive in any number and at any time, so the machine is
//! built around one ordering rule: the first frame that passes the syntactic
//! filter releases the camera *synchronously, before any further fallible
//! work*. After that point no second frame can race the commit, because the
//! session has already left `Scanning`.
//!
//! `Decoded` and `Cancelled` are terminal. A session is single-use; scan
//! again by constructing a new one.

use std::sync::Arc;

use tracing::{debug, warn};

use trovekit_lib::locator;
use trovekit_lib::{DecodeError, Identity, KeyRole, PublicKey};

use crate::errors::{ResourceError, ScanError};
use crate::identity::{IdentityManager, Slot};

/// External camera/decoder lifecycle.
///
/// The session calls `start` once when scanning begins, then `stop` followed
/// by `destroy` exactly once when it releases the camera: on the first
/// sanity-passing frame, on cancellation, or on drop. `stop` and `destroy`
/// must tolerate being called after a failed `start`.
///
/// Frame delivery is wired by the driver: whatever owns the decoder feeds
/// each decoded payload to [`ScanSession::on_frame_decoded`].
pub trait FrameDecoder {
    /// Acquire the camera and begin producing frames.
    fn start(&mut self) -> Result<(), ResourceError>;
    /// Stop producing frames.
    fn stop(&mut self);
    /// Tear the decoder down. Always the final call.
    fn destroy(&mut self);
}

/// Session lifecycle states. `Decoded` and `Cancelled` are terminal; a
/// decode failure after the camera was released lands in `Cancelled`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Scanning,
    Decoded,
    Cancelled,
}

/// What a single decoded frame did to the session.
#[derive(Debug)]
pub enum FrameOutcome {
    /// Failed the syntactic filter; the camera keeps running.
    Discarded,
    /// Key material committed to the target identity; the session is done.
    Committed { public_key: PublicKey },
    /// Passed the filter but the key would not decode. The camera was
    /// released before decoding began; the identity is untouched.
    Failed(DecodeError),
    /// Arrived after the session left `Scanning`, or its commit was
    /// superseded by a newer writer. Nothing happened.
    Ignored,
}

/// A single-use scan session for one identity role.
pub struct ScanSession {
    role: KeyRole,
    state: ScanState,
    decoder: Box<dyn FrameDecoder>,
    decoder_released: bool,
    slot: Arc<Slot>,
    generation: u64,
}

impl ScanSession {
    /// Create an idle session targeting `role`'s identity slot.
    pub fn new(manager: &IdentityManager, role: KeyRole, decoder: Box<dyn FrameDecoder>) -> Self {
        Self {
            role,
            state: ScanState::Idle,
            decoder,
            decoder_released: false,
            slot: Arc::clone(manager.slot(role)),
            generation: 0,
        }
    }

    pub fn role(&self) -> KeyRole {
        self.role
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Begin scanning. Valid only from `Idle`; rejected while another
    /// session is scanning the same role. Clears the slot's previous value.
    pub fn start(&mut self) -> Result<(), ScanError> {
        if self.state != ScanState::Idle {
            return Err(ScanError::NotIdle { state: self.state });
        }
        if !self.slot.claim_scan() {
            return Err(ScanError::RoleBusy { role: self.role });
        }

        self.generation = self.slot.bump_generation();
        self.slot.publish(Identity::empty(), None);

        if let Err(err) = self.decoder.start() {
            self.release_decoder();
            self.state = ScanState::Cancelled;
            return Err(ScanError::Resource(err));
        }

        self.state = ScanState::Scanning;
        debug!(role = %self.role, "scan started");
        Ok(())
    }

    /// Feed one decoded frame payload into the session.
    ///
    /// Called by the decoder driver, arbitrarily many times. Frames arriving
    /// after the session left `Scanning` are ignored.
    pub fn on_frame_decoded(&mut self, raw: &str) -> FrameOutcome {
        if self.state != ScanState::Scanning {
            return FrameOutcome::Ignored;
        }

        if !locator::sanity_check(raw) {
            debug!(role = %self.role, "frame failed sanity check, still scanning");
            return FrameOutcome::Discarded;
        }

        // Commitment point. Release the camera before the key-revealing
        // decode so no later frame can run against a session mid-update.
        self.release_decoder();

        match locator::decode_locator(self.role, raw) {
            Ok(decoded) => {
                let claim_url = decoded.claim_url().to_string();
                let keypair = decoded.into_keypair();
                let public_key = keypair.public().clone();

                if self.slot.commit_if_current(self.generation, keypair, claim_url) {
                    self.state = ScanState::Decoded;
                    debug!(role = %self.role, key = %public_key.abbrev(), "scan decoded");
                    FrameOutcome::Committed { public_key }
                } else {
                    // Cancelled or superseded while the frame was in flight.
                    self.state = ScanState::Cancelled;
                    FrameOutcome::Ignored
                }
            }
            Err(err) => {
                warn!(role = %self.role, error = %err, "scanned payload would not decode");
                self.state = ScanState::Cancelled;
                FrameOutcome::Failed(err)
            }
        }
    }

    /// Cancel the scan. Valid only from `Scanning`; releases the camera
    /// immediately and discards any outcome still in flight.
    pub fn cancel(&mut self) -> Result<(), ScanError> {
        if self.state != ScanState::Scanning {
            return Err(ScanError::NotScanning { state: self.state });
        }

        self.release_decoder();
        self.slot.bump_generation();
        self.state = ScanState::Cancelled;
        debug!(role = %self.role, "scan cancelled");
        Ok(())
    }

    /// Stop and destroy the decoder and drop the role claim. Idempotent.
    fn release_decoder(&mut self) {
        if self.decoder_released {
            return;
        }
        self.decoder.stop();
        self.decoder.destroy();
        self.decoder_released = true;
        self.slot.release_scan();
    }
}

impl Drop for ScanSession {
    // The camera must not outlive the session.
    fn drop(&mut self) {
        if self.state == ScanState::Scanning {
            self.release_decoder();
        }
    }
}
