//! Trovekit client core.
//!
//! Everything stateful on the client side of the plant/claim protocol: the
//! two identity slots (account and treasure) with change notification, the
//! scan-session state machine that fills them from camera frames, the manual
//! and page-load entry paths, and the HTTP backend boundary.
//!
//! The stateless protocol itself lives in `trovekit-lib`; the usual flow is
//! to fill both slots here, gate the UI on `protocol::ready_to_plant`, build
//! the request with `protocol::build_plant_request`, and hand it to a
//! [`Backend`].

pub mod backend;
pub mod errors;
pub mod identity;
pub mod scan;
pub mod testing;

pub use backend::{Backend, HttpBackend};
pub use errors::{NetworkError, ResourceError, ScanError};
pub use identity::{IdentityManager, IdentitySnapshot};
pub use scan::{FrameDecoder, FrameOutcome, ScanSession, ScanState};
