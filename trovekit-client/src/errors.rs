//! Error types for client-side operations.

use thiserror::Error;

use trovekit_lib::KeyRole;

use crate::scan::ScanState;

/// The camera or frame decoder could not be acquired.
///
/// Surfaced to the caller so scanning controls can be disabled; manual entry
/// remains available.
#[derive(Debug, Error)]
#[error("decoder unavailable: {0}")]
pub struct ResourceError(pub String);

/// Scan-session state machine violations and resource failures.
#[derive(Debug, Error)]
pub enum ScanError {
    /// `start` was called on a session that already left `Idle`.
    #[error("session cannot start from {state:?}")]
    NotIdle { state: ScanState },

    /// `cancel` was called on a session that is not `Scanning`.
    #[error("session cannot cancel from {state:?}")]
    NotScanning { state: ScanState },

    /// Another session for the same role holds the camera.
    #[error("a scan is already running for the {role} identity")]
    RoleBusy { role: KeyRole },

    /// The decoder failed to start.
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

/// Backend transport and response failures.
///
/// Never retried automatically; the caller surfaces the failure and
/// re-enables its controls.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The request never completed.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The backend rejected the request with a non-success status.
    #[error("{url} returned status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// A success status carrying a body that would not parse.
    #[error("malformed response from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}
