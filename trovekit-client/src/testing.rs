//! Test doubles for exercising scan sessions without a camera.
//!
//! `MockDecoder` stands in for the camera/decoder boundary and counts its
//! lifecycle calls through a shared probe, so tests can assert that the
//! session released the resource exactly once and in the right order.

use std::sync::{Arc, Mutex};

use crate::errors::ResourceError;
use crate::scan::FrameDecoder;

#[derive(Debug, Default)]
struct Counts {
    started: u32,
    stopped: u32,
    destroyed: u32,
}

/// Shared view of a mock decoder's lifecycle counters.
#[derive(Clone, Default)]
pub struct SharedProbe(Arc<Mutex<Counts>>);

impl SharedProbe {
    pub fn starts(&self) -> u32 {
        self.0.lock().unwrap().started
    }

    pub fn stops(&self) -> u32 {
        self.0.lock().unwrap().stopped
    }

    pub fn destroys(&self) -> u32 {
        self.0.lock().unwrap().destroyed
    }

    /// Assert the decoder was stopped and destroyed exactly once each.
    pub fn assert_released_once(&self) {
        let counts = self.0.lock().unwrap();
        assert_eq!(counts.stopped, 1, "stop calls");
        assert_eq!(counts.destroyed, 1, "destroy calls");
    }
}

/// A scripted decoder: counts lifecycle calls, optionally fails to start.
pub struct MockDecoder {
    probe: SharedProbe,
    fail_start: Option<String>,
}

impl MockDecoder {
    /// A decoder that starts successfully.
    pub fn new() -> (Self, SharedProbe) {
        let probe = SharedProbe::default();
        (
            Self {
                probe: probe.clone(),
                fail_start: None,
            },
            probe,
        )
    }

    /// A decoder whose `start` fails with the given reason.
    pub fn failing(reason: &str) -> (Self, SharedProbe) {
        let probe = SharedProbe::default();
        (
            Self {
                probe: probe.clone(),
                fail_start: Some(reason.to_string()),
            },
            probe,
        )
    }
}

impl FrameDecoder for MockDecoder {
    fn start(&mut self) -> Result<(), ResourceError> {
        self.probe.0.lock().unwrap().started += 1;
        match &self.fail_start {
            Some(reason) => Err(ResourceError(reason.clone())),
            None => Ok(()),
        }
    }

    fn stop(&mut self) {
        self.probe.0.lock().unwrap().stopped += 1;
    }

    fn destroy(&mut self) {
        self.probe.0.lock().unwrap().destroyed += 1;
    }
}
