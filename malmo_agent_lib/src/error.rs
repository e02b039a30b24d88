//! Error types for mission startup and world-state synchronisation.

use std::time::Duration;
use thiserror::Error;

/// A mission start request the platform refused. Eligible for retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("mission start failed: {0}")]
pub struct StartError(pub String);

/// Startup could not get the mission going.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("gave up starting mission after {attempts} attempt(s): {last}")]
    RetriesExhausted { attempts: u32, last: StartError },
}

/// Poll loop that was waiting when a timeout fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPhase {
    MissionBegin,
    InitialObservation,
    InitialFrame,
    StepObservation,
    StepFrame,
}

impl std::fmt::Display for WaitPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WaitPhase::MissionBegin => "mission begin",
            WaitPhase::InitialObservation => "initial observation",
            WaitPhase::InitialFrame => "initial frame",
            WaitPhase::StepObservation => "step observation",
            WaitPhase::StepFrame => "step frame",
        };
        f.write_str(name)
    }
}

/// Failures while synchronising with the platform's world state.
///
/// Everything except `Timeout` is an invariant violation: the platform
/// behaved inconsistently with what polling had already shown.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("timed out after {waited:?} waiting for {phase}")]
    Timeout { phase: WaitPhase, waited: Duration },

    #[error("no video frames in a running mission's consumed world state")]
    NoVideoFrames,

    #[error("fewer frames after consuming read: {before} seen by peek, {after} consumed")]
    FrameCountRegressed { before: usize, after: usize },

    #[error("no observation in a running mission's consumed world state")]
    NoObservation,

    #[error("malformed observation payload: {0}")]
    MalformedObservation(#[from] serde_json::Error),

    #[error("frame output failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid video frame: {0}")]
    InvalidFrame(String),
}

impl SyncError {
    /// Timeouts are recoverable; everything else means the run cannot continue.
    pub fn is_timeout(&self) -> bool {
        matches!(self, SyncError::Timeout { .. })
    }
}

/// Result type for synchronisation routines.
pub type SyncResult<T> = std::result::Result<T, SyncError>;

/// Anything that stops a mission run before its natural end.
#[derive(Error, Debug)]
pub enum MissionError {
    #[error(transparent)]
    Startup(#[from] StartupError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}
