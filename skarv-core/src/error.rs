use thiserror::Error;

use skarv_capture::CaptureError;

/// Failures of pipeline control operations.
///
/// All variants leave the state machine consistent: a failed `start` or
/// `restart` never leaves a dispatcher or capture thread behind.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("pipeline is already running")]
    AlreadyRunning,

    #[error("no capture device selected; start the pipeline first")]
    NoDeviceSelected,

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("failed to spawn dispatcher thread: {0}")]
    Io(#[from] std::io::Error),
}
