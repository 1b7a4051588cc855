use thiserror::Error;

/// Errors surfaced when starting or driving a capture source.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture device '{0}' not found")]
    DeviceNotFound(String),

    #[error("capture already running")]
    AlreadyCapturing,

    #[error("pcap error: {0}")]
    Pcap(#[from] pcap::Error),

    #[error("failed to spawn capture thread: {0}")]
    Io(#[from] std::io::Error),
}
