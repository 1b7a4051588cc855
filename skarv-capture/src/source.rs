//! The seam between the pipeline controller and whatever produces packets.

use crate::error::CaptureError;
use crate::packet::{DeviceInfo, RawPacket};

/// Callback invoked once per captured packet.
///
/// Runs on the source's own thread; implementations of [`PacketSource`]
/// may call it concurrently with any controller operation, so it must be
/// `Send + Sync` and must not block for long.
pub type PacketHandler = Box<dyn Fn(RawPacket) + Send + Sync + 'static>;

/// An asynchronous packet producer.
///
/// A source is started with a device name and a handler; it then delivers
/// packets on its own thread until [`stop`](PacketSource::stop) is called.
/// Implemented by [`LiveCapture`](crate::LiveCapture) for real interfaces
/// and by in-memory fakes in tests.
pub trait PacketSource: Send + Sync {
    /// Lists devices available for capture.
    fn devices(&self) -> Result<Vec<DeviceInfo>, CaptureError>;

    /// Starts delivering packets from `device` to `handler`.
    ///
    /// Fails without side effects: when an error is returned no capture
    /// thread is running and no handler invocation will ever happen.
    fn start(&self, device: &str, handler: PacketHandler) -> Result<(), CaptureError>;

    /// Stops delivery and waits for the producing thread to exit.
    /// Safe to call repeatedly and while already stopped.
    fn stop(&self);

    /// Total packets delivered to handlers since this source was created.
    /// Monotonic; never reset by `stop`.
    fn captured_count(&self) -> u64;
}
