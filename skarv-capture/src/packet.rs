//! Value types produced by a capture source.

use std::time::SystemTime;

use bytes::Bytes;
use pcap::Linktype;

/// One captured frame, deep-copied out of the capture buffer.
///
/// Immutable after creation: the capture thread builds it once and hands
/// ownership down the queue → dispatcher → worker chain.
#[derive(Clone, Debug)]
pub struct RawPacket {
    /// Capture timestamp from the pcap header.
    pub timestamp: SystemTime,

    /// On-wire frame length; can exceed `data.len()` when the snaplen
    /// truncated the capture.
    pub frame_len: usize,

    /// Captured bytes.
    pub data: Bytes,

    /// Link-layer type of the capturing device.
    pub link_type: Linktype,
}

impl RawPacket {
    /// Number of bytes actually captured.
    #[inline]
    pub fn captured_len(&self) -> usize {
        self.data.len()
    }
}

/// A capture device as reported by the platform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub description: String,
}
