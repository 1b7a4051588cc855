//! skarv-capture
//!
//! Capture side of the skarv pipeline: raw packet value types, the
//! `PacketSource` seam the pipeline controller talks to, and a live
//! pcap-backed implementation of that seam.

pub mod error;
pub mod live;
pub mod packet;
pub mod source;

pub use error::CaptureError;
pub use live::LiveCapture;
pub use packet::{DeviceInfo, RawPacket};
pub use source::{PacketHandler, PacketSource};

// Link-layer tags come straight from pcap; re-exported so dependents do
// not need their own pcap dependency for type names.
pub use pcap::Linktype;
