//! Live packet capture backed by the pcap crate.
//!
//! Opens the requested interface in promiscuous mode and reads frames on a
//! dedicated thread until told to stop. Each frame is deep-copied into a
//! [`RawPacket`] and handed to the caller-supplied handler; the pcap read
//! timeout keeps the loop responsive to the terminate flag even on an idle
//! network.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, UNIX_EPOCH};

use bytes::Bytes;
use parking_lot::Mutex;
use pcap::{Active, Capture, Device};
use tracing::{debug, error, warn};

use crate::error::CaptureError;
use crate::packet::{DeviceInfo, RawPacket};
use crate::source::{PacketHandler, PacketSource};

const SNAPLEN: i32 = 65_535;
const READ_TIMEOUT_MS: i32 = 1_000;

/// pcap-backed [`PacketSource`].
///
/// One capture session at a time; a second `start` while a session is
/// active fails with [`CaptureError::AlreadyCapturing`]. The delivered-packet
/// counter spans all sessions of this instance.
pub struct LiveCapture {
    terminate: Arc<AtomicBool>,
    captured: Arc<AtomicU64>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl LiveCapture {
    pub fn new() -> Self {
        Self {
            terminate: Arc::new(AtomicBool::new(false)),
            captured: Arc::new(AtomicU64::new(0)),
            thread: Mutex::new(None),
        }
    }
}

impl Default for LiveCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketSource for LiveCapture {
    fn devices(&self) -> Result<Vec<DeviceInfo>, CaptureError> {
        let devices = Device::list()?
            .into_iter()
            .map(|d| DeviceInfo {
                name: d.name,
                description: d.desc.unwrap_or_default(),
            })
            .collect();
        Ok(devices)
    }

    fn start(&self, device: &str, handler: PacketHandler) -> Result<(), CaptureError> {
        let mut slot = self.thread.lock();
        if slot.is_some() {
            return Err(CaptureError::AlreadyCapturing);
        }

        let selected = Device::list()?
            .into_iter()
            .find(|d| d.name == device)
            .ok_or_else(|| CaptureError::DeviceNotFound(device.to_string()))?;

        // Open synchronously so a missing or busy device fails the call
        // instead of a thread that nobody is watching.
        let capture = Capture::from_device(selected)?
            .promisc(true)
            .snaplen(SNAPLEN)
            .timeout(READ_TIMEOUT_MS)
            .open()?;

        self.terminate.store(false, Ordering::SeqCst);

        let terminate = Arc::clone(&self.terminate);
        let captured = Arc::clone(&self.captured);
        let handle = thread::Builder::new()
            .name("skarv-capture".into())
            .spawn(move || capture_loop(capture, terminate, captured, handler))?;

        *slot = Some(handle);
        debug!(device, "capture session started");
        Ok(())
    }

    fn stop(&self) {
        self.terminate.store(true, Ordering::SeqCst);
        if let Some(handle) = self.thread.lock().take() {
            if handle.join().is_err() {
                warn!("capture thread panicked before exit");
            }
        }
    }

    fn captured_count(&self) -> u64 {
        self.captured.load(Ordering::Relaxed)
    }
}

fn capture_loop(
    mut capture: Capture<Active>,
    terminate: Arc<AtomicBool>,
    captured: Arc<AtomicU64>,
    handler: PacketHandler,
) {
    let link_type = capture.get_datalink();
    debug!("capture thread started");

    while !terminate.load(Ordering::SeqCst) {
        match capture.next_packet() {
            Ok(frame) => {
                let ts = frame.header.ts;
                let timestamp = UNIX_EPOCH
                    + Duration::from_secs(ts.tv_sec as u64)
                    + Duration::from_micros(ts.tv_usec as u64);

                let raw = RawPacket {
                    timestamp,
                    frame_len: frame.header.len as usize,
                    data: Bytes::copy_from_slice(frame.data),
                    link_type,
                };

                captured.fetch_add(1, Ordering::Relaxed);
                handler(raw);
            }
            // Idle interface; re-check the terminate flag.
            Err(pcap::Error::TimeoutExpired) => continue,
            Err(e) => {
                error!("capture read failed: {e}");
                break;
            }
        }
    }

    debug!("capture thread exiting");
}
