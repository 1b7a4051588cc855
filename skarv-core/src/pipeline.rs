//! Pipeline controller: capture -> raw queue -> dispatcher -> pool -> store.
//!
//! One controller owns one raw-packet queue, one worker pool (replaced
//! wholesale after each shutdown), and exactly one dispatcher thread while
//! running. `start`, `stop` and `restart` serialize on a single control
//! mutex; store reads are never blocked by control calls.
//!
//! Shutdown is deterministic: stop the source (no new packets), push the
//! `None` pill, join the dispatcher (every queued packet is now submitted),
//! shut the pool down (every submitted task has run). Nothing handed to a
//! worker is lost across a stop.
//!
//! Store identifiers reflect the order workers finish, not capture order;
//! with parallel workers those can differ. Capture order is still preserved
//! end-to-end through the raw queue and task submission (FIFO per stage).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use skarv_capture::{CaptureError, DeviceInfo, PacketSource, RawPacket};

use crate::error::PipelineError;
use crate::pool::WorkerPool;
use crate::queue::BlockingQueue;
use crate::store::{PacketStore, ParsedPacket};

/// The transformation collaborator.
///
/// Must be pure and thread-safe: workers call it concurrently on the same
/// instance with no coordination.
pub trait Processor: Send + Sync {
    fn process(&self, raw: &RawPacket) -> ParsedPacket;
}

/// State guarded by the control mutex.
struct Control {
    pool: Arc<WorkerPool>,
    dispatcher: Option<JoinHandle<()>>,
    device: Option<String>,
}

/// Lifecycle controller for one capture pipeline.
pub struct Pipeline<S: PacketSource, P: Processor> {
    source: S,
    processor: Arc<P>,
    store: Arc<PacketStore>,
    /// `None` is the dispatcher's poison pill.
    raw_queue: Arc<BlockingQueue<Option<RawPacket>>>,
    running: AtomicBool,
    worker_count: usize,
    control: Mutex<Control>,
}

impl<S, P> Pipeline<S, P>
where
    S: PacketSource,
    P: Processor + 'static,
{
    pub fn new(source: S, processor: P, worker_count: usize) -> Self {
        Self {
            source,
            processor: Arc::new(processor),
            store: Arc::new(PacketStore::new()),
            raw_queue: Arc::new(BlockingQueue::new()),
            running: AtomicBool::new(false),
            worker_count,
            control: Mutex::new(Control {
                pool: Arc::new(WorkerPool::new(worker_count)),
                dispatcher: None,
                device: None,
            }),
        }
    }

    /// Starts (or resumes) capture on `device`.
    ///
    /// Packets already in the store are preserved. Fails fast when the
    /// pipeline is running; fails with no partial state when the source
    /// cannot start.
    pub fn start(&self, device: &str) -> Result<(), PipelineError> {
        let mut ctl = self.control.lock();

        if self.running.load(Ordering::SeqCst) {
            warn!("start requested while already running");
            return Err(PipelineError::AlreadyRunning);
        }

        // The previous stop shut the pool down; pools are not restartable.
        if ctl.pool.is_stopped() {
            debug!("recreating worker pool");
            ctl.pool = Arc::new(WorkerPool::new(self.worker_count));
        }

        let queue = Arc::clone(&self.raw_queue);
        self.source
            .start(device, Box::new(move |raw| queue.push(Some(raw))))?;

        ctl.device = Some(device.to_string());
        self.spawn_dispatcher(&mut ctl)?;

        self.running.store(true, Ordering::SeqCst);
        info!(device, "pipeline started");
        Ok(())
    }

    /// Stops if needed, wipes the store and any stale raw packets, and
    /// starts a fresh session on the remembered device.
    pub fn restart(&self) -> Result<(), PipelineError> {
        let mut ctl = self.control.lock();

        let device = ctl
            .device
            .clone()
            .ok_or(PipelineError::NoDeviceSelected)?;
        info!(device = %device, "restarting pipeline");

        if self.running.load(Ordering::SeqCst) {
            self.shutdown_locked(&mut ctl);
        }

        // Writers are quiesced at this point, so the wipe cannot race an
        // in-flight add.
        self.store.clear();
        self.raw_queue.clear();
        ctl.pool = Arc::new(WorkerPool::new(self.worker_count));

        let queue = Arc::clone(&self.raw_queue);
        self.source
            .start(&device, Box::new(move |raw| queue.push(Some(raw))))?;

        self.spawn_dispatcher(&mut ctl)?;
        self.running.store(true, Ordering::SeqCst);
        info!("pipeline restarted");
        Ok(())
    }

    fn spawn_dispatcher(&self, ctl: &mut Control) -> Result<(), PipelineError> {
        let queue = Arc::clone(&self.raw_queue);
        let pool = Arc::clone(&ctl.pool);
        let processor = Arc::clone(&self.processor);
        let store = Arc::clone(&self.store);

        let spawned = thread::Builder::new()
            .name("skarv-dispatch".into())
            .spawn(move || dispatch_loop(&queue, &pool, processor, store));

        match spawned {
            Ok(handle) => {
                ctl.dispatcher = Some(handle);
                Ok(())
            }
            Err(e) => {
                // The source already started; take it back down so a failed
                // call leaves nothing running.
                self.source.stop();
                Err(PipelineError::Io(e))
            }
        }
    }
}

impl<S: PacketSource, P: Processor> Pipeline<S, P> {
    /// Stops capture and drains everything in flight. No-op when not
    /// running. Stored packets survive; a later `start` resumes.
    pub fn stop(&self) {
        let mut ctl = self.control.lock();
        if !self.running.load(Ordering::SeqCst) {
            return;
        }
        info!("stopping pipeline");
        self.shutdown_locked(&mut ctl);
        info!("pipeline stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Devices available for capture, straight from the source.
    pub fn devices(&self) -> Result<Vec<DeviceInfo>, CaptureError> {
        self.source.devices()
    }

    /// Raw-queue depth. Advisory, diagnostics only.
    pub fn queue_depth(&self) -> usize {
        self.raw_queue.len()
    }

    /// Packets delivered by the source since this pipeline was created.
    pub fn captured_count(&self) -> u64 {
        self.source.captured_count()
    }

    /// Packets processed and stored in the current session.
    pub fn processed_count(&self) -> usize {
        self.store.count()
    }

    /// Shared handle to the store. Readers keep working across `stop` and
    /// while writers are active.
    pub fn store(&self) -> Arc<PacketStore> {
        Arc::clone(&self.store)
    }

    /// Ordered teardown; caller holds the control lock.
    fn shutdown_locked(&self, ctl: &mut Control) {
        // 1. No new raw packets.
        self.source.stop();
        // 2. Pill goes in after the last real packet.
        self.raw_queue.push(None);
        // 3. Dispatcher exits only after submitting everything before the
        //    pill to the pool.
        if let Some(handle) = ctl.dispatcher.take() {
            if handle.join().is_err() {
                warn!("dispatcher thread panicked before exit");
            }
        }
        // 4. Pool drains every submitted task before its workers exit.
        ctl.pool.shutdown();
        self.running.store(false, Ordering::SeqCst);
    }
}

impl<S: PacketSource, P: Processor> Drop for Pipeline<S, P> {
    fn drop(&mut self) {
        let mut ctl = self.control.lock();
        if self.running.load(Ordering::SeqCst) {
            self.shutdown_locked(&mut ctl);
        }
    }
}

/// Bridges the raw queue to the pool: one task per packet, in pop order.
fn dispatch_loop<P: Processor + 'static>(
    queue: &BlockingQueue<Option<RawPacket>>,
    pool: &WorkerPool,
    processor: Arc<P>,
    store: Arc<PacketStore>,
) {
    debug!("dispatcher thread started");
    while let Some(raw) = queue.pop() {
        let processor = Arc::clone(&processor);
        let store = Arc::clone(&store);
        pool.submit(move || {
            let parsed = processor.process(&raw);
            store.add_packet(parsed);
        });
    }
    debug!("dispatcher thread exiting");
}
