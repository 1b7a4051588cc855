//! # skarv-core
//!
//! Concurrency core of the skarv capture pipeline: a generic blocking
//! queue, a fixed-size worker pool with poison-pill shutdown, a
//! reader/writer-locked packet store, and the pipeline controller that
//! wires them to a capture source.
//!
//! Data flow at steady state:
//!
//! ```text
//! capture thread -> raw queue -> dispatcher -> worker pool -> store <- readers
//! ```

pub mod error;
pub mod pipeline;
pub mod pool;
pub mod queue;
pub mod store;

pub use error::PipelineError;
pub use pipeline::{Pipeline, Processor};
pub use pool::WorkerPool;
pub use queue::BlockingQueue;
pub use store::{PacketStore, ParsedPacket, StoreError};
