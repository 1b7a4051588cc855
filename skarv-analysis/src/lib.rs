//! skarv-analysis
//!
//! Stateless decoding of captured frames into display-ready packets.
//! [`Analyzer`] is the pipeline's transformation collaborator: pure,
//! thread-safe, and total — arbitrary or truncated input degrades to a
//! generic data layer, never a panic.

pub mod analyzer;
pub mod decode;

pub use analyzer::Analyzer;
