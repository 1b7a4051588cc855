//! # skarv-telemetry
//!
//! Logging setup for the skarv tools.

pub mod logging;
