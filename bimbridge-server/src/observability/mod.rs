//! Observability subsystem for bimbridge
//!
//! Provides metrics and the Prometheus snapshot types.

pub mod metrics;

pub use metrics::{GaugeSnapshot, Metrics};
