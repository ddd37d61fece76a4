//! bimbridge-server: cross-thread command bridge for a single-threaded host
//!
//! Network handlers submit [`bimbridge_protocol::Operation`]s through a
//! [`bridge::BridgeClient`]; the host thread executes them one at a time
//! against the [`document::Document`] and replies through a oneshot channel.

pub mod bridge;
pub mod config;
pub mod document;
pub mod handlers;
pub mod http;
pub mod observability;
pub mod validation;

pub use bridge::{BridgeClient, BridgeConfig, BridgeContext, BridgeHandle, OpError, OpResult};
pub use document::Document;
pub use handlers::DocumentHost;
