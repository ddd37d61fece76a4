//! Cross-thread command bridge
//!
//! Network threads never touch the host. They turn a request into a `Job`,
//! push it onto the `JobQueue`, raise the `WakeSignal` and wait on the job's
//! result slot. The host thread runs the `ExecutionPump` when woken, which
//! drains the queue and executes each job against the `HostApplication`.

mod context;
mod error;
mod job;
mod pump;
mod queue;
mod signal;

pub use context::{BridgeClient, BridgeConfig, BridgeContext, BridgeHandle, DEFAULT_JOB_TIMEOUT};
pub use error::OpError;
pub use job::{Job, JobId, OpResult};
pub use pump::{ExecutionPump, HostApplication};
pub use queue::JobQueue;
pub use signal::{HostEvent, WakeSignal};
