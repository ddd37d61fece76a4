//! Bridge lifecycle
//!
//! `BridgeContext::start` moves the host onto a dedicated thread and hands
//! back a `BridgeHandle`. Network code talks to the host only through
//! `BridgeClient::call`, which enqueues a job, raises the wake signal and
//! waits for the reply with a bounded timeout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use bimbridge_protocol::Operation;
use bimbridge_utils::{BridgeError, Result};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::{ExecutionPump, HostApplication, HostEvent, Job, JobQueue, OpError, OpResult, WakeSignal};
use crate::observability::Metrics;

/// Default bounded wait for a job's result
pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(20);

const HOST_THREAD_NAME: &str = "bimbridge-host";

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub job_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            job_timeout: DEFAULT_JOB_TIMEOUT,
        }
    }
}

pub struct BridgeContext;

impl BridgeContext {
    /// Spawn the host thread and start accepting jobs
    pub fn start<H>(host: H, config: BridgeConfig) -> Result<BridgeHandle<H>>
    where
        H: HostApplication + Send + 'static,
    {
        let queue = Arc::new(JobQueue::new());
        let (signal, events) = WakeSignal::new();
        let running = Arc::new(AtomicBool::new(true));

        let pump = ExecutionPump::new(Arc::clone(&queue), signal.clone());
        let thread_running = Arc::clone(&running);
        let thread = std::thread::Builder::new()
            .name(HOST_THREAD_NAME.into())
            .spawn(move || host_loop(host, pump, events, thread_running))
            .map_err(|e| BridgeError::internal(format!("Failed to spawn host thread: {}", e)))?;

        info!(
            "Bridge started (job timeout {}ms)",
            config.job_timeout.as_millis()
        );

        Ok(BridgeHandle {
            client: BridgeClient {
                queue,
                signal,
                running,
                job_timeout: config.job_timeout,
            },
            thread: Some(thread),
        })
    }
}

fn host_loop<H: HostApplication>(
    mut host: H,
    pump: ExecutionPump,
    mut events: mpsc::UnboundedReceiver<HostEvent>,
    running: Arc<AtomicBool>,
) -> H {
    debug!("host thread running");
    while let Some(event) = events.blocking_recv() {
        match event {
            HostEvent::Wake => {
                pump.run_once(&mut host);
            }
            HostEvent::Shutdown => break,
        }
    }
    running.store(false, Ordering::Release);
    pump.run_final(&mut host);
    debug!("host thread exiting");
    host
}

/// Owner of the running bridge
pub struct BridgeHandle<H> {
    client: BridgeClient,
    thread: Option<JoinHandle<H>>,
}

impl<H> BridgeHandle<H> {
    /// A cloneable client for network handlers
    pub fn client(&self) -> BridgeClient {
        self.client.clone()
    }

    /// Stop the host thread after it executes every queued job, and return
    /// the host
    pub fn stop(mut self) -> Result<H> {
        let thread = self
            .thread
            .take()
            .ok_or(BridgeError::BridgeStopped)?;
        self.client.signal.shutdown();
        let host = thread
            .join()
            .map_err(|_| BridgeError::internal("host thread panicked"))?;
        info!("Bridge stopped");
        Ok(host)
    }
}

impl<H> Drop for BridgeHandle<H> {
    fn drop(&mut self) {
        if self.thread.is_some() {
            // Detach: the thread drains and exits once it sees the event.
            self.client.signal.shutdown();
        }
    }
}

/// Cheap handle used by network handlers to run operations on the host
#[derive(Clone)]
pub struct BridgeClient {
    queue: Arc<JobQueue>,
    signal: WakeSignal,
    running: Arc<AtomicBool>,
    job_timeout: Duration,
}

impl BridgeClient {
    pub fn job_timeout(&self) -> Duration {
        self.job_timeout
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire) && !self.queue.is_closed()
    }

    pub fn queued_jobs(&self) -> usize {
        self.queue.len()
    }

    /// Run an operation on the host and wait for its result
    ///
    /// On timeout the job stays queued and still runs exactly once; its
    /// result is discarded.
    pub async fn call(&self, operation: Operation) -> OpResult {
        let metrics = Metrics::global();
        let name = operation.name();
        let (job, rx) = Job::new(operation);
        let job_id = job.id;

        if self.queue.enqueue(job).is_err() {
            metrics.record_error(OpError::BridgeStopped.kind());
            return Err(OpError::BridgeStopped);
        }
        metrics.record_job_enqueued();
        debug!(job_id = %job_id, op = name, "job enqueued");

        if !self.signal.raise() {
            error!(job_id = %job_id, op = name, "host thread is gone");
        }

        match tokio::time::timeout(self.job_timeout, rx).await {
            Ok(Ok(result)) => result,
            // sender dropped without a reply: the host thread exited
            Ok(Err(_)) => Err(OpError::BridgeStopped),
            Err(_) => {
                metrics.record_job_timed_out();
                metrics.record_error(OpError::Timeout.kind());
                warn!(
                    job_id = %job_id,
                    op = name,
                    timeout_ms = self.job_timeout.as_millis() as u64,
                    "job timed out, it will still run once"
                );
                Err(OpError::Timeout)
            }
        }
    }

    /// Parse `name` and `arguments` into an operation and run it
    pub async fn call_named(&self, name: &str, arguments: serde_json::Value) -> OpResult {
        let operation = Operation::parse(name, arguments).map_err(|e| {
            let err = OpError::from(e);
            Metrics::global().record_error(err.kind());
            debug!(op = name, "rejected at ingestion: {}", err);
            err
        })?;
        self.call(operation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo(op: &Operation) -> OpResult {
        Ok(json!({"op": op.name()}))
    }

    #[tokio::test]
    async fn test_call_round_trip() {
        let bridge = BridgeContext::start(echo, BridgeConfig::default()).unwrap();
        let client = bridge.client();
        let result = client.call(Operation::Levels).await.unwrap();
        assert_eq!(result, json!({"op": "levels"}));
        bridge.stop().unwrap();
    }

    #[tokio::test]
    async fn test_runs_on_host_thread() {
        let host = |_: &Operation| -> OpResult {
            Ok(json!({"thread": std::thread::current().name().map(str::to_string)}))
        };
        let bridge = BridgeContext::start(host, BridgeConfig::default()).unwrap();
        let result = bridge.client().call(Operation::Status).await.unwrap();
        assert_eq!(result, json!({"thread": "bimbridge-host"}));
        bridge.stop().unwrap();
    }

    #[tokio::test]
    async fn test_call_named_unknown() {
        let bridge = BridgeContext::start(echo, BridgeConfig::default()).unwrap();
        let err = bridge
            .client()
            .call_named("summon_building", json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.to_json(), json!({"ok": false, "error": "unknown operation"}));
        bridge.stop().unwrap();
    }

    #[tokio::test]
    async fn test_call_named_invalid_arguments() {
        let bridge = BridgeContext::start(echo, BridgeConfig::default()).unwrap();
        let err = bridge
            .client()
            .call_named("place_column", json!({"x": 1.0}))
            .await
            .unwrap_err();
        assert!(matches!(err, OpError::Input(_)));
        bridge.stop().unwrap();
    }

    #[tokio::test]
    async fn test_call_after_stop() {
        let bridge = BridgeContext::start(echo, BridgeConfig::default()).unwrap();
        let client = bridge.client();
        assert!(client.is_running());
        bridge.stop().unwrap();
        assert!(!client.is_running());
        assert_eq!(client.call(Operation::Status).await, Err(OpError::BridgeStopped));
    }

    #[tokio::test]
    async fn test_stop_returns_host() {
        struct Counter(u32);
        impl HostApplication for Counter {
            fn execute(&mut self, _: &Operation) -> OpResult {
                self.0 += 1;
                Ok(json!(self.0))
            }
        }

        let bridge = BridgeContext::start(Counter(0), BridgeConfig::default()).unwrap();
        let client = bridge.client();
        client.call(Operation::Status).await.unwrap();
        client.call(Operation::Status).await.unwrap();
        let host = bridge.stop().unwrap();
        assert_eq!(host.0, 2);
    }
}
