//! Execution pump
//!
//! The only code that touches the host. Runs on the host thread each time
//! the wake signal fires, executes every drained job in order and never
//! lets a failure escape.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use bimbridge_protocol::Operation;
use tracing::{debug, error, info, warn};

use super::{Job, JobQueue, OpError, OpResult, WakeSignal};
use crate::observability::Metrics;

/// The seam between the pump and the host application
///
/// `execute` is only ever called from the host thread.
pub trait HostApplication {
    fn execute(&mut self, operation: &Operation) -> OpResult;
}

impl<F> HostApplication for F
where
    F: FnMut(&Operation) -> OpResult,
{
    fn execute(&mut self, operation: &Operation) -> OpResult {
        self(operation)
    }
}

pub struct ExecutionPump {
    queue: Arc<JobQueue>,
    signal: WakeSignal,
}

impl ExecutionPump {
    pub fn new(queue: Arc<JobQueue>, signal: WakeSignal) -> Self {
        Self { queue, signal }
    }

    /// One wake cycle: drain and execute everything queued
    ///
    /// Returns the number of jobs executed.
    pub fn run_once<H: HostApplication>(&self, host: &mut H) -> usize {
        self.signal.acknowledge();
        Metrics::global().record_pump_cycle();
        let jobs = self.queue.drain_all();
        self.execute_all(host, jobs)
    }

    /// Close the queue and execute whatever was still in it
    pub fn run_final<H: HostApplication>(&self, host: &mut H) -> usize {
        let jobs = self.queue.close_and_drain();
        if !jobs.is_empty() {
            info!("Executing {} jobs queued before shutdown", jobs.len());
        }
        self.execute_all(host, jobs)
    }

    fn execute_all<H: HostApplication>(
        &self,
        host: &mut H,
        jobs: impl IntoIterator<Item = Job>,
    ) -> usize {
        let mut count = 0;
        for job in jobs {
            execute_job(host, job);
            count += 1;
        }
        count
    }
}

fn execute_job<H: HostApplication>(host: &mut H, job: Job) {
    let metrics = Metrics::global();
    let name = job.operation.name();
    metrics.record_request(name);
    debug!(job_id = %job.id, op = name, "dispatching job");

    let result = match panic::catch_unwind(AssertUnwindSafe(|| host.execute(&job.operation))) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(
                job_id = %job.id,
                op = name,
                args = %job.operation.arguments_json(),
                "handler panicked: {}",
                message
            );
            metrics.record_job_panicked();
            Err(OpError::execution(message))
        }
    };

    let elapsed_ms = job.enqueued_at.elapsed().as_millis() as u64;
    metrics.record_job_executed(elapsed_ms, result.is_err());

    match &result {
        Ok(_) => debug!(job_id = %job.id, op = name, elapsed_ms, "job complete"),
        Err(e) => {
            metrics.record_error(e.kind());
            warn!(
                job_id = %job.id,
                op = name,
                args = %job.operation.arguments_json(),
                status = e.status(),
                elapsed_ms,
                "job failed: {}",
                e
            );
        }
    }

    let job_id = job.id;
    if !job.complete(result) {
        metrics.record_reply_discarded();
        debug!(job_id = %job_id, op = name, "caller gone, result discarded");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
