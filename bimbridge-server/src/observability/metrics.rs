//! Metrics collection for bimbridge
//!
//! Process-wide counters for the bridge, exported in Prometheus text format
//! at `/metrics`.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

/// Point-in-time gauge values collected on each metrics request
#[derive(Debug, Default)]
pub struct GaugeSnapshot {
    /// Jobs waiting for the host thread
    pub queued_jobs: u64,
    /// 1 while the host thread is accepting jobs
    pub host_running: u64,
    /// Process resident set size in bytes (Linux only)
    pub process_memory_bytes: Option<u64>,
    /// Number of open file descriptors (Linux only)
    pub process_open_fds: Option<u64>,
}

impl GaugeSnapshot {
    /// Collect gauge values from /proc on Linux
    #[cfg(target_os = "linux")]
    pub fn collect_process_metrics(&mut self) {
        // Second field of statm is RSS in pages
        if let Ok(content) = std::fs::read_to_string("/proc/self/statm") {
            let parts: Vec<&str> = content.split_whitespace().collect();
            if parts.len() >= 2 {
                if let Ok(pages) = parts[1].parse::<u64>() {
                    self.process_memory_bytes = Some(pages * 4096);
                }
            }
        }

        if let Ok(entries) = std::fs::read_dir("/proc/self/fd") {
            self.process_open_fds = Some(entries.count() as u64);
        }
    }

    #[cfg(not(target_os = "linux"))]
    pub fn collect_process_metrics(&mut self) {}
}

/// Global metrics collector
pub struct Metrics {
    pub jobs_enqueued_total: AtomicU64,
    pub jobs_executed_total: AtomicU64,
    /// Jobs whose handler returned an error
    pub jobs_failed_total: AtomicU64,
    /// Jobs whose handler panicked; the pump survived each one
    pub jobs_panicked_total: AtomicU64,
    /// Callers that stopped waiting before the job finished
    pub jobs_timed_out_total: AtomicU64,
    /// Results the pump produced after the caller had gone
    pub replies_discarded_total: AtomicU64,

    /// Sum of enqueue-to-completion time in milliseconds
    pub job_latency_sum_ms: AtomicU64,

    pub transactions_committed_total: AtomicU64,
    pub transactions_rolled_back_total: AtomicU64,

    /// Pump invocations
    pub pump_cycles_total: AtomicU64,

    /// Requests by operation name
    pub requests_by_operation: DashMap<String, AtomicU64>,
    /// Errors by error kind
    pub errors_by_kind: DashMap<String, AtomicU64>,
}

impl Metrics {
    /// Get the global metrics instance
    pub fn global() -> &'static Self {
        static INSTANCE: OnceLock<Metrics> = OnceLock::new();
        INSTANCE.get_or_init(|| Self {
            jobs_enqueued_total: AtomicU64::new(0),
            jobs_executed_total: AtomicU64::new(0),
            jobs_failed_total: AtomicU64::new(0),
            jobs_panicked_total: AtomicU64::new(0),
            jobs_timed_out_total: AtomicU64::new(0),
            replies_discarded_total: AtomicU64::new(0),
            job_latency_sum_ms: AtomicU64::new(0),
            transactions_committed_total: AtomicU64::new(0),
            transactions_rolled_back_total: AtomicU64::new(0),
            pump_cycles_total: AtomicU64::new(0),
            requests_by_operation: DashMap::new(),
            errors_by_kind: DashMap::new(),
        })
    }

    pub fn record_job_enqueued(&self) {
        self.jobs_enqueued_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a finished job and its latency
    pub fn record_job_executed(&self, latency_ms: u64, failed: bool) {
        self.jobs_executed_total.fetch_add(1, Ordering::Relaxed);
        self.job_latency_sum_ms.fetch_add(latency_ms, Ordering::Relaxed);
        if failed {
            self.jobs_failed_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_job_panicked(&self) {
        self.jobs_panicked_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_job_timed_out(&self) {
        self.jobs_timed_out_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reply_discarded(&self) {
        self.replies_discarded_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transaction_committed(&self) {
        self.transactions_committed_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transaction_rolled_back(&self) {
        self.transactions_rolled_back_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pump_cycle(&self) {
        self.pump_cycles_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request by operation name
    pub fn record_request(&self, operation: &str) {
        self.requests_by_operation
            .entry(operation.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Record an error by kind
    pub fn record_error(&self, kind: &str) {
        self.errors_by_kind
            .entry(kind.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Export metrics in Prometheus text format
    pub fn to_prometheus(&self, gauges: &GaugeSnapshot) -> String {
        use std::fmt::Write;

        let mut output = String::with_capacity(4096);

        macro_rules! counter {
            ($name:expr, $help:expr, $value:expr) => {
                let _ = writeln!(output, "# HELP {} {}", $name, $help);
                let _ = writeln!(output, "# TYPE {} counter", $name);
                let _ = writeln!(output, "{} {}", $name, $value.load(Ordering::Relaxed));
            };
        }

        macro_rules! gauge {
            ($name:expr, $help:expr, $value:expr) => {
                let _ = writeln!(output, "# HELP {} {}", $name, $help);
                let _ = writeln!(output, "# TYPE {} gauge", $name);
                let _ = writeln!(output, "{} {}", $name, $value);
            };
        }

        // === Counters ===

        counter!(
            "bimbridge_jobs_enqueued_total",
            "Total number of jobs enqueued",
            self.jobs_enqueued_total
        );
        counter!(
            "bimbridge_jobs_executed_total",
            "Total number of jobs executed by the host thread",
            self.jobs_executed_total
        );
        counter!(
            "bimbridge_jobs_failed_total",
            "Total number of jobs that returned an error",
            self.jobs_failed_total
        );
        counter!(
            "bimbridge_jobs_panicked_total",
            "Total number of jobs whose handler panicked",
            self.jobs_panicked_total
        );
        counter!(
            "bimbridge_jobs_timed_out_total",
            "Total number of callers that timed out waiting for a job",
            self.jobs_timed_out_total
        );
        counter!(
            "bimbridge_replies_discarded_total",
            "Total number of job results produced after the caller left",
            self.replies_discarded_total
        );
        counter!(
            "bimbridge_job_latency_sum_ms",
            "Sum of job latency in milliseconds",
            self.job_latency_sum_ms
        );
        counter!(
            "bimbridge_transactions_committed_total",
            "Total number of committed transactions",
            self.transactions_committed_total
        );
        counter!(
            "bimbridge_transactions_rolled_back_total",
            "Total number of rolled back transactions",
            self.transactions_rolled_back_total
        );
        counter!(
            "bimbridge_pump_cycles_total",
            "Total number of execution pump invocations",
            self.pump_cycles_total
        );

        // === Per-label counters ===

        if !self.requests_by_operation.is_empty() {
            let _ = writeln!(
                output,
                "# HELP bimbridge_requests_total Total requests by operation"
            );
            let _ = writeln!(output, "# TYPE bimbridge_requests_total counter");
            for entry in self.requests_by_operation.iter() {
                let _ = writeln!(
                    output,
                    "bimbridge_requests_total{{operation=\"{}\"}} {}",
                    entry.key(),
                    entry.value().load(Ordering::Relaxed)
                );
            }
        }

        if !self.errors_by_kind.is_empty() {
            let _ = writeln!(output, "# HELP bimbridge_errors_total Total errors by kind");
            let _ = writeln!(output, "# TYPE bimbridge_errors_total counter");
            for entry in self.errors_by_kind.iter() {
                let _ = writeln!(
                    output,
                    "bimbridge_errors_total{{kind=\"{}\"}} {}",
                    entry.key(),
                    entry.value().load(Ordering::Relaxed)
                );
            }
        }

        // === Gauges ===

        gauge!(
            "bimbridge_queued_jobs",
            "Number of jobs waiting for the host thread",
            gauges.queued_jobs
        );
        gauge!(
            "bimbridge_host_running",
            "Whether the host thread is accepting jobs",
            gauges.host_running
        );

        if let Some(memory) = gauges.process_memory_bytes {
            gauge!(
                "bimbridge_process_memory_bytes",
                "Process resident set size in bytes",
                memory
            );
        }
        if let Some(fds) = gauges.process_open_fds {
            gauge!(
                "bimbridge_process_open_fds",
                "Number of open file descriptors",
                fds
            );
        }

        output
    }
}
