//! Job queue
//!
//! Many producers, one consumer. `enqueue` only ever holds the lock for a
//! push; `drain_all` swaps the whole deque out, so jobs that arrive while
//! the pump is executing wait for the next wake.

use std::collections::VecDeque;

use parking_lot::Mutex;

use super::Job;

#[derive(Debug, Default)]
struct Inner {
    jobs: VecDeque<Job>,
    closed: bool,
}

#[derive(Debug, Default)]
pub struct JobQueue {
    inner: Mutex<Inner>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a job; hands it back if the queue has been closed
    pub fn enqueue(&self, job: Job) -> Result<(), Job> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(job);
        }
        inner.jobs.push_back(job);
        Ok(())
    }

    /// Remove and return every queued job in FIFO order
    pub fn drain_all(&self) -> VecDeque<Job> {
        std::mem::take(&mut self.inner.lock().jobs)
    }

    /// Refuse further jobs and return the ones still queued
    pub fn close_and_drain(&self) -> VecDeque<Job> {
        let mut inner = self.inner.lock();
        inner.closed = true;
        std::mem::take(&mut inner.jobs)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    pub fn len(&self) -> usize {
        self.inner.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
