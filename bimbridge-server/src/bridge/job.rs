//! Jobs

use std::fmt;
use std::time::Instant;

use bimbridge_protocol::Operation;
use tokio::sync::oneshot;
use uuid::Uuid;

use super::OpError;

/// Result of one operation: the success payload or an `OpError`
pub type OpResult = Result<serde_json::Value, OpError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One requested operation and the slot its result goes into
///
/// The reply sender is the result slot. The pump is its only writer and
/// the caller holding the receiver its only reader.
#[derive(Debug)]
pub struct Job {
    pub id: JobId,
    pub operation: Operation,
    pub enqueued_at: Instant,
    reply: oneshot::Sender<OpResult>,
}

impl Job {
    pub fn new(operation: Operation) -> (Self, oneshot::Receiver<OpResult>) {
        let (reply, rx) = oneshot::channel();
        let job = Self {
            id: JobId::new(),
            operation,
            enqueued_at: Instant::now(),
            reply,
        };
        (job, rx)
    }

    /// Deliver the result; returns `false` when the caller has gone
    pub fn complete(self, result: OpResult) -> bool {
        self.reply.send(result).is_ok()
    }
}
