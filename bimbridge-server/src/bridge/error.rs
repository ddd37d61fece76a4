//! Per-job error taxonomy

use bimbridge_protocol::OperationError;

use crate::document::geometry::GeometryError;
use crate::document::ModelError;

/// Why a single bridged operation failed
///
/// Validation failures are not errors; they are successful results whose
/// flag is `false`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OpError {
    /// Malformed input or an unresolvable reference
    #[error("{0}")]
    Input(String),

    #[error("{0}")]
    NotFound(String),

    /// Failure after a transaction started; the document was rolled back
    #[error("{0}")]
    Execution(String),

    /// The caller stopped waiting; the job still runs
    #[error("timeout")]
    Timeout,

    #[error("unknown operation")]
    UnknownOperation(String),

    #[error("bridge is not running")]
    BridgeStopped,
}

impl OpError {
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// HTTP status the route layer answers with
    pub fn status(&self) -> u16 {
        match self {
            OpError::Input(_) => 400,
            OpError::NotFound(_) | OpError::UnknownOperation(_) => 404,
            OpError::Execution(_) => 500,
            OpError::BridgeStopped => 503,
            OpError::Timeout => 504,
        }
    }

    /// Stable label for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            OpError::Input(_) => "input",
            OpError::NotFound(_) => "not_found",
            OpError::Execution(_) => "execution",
            OpError::Timeout => "timeout",
            OpError::UnknownOperation(_) => "unknown_operation",
            OpError::BridgeStopped => "bridge_stopped",
        }
    }

    /// `{ok: false, error}`
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({"ok": false, "error": self.to_string()})
    }
}

impl From<OperationError> for OpError {
    fn from(err: OperationError) -> Self {
        match err {
            OperationError::Unknown(name) => OpError::UnknownOperation(name),
            OperationError::InvalidArguments { message, .. } => OpError::Input(message),
        }
    }
}

/// Host failures surface as execution failures
impl From<ModelError> for OpError {
    fn from(err: ModelError) -> Self {
        OpError::Execution(err.to_string())
    }
}

/// Geometry that cannot be built from the request is the caller's fault
impl From<GeometryError> for OpError {
    fn from(err: GeometryError) -> Self {
        OpError::Input(err.to_string())
    }
}
