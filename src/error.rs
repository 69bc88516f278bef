use std::{error::Error, fmt, io};

/// The coordination layer's result type.
pub type Result<T> = std::result::Result<T, CoordinationError>;

/// Controller-visible coordination failures.
#[derive(Debug)]
pub enum CoordinationError {
    /// Invalid worker-pool shape — caught at construction, before any dispatch.
    PoolConfiguration(String),
    /// One worker failed a dispatched operation. Raised only after every
    /// sibling invocation of the same dispatch has been resolved.
    WorkerExecution {
        worker_index: usize,
        operation: String,
        cause: String,
    },
    /// Capacity reduction produced an invalid result or its dispatch failed.
    CapacityNegotiation(String),
    /// A liveness probe found a worker that cannot be dispatched to at all.
    WorkerUnhealthy { worker_index: usize },
    /// A startup-sequence operation was called in the wrong phase.
    OutOfOrder {
        operation: &'static str,
        phase: &'static str,
    },
}

impl CoordinationError {
    pub(crate) fn execution(worker_index: usize, operation: &str, cause: String) -> Self {
        Self::WorkerExecution {
            worker_index,
            operation: operation.to_string(),
            cause,
        }
    }
}

impl fmt::Display for CoordinationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PoolConfiguration(msg) => write!(f, "invalid pool configuration: {msg}"),
            Self::WorkerExecution {
                worker_index,
                operation,
                cause,
            } => write!(f, "worker {worker_index} failed {operation}: {cause}"),
            Self::CapacityNegotiation(msg) => write!(f, "capacity negotiation failed: {msg}"),
            Self::WorkerUnhealthy { worker_index } => {
                write!(f, "worker {worker_index} is unhealthy")
            }
            Self::OutOfOrder { operation, phase } => {
                write!(f, "{operation} called while the coordinator is {phase}")
            }
        }
    }
}

impl Error for CoordinationError {}

/// Boundary conversion for binaries / I/O APIs.
impl From<CoordinationError> for io::Error {
    fn from(value: CoordinationError) -> Self {
        io::Error::other(value)
    }
}
