use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Response header the files workload uses to report server-side preparation time (ms).
pub const CREATE_ELAPSED_HEADER: &str = "X-Create-Elapsed-Ms";

/// Status code recorded for a request that never produced an HTTP response.
pub const TRANSPORT_FAILURE_STATUS: i32 = -1;

/// Fatal errors: configuration problems before the run, shutdown problems after it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BenchError {
    #[error("Concurrency must be at least 1, got {0}")]
    InvalidConcurrency(usize),

    #[error("Invalid value for --{name}: {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Failed to spawn worker {index}: {reason}")]
    WorkerSpawn { index: usize, reason: String },

    #[error("Worker {0} panicked")]
    WorkerPanicked(usize),

    #[error("{stuck} of {total} workers still running after {grace:?} grace timeout")]
    ShutdownTimeout { stuck: usize, total: usize, grace: Duration },
}

impl BenchError {
    /// Errors raised before any worker starts.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            BenchError::InvalidConcurrency(_) | BenchError::InvalidArgument { .. } | BenchError::Client(_)
        )
    }

    pub fn invalid_argument(name: &str, reason: impl Into<String>) -> Self {
        BenchError::InvalidArgument { name: name.to_string(), reason: reason.into() }
    }
}

/// Per-request failures. These never escape a worker; they become error samples.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Request timed out")]
    Timeout,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid request: {0}")]
    Build(String),
}

/// Body of the `cpu` and `image-compress` endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkRequest {
    pub iterations: u32,
    pub payload_size: u32,
}

/// Body of the `files` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesRequest {
    pub file_count: u32,
    pub file_size_bytes: u32,
    pub prefix: String,
}

/// Result type for fatal harness operations
pub type Result<T> = std::result::Result<T, BenchError>;
