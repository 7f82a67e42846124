use std::time::Duration;
use jitlab_common::{BenchError, RequestError};

#[test]
fn test_invalid_concurrency_display() {
    let err = BenchError::InvalidConcurrency(0);
    assert_eq!(err.to_string(), "Concurrency must be at least 1, got 0");
}

#[test]
fn test_invalid_argument_display() {
    let err = BenchError::invalid_argument("warmupSec", "expected seconds, got \"abc\"");
    assert_eq!(err.to_string(), "Invalid value for --warmupSec: expected seconds, got \"abc\"");
}

#[test]
fn test_shutdown_timeout_display() {
    let err = BenchError::ShutdownTimeout { stuck: 2, total: 8, grace: Duration::from_secs(30) };
    assert_eq!(err.to_string(), "2 of 8 workers still running after 30s grace timeout");
}

#[test]
fn test_worker_errors_display() {
    let err = BenchError::WorkerSpawn { index: 3, reason: "out of threads".to_string() };
    assert_eq!(err.to_string(), "Failed to spawn worker 3: out of threads");
    assert_eq!(BenchError::WorkerPanicked(1).to_string(), "Worker 1 panicked");
}

#[test]
fn test_configuration_classification() {
    assert!(BenchError::InvalidConcurrency(0).is_configuration());
    assert!(BenchError::invalid_argument("runSec", "must be positive").is_configuration());
    assert!(BenchError::Client("tls".to_string()).is_configuration());

    assert!(!BenchError::WorkerPanicked(0).is_configuration());
    assert!(!BenchError::ShutdownTimeout { stuck: 1, total: 1, grace: Duration::ZERO }.is_configuration());
}

#[test]
fn test_request_error_display() {
    assert_eq!(RequestError::Timeout.to_string(), "Request timed out");
    assert_eq!(
        RequestError::Transport("connection refused".to_string()).to_string(),
        "Transport error: connection refused"
    );
}

#[test]
fn test_error_equality() {
    assert_eq!(BenchError::InvalidConcurrency(0), BenchError::InvalidConcurrency(0));
    assert_ne!(BenchError::InvalidConcurrency(0), BenchError::WorkerPanicked(0));
}
