use jitlab_bench::config::RunConfig;
use jitlab_bench::driver::{compute_result, run, LoadDriver};
use jitlab_bench::phase::Phase;
use jitlab_bench::store::Sample;
use jitlab_bench::workload::Workload;
use jitlab_common::{BenchError, WorkRequest, TRANSPORT_FAILURE_STATUS};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn sample(status: i32, latency_ms: u64, aux_metric: Option<i64>) -> Sample {
    Sample { started_at: Instant::now(), latency: Duration::from_millis(latency_ms), status, aux_metric }
}

fn short_config(base_url: &str, concurrency: usize) -> RunConfig {
    RunConfig {
        base_url: base_url.to_string(),
        concurrency,
        warmup: Duration::from_millis(100),
        run: Duration::from_millis(300),
        request_timeout: Duration::from_secs(2),
        connect_timeout: Duration::from_secs(1),
        grace: Duration::from_secs(5),
        label: "unit".to_string(),
        request_builder: Arc::new(Workload::cpu(WorkRequest { iterations: 1, payload_size: 1 }).unwrap()),
    }
}

#[test]
fn test_compute_result_nearest_rank() {
    let samples: Vec<Sample> = [10, 20, 30, 40, 50].iter().map(|&ms| sample(200, ms, None)).collect();
    let result = compute_result(&samples, 5, 0, Duration::from_secs(1), false);

    assert_eq!(result.sample_count, 5);
    assert_eq!(result.mean_ms, 30.0);
    assert_eq!(result.p50_ms, 30.0);
    assert_eq!(result.p95_ms, 50.0);
    assert_eq!(result.p99_ms, 50.0);
    assert_eq!(result.aux, None);
}

#[test]
fn test_throughput_uses_whole_run_ok_count_over_recording_window() {
    // 4 recorded successes, but 10 successes overall (warmup included).
    let samples: Vec<Sample> = (0..4).map(|_| sample(200, 5, None)).collect();
    let result = compute_result(&samples, 10, 1, Duration::from_millis(2_500), false);

    assert_eq!(result.wall_seconds, 2.5);
    assert_eq!(result.throughput_rps, 10.0 / 2.5);
    assert_eq!(result.recorded_ok_rps, 4.0 / 2.5);
    assert_eq!(result.ok_count, 10);
    assert_eq!(result.err_count, 1);
}

#[test]
fn test_compute_result_empty_is_zero_not_nan() {
    let result = compute_result(&[], 0, 0, Duration::ZERO, true);

    assert_eq!(result.throughput_rps, 0.0);
    assert_eq!(result.mean_ms, 0.0);
    assert_eq!(result.p50_ms, 0.0);
    assert_eq!(result.p99_ms, 0.0);
    let aux = result.aux.unwrap();
    assert_eq!((aux.count, aux.p50, aux.p95), (0, 0.0, 0.0));
}

#[test]
fn test_aux_percentiles_skip_samples_without_metric() {
    let samples = vec![
        sample(200, 1, Some(30)),
        sample(200, 1, None),
        sample(TRANSPORT_FAILURE_STATUS, 1, None),
        sample(200, 1, Some(10)),
        sample(500, 1, Some(20)),
    ];
    let aux = compute_result(&samples, 3, 2, Duration::from_secs(1), true).aux.unwrap();

    // Sorted [10, 20, 30]: p50 → index 1, p95 → index round(1.9) = 2.
    assert_eq!(aux.count, 3);
    assert_eq!(aux.p50, 20.0);
    assert_eq!(aux.p95, 30.0);
}

#[test]
fn test_percentiles_include_error_samples() {
    let samples = vec![sample(200, 10, None), sample(500, 1000, None), sample(TRANSPORT_FAILURE_STATUS, 2000, None)];
    let result = compute_result(&samples, 1, 2, Duration::from_secs(1), false);
    assert_eq!(result.p99_ms, 2000.0);
    assert_eq!(result.recorded_ok_rps, 1.0);
}

#[test]
fn test_driver_rejects_zero_concurrency() {
    let err = LoadDriver::new(short_config("http://127.0.0.1:1", 0)).err().unwrap();
    assert_eq!(err, BenchError::InvalidConcurrency(0));
}

#[test]
fn test_short_run_against_mock_server() {
    let mut server = mockito::Server::new();
    server.mock("POST", "/work/cpu").with_status(200).expect_at_least(1).create();

    let outcome = LoadDriver::new(short_config(&server.url(), 2)).unwrap().run().unwrap();

    assert_eq!(outcome.timeline.phases(), vec![Phase::Idle, Phase::Warmup, Phase::Recording, Phase::Stopped]);
    let recording_start = outcome.timeline.started_at(Phase::Recording).unwrap();
    assert!(outcome.samples.iter().all(|s| s.started_at >= recording_start));

    let result = outcome.result;
    assert!(result.ok_count > 0);
    assert_eq!(result.err_count, 0);
    assert_eq!(result.sample_count, outcome.samples.len());
    assert!(result.ok_count >= result.sample_count as u64);
    assert!(result.wall_seconds >= 0.3);
    assert_eq!(result.throughput_rps, result.ok_count as f64 / result.wall_seconds);
}

#[test]
fn test_run_against_refused_port_reports_errors_only() {
    let port = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
    let result = run(&short_config(&format!("http://127.0.0.1:{port}"), 1)).unwrap();

    assert_eq!(result.ok_count, 0);
    assert!(result.err_count > 0);
    assert_eq!(result.throughput_rps, 0.0);
}
