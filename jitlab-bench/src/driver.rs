use jitlab_client::Client;
use jitlab_common::{BenchError, Result};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::RunConfig;
use crate::phase::{Phase, PhaseSignal, PhaseTimeline};
use crate::stats::{aggregate, AUX_QUANTILES, LATENCY_QUANTILES};
use crate::store::{Counters, Sample, SampleStore};
use crate::worker::Worker;

const INITIAL_SAMPLE_CAPACITY: usize = 100_000;

/// Aggregates of a finished run. Latency figures are in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    /// Length of the recording window.
    pub wall_seconds: f64,
    /// `ok_count / wall_seconds`. `ok_count` spans the whole run, warmup included.
    pub throughput_rps: f64,
    /// Successful recorded samples per second of the recording window.
    pub recorded_ok_rps: f64,
    pub ok_count: u64,
    pub err_count: u64,
    pub sample_count: usize,
    pub mean_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    /// Present when the workload reports an auxiliary metric.
    pub aux: Option<AuxPercentiles>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuxPercentiles {
    /// Samples that carried the metric.
    pub count: usize,
    pub p50: f64,
    pub p95: f64,
}

/// A result plus what it was computed from.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub result: RunResult,
    pub timeline: PhaseTimeline,
    pub samples: Vec<Sample>,
}

/// Run the full warmup / recording schedule and return the aggregates.
pub fn run(config: &RunConfig) -> Result<RunResult> {
    Ok(LoadDriver::new(config.clone())?.run()?.result)
}

/// Owns the worker pool and the phase schedule for one run.
pub struct LoadDriver {
    config: RunConfig,
    client: Client,
}

impl LoadDriver {
    /// Validates `config` and builds the shared HTTP client. No worker starts here.
    pub fn new(config: RunConfig) -> Result<Self> {
        config.validate()?;
        if config.grace < config.request_timeout {
            warn!(
                grace = ?config.grace,
                request_timeout = ?config.request_timeout,
                "grace timeout is shorter than the request timeout; a hung request can fail shutdown"
            );
        }
        let client = Client::new(config.client_config())?;
        Ok(Self { config, client })
    }

    pub fn run(self) -> Result<RunOutcome> {
        let total = self.config.concurrency;
        let phase = Arc::new(PhaseSignal::new());
        let store = Arc::new(SampleStore::with_capacity(INITIAL_SAMPLE_CAPACITY));
        let counters = Arc::new(Counters::default());
        let mut timeline = PhaseTimeline::new();

        info!(
            target_url = %self.config.base_url,
            label = %self.config.label,
            concurrency = total,
            "starting run"
        );

        let (exit_tx, exit_rx) = mpsc::channel();
        advance(&phase, &mut timeline);

        let mut handles = Vec::with_capacity(total);
        for index in 0..total {
            let worker = Worker::new(
                index,
                self.client.clone(),
                Arc::clone(&self.config.request_builder),
                Arc::clone(&phase),
                Arc::clone(&store),
                Arc::clone(&counters),
            );
            let notice = ExitNotice { index, tx: exit_tx.clone() };
            let spawned = thread::Builder::new().name(format!("bench-worker-{index}")).spawn(move || {
                let _notice = notice;
                worker.run();
            });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    phase.stop_now();
                    return Err(BenchError::WorkerSpawn { index, reason: e.to_string() });
                }
            }
        }
        drop(exit_tx);

        thread::sleep(self.config.warmup);
        let start = advance(&phase, &mut timeline);

        thread::sleep(self.config.run);
        let end = advance(&phase, &mut timeline);

        await_workers(exit_rx, handles, self.config.grace)?;

        let samples = store.drain();
        let has_aux = self.config.request_builder.aux_header().is_some();
        let result = compute_result(&samples, counters.ok(), counters.err(), end - start, has_aux);

        info!(
            ok = result.ok_count,
            err = result.err_count,
            samples = result.sample_count,
            throughput_rps = result.throughput_rps,
            recorded_ok_rps = result.recorded_ok_rps,
            "run complete"
        );

        Ok(RunOutcome { result, timeline, samples })
    }
}

/// Step the phase forward once, stamp it on the timeline, and return the stamp.
fn advance(phase: &PhaseSignal, timeline: &mut PhaseTimeline) -> Instant {
    let at = Instant::now();
    if let Some(next) = phase.advance() {
        timeline.record(next, at);
        info!(phase = ?next, "phase transition");
    }
    at
}

/// Sent when a worker thread ends, including by panic.
struct ExitNotice {
    index: usize,
    tx: mpsc::Sender<usize>,
}

impl Drop for ExitNotice {
    fn drop(&mut self) {
        self.tx.send(self.index).ok();
    }
}

/// Wait up to `grace` for every worker to report exit, then join them.
///
/// Workers still running at the deadline may yet write samples, so the run fails
/// instead of reporting a truncated result.
fn await_workers(exits: mpsc::Receiver<usize>, handles: Vec<JoinHandle<()>>, grace: Duration) -> Result<()> {
    let total = handles.len();
    let deadline = Instant::now()
        .checked_add(grace)
        .ok_or_else(|| BenchError::invalid_argument("graceSec", "too large"))?;
    let mut exited = 0;

    while exited < total {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match exits.recv_timeout(remaining) {
            Ok(_) => exited += 1,
            Err(RecvTimeoutError::Timeout) => {
                warn!(stuck = total - exited, ?grace, "workers did not exit within grace timeout");
                return Err(BenchError::ShutdownTimeout { stuck: total - exited, total, grace });
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    for (index, handle) in handles.into_iter().enumerate() {
        handle.join().map_err(|_| BenchError::WorkerPanicked(index))?;
    }
    Ok(())
}

/// Derive the run aggregates. Percentiles cover `samples` only; counts cover the whole run.
pub fn compute_result(samples: &[Sample], ok_count: u64, err_count: u64, wall: Duration, has_aux: bool) -> RunResult {
    let wall_seconds = wall.as_secs_f64();
    let per_second = |count: f64| if wall_seconds > 0.0 { count / wall_seconds } else { 0.0 };

    let latencies: Vec<f64> = samples.iter().map(Sample::latency_ms).collect();
    let latency = aggregate(&latencies, &LATENCY_QUANTILES);
    let recorded_ok = samples.iter().filter(|s| s.is_success()).count();

    let aux = has_aux.then(|| {
        let values: Vec<f64> = samples.iter().filter_map(|s| s.aux_metric).map(|v| v as f64).collect();
        let summary = aggregate(&values, &AUX_QUANTILES);
        AuxPercentiles {
            count: summary.count,
            p50: summary.percentile(0.50).unwrap_or_default(),
            p95: summary.percentile(0.95).unwrap_or_default(),
        }
    });

    RunResult {
        wall_seconds,
        throughput_rps: per_second(ok_count as f64),
        recorded_ok_rps: per_second(recorded_ok as f64),
        ok_count,
        err_count,
        sample_count: samples.len(),
        mean_ms: latency.mean,
        p50_ms: latency.percentile(0.50).unwrap_or_default(),
        p95_ms: latency.percentile(0.95).unwrap_or_default(),
        p99_ms: latency.percentile(0.99).unwrap_or_default(),
        aux,
    }
}
