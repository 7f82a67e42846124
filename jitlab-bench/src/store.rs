use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// One recorded request outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// When the request was issued.
    pub started_at: Instant,
    pub latency: Duration,
    /// HTTP status, or `TRANSPORT_FAILURE_STATUS` when no response arrived.
    pub status: i32,
    pub aux_metric: Option<i64>,
}

impl Sample {
    pub fn is_success(&self) -> bool {
        is_success_status(self.status)
    }

    pub fn latency_ms(&self) -> f64 {
        self.latency.as_secs_f64() * 1_000.0
    }
}

/// Returns `true` for any 2xx status.
pub fn is_success_status(status: i32) -> bool {
    (200..300).contains(&status)
}

/// Append-only sample collection shared by all workers.
///
/// Append order across workers is arbitrary; aggregation sorts before use.
#[derive(Debug, Default)]
pub struct SampleStore {
    samples: Mutex<Vec<Sample>>,
}

impl SampleStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { samples: Mutex::new(Vec::with_capacity(capacity)) }
    }

    pub fn append(&self, sample: Sample) {
        self.samples.lock().push(sample);
    }

    /// Take every recorded sample, leaving the store empty. Call once, after all workers joined.
    pub fn drain(&self) -> Vec<Sample> {
        std::mem::take(&mut *self.samples.lock())
    }
}

/// Whole-run success/error tallies, including warmup.
#[derive(Debug, Default)]
pub struct Counters {
    ok: AtomicU64,
    err: AtomicU64,
}

impl Counters {
    pub fn record(&self, success: bool) {
        let bucket = if success { &self.ok } else { &self.err };
        bucket.fetch_add(1, Ordering::Relaxed);
    }

    pub fn ok(&self) -> u64 {
        self.ok.load(Ordering::Relaxed)
    }

    pub fn err(&self) -> u64 {
        self.err.load(Ordering::Relaxed)
    }
}
