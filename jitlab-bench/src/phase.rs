use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Instant;

/// Run-state of the load driver. Only ever moves forward.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Idle = 0,
    Warmup = 1,
    Recording = 2,
    Stopped = 3,
}

impl Phase {
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Idle => Some(Phase::Warmup),
            Phase::Warmup => Some(Phase::Recording),
            Phase::Recording => Some(Phase::Stopped),
            Phase::Stopped => None,
        }
    }

    fn from_u8(raw: u8) -> Phase {
        match raw {
            0 => Phase::Idle,
            1 => Phase::Warmup,
            2 => Phase::Recording,
            _ => Phase::Stopped,
        }
    }
}

/// Shared phase state. Written by the driver, read by every worker.
#[derive(Debug)]
pub struct PhaseSignal(AtomicU8);

impl Default for PhaseSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseSignal {
    pub fn new() -> Self {
        Self(AtomicU8::new(Phase::Idle as u8))
    }

    pub fn current(&self) -> Phase {
        Phase::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move exactly one step forward. Returns the new phase, or `None` once stopped.
    pub fn advance(&self) -> Option<Phase> {
        let current = self.current();
        let next = current.next()?;
        self.0
            .compare_exchange(current as u8, next as u8, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| next)
    }

    /// Jump straight to `Stopped`. Only for aborting a run that never got going.
    pub fn stop_now(&self) {
        self.0.store(Phase::Stopped as u8, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.current() == Phase::Stopped
    }
}

/// When each phase began, in order.
#[derive(Debug, Clone)]
pub struct PhaseTimeline {
    entries: Vec<(Phase, Instant)>,
}

impl Default for PhaseTimeline {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseTimeline {
    /// Starts with `Idle` stamped now.
    pub fn new() -> Self {
        Self { entries: vec![(Phase::Idle, Instant::now())] }
    }

    pub fn record(&mut self, phase: Phase, at: Instant) {
        self.entries.push((phase, at));
    }

    pub fn phases(&self) -> Vec<Phase> {
        self.entries.iter().map(|(phase, _)| *phase).collect()
    }

    pub fn started_at(&self, phase: Phase) -> Option<Instant> {
        self.entries.iter().find(|(p, _)| *p == phase).map(|(_, at)| *at)
    }
}
