use jitlab_client::Client;
use jitlab_common::TRANSPORT_FAILURE_STATUS;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::phase::{Phase, PhaseSignal};
use crate::store::{Counters, Sample, SampleStore};
use crate::workload::RequestBuilder;

/// One closed-loop request issuer: a single blocking request in flight at a time.
pub struct Worker {
    id: usize,
    client: Client,
    builder: Arc<dyn RequestBuilder>,
    phase: Arc<PhaseSignal>,
    store: Arc<SampleStore>,
    counters: Arc<Counters>,
}

impl Worker {
    pub fn new(
        id: usize,
        client: Client,
        builder: Arc<dyn RequestBuilder>,
        phase: Arc<PhaseSignal>,
        store: Arc<SampleStore>,
        counters: Arc<Counters>,
    ) -> Self {
        Self { id, client, builder, phase, store, counters }
    }

    /// Issue requests until the phase reaches `Stopped`.
    ///
    /// Stop is only checked between requests; an in-flight request always runs to
    /// completion or to the client's request timeout.
    pub fn run(&self) -> u64 {
        let mut issued = 0;
        while !self.phase.is_stopped() {
            self.step();
            issued += 1;
        }
        debug!(worker = self.id, issued, "worker exiting");
        issued
    }

    /// One request/response cycle. Counts the outcome, and stores it when the
    /// request was issued during `Recording`. Returns the sample and whether it was stored.
    pub fn step(&self) -> (Sample, bool) {
        let phase_at_start = self.phase.current();
        let started_at = Instant::now();

        let result = self
            .builder
            .build()
            .and_then(|spec| self.client.send(&spec, self.builder.aux_header()));

        let (status, aux_metric) = match result {
            Ok(exchange) => (i32::from(exchange.status), exchange.aux_metric),
            Err(e) => {
                debug!(worker = self.id, error = %e, "request failed");
                (TRANSPORT_FAILURE_STATUS, None)
            }
        };

        let sample = Sample { started_at, latency: started_at.elapsed(), status, aux_metric };
        self.counters.record(sample.is_success());

        let recorded = phase_at_start == Phase::Recording;
        if recorded {
            self.store.append(sample);
        }
        (sample, recorded)
    }
}
