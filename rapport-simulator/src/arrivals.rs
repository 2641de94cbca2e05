//! Stochastic arrival rounds driven by a fractional accumulator.

use tracing::trace;

use rapport_core::buffer::Admission;
use rapport_core::events::StepEvent;
use rapport_core::model::{Report, ReportId, SourceId};

use crate::Simulation;

/// Converts a continuous arrival rate into whole arrivals per fixed step.
///
/// Each step accumulates `rate * delta`; the integer part becomes this
/// step's arrival count and the fractional remainder carries over. Over many
/// steps the produced count converges on the nominal rate without drawing
/// per-arrival inter-arrival times: a deterministic-rounding stand-in for a
/// Poisson process whose granularity follows the step width.
#[derive(Debug)]
pub(crate) struct ArrivalAccumulator {
    rate: f64,
    carry: f64,
}

impl ArrivalAccumulator {
    pub(crate) fn new(rate: f64) -> Self {
        Self { rate, carry: 0.0 }
    }

    /// Arrival count for one step of width `delta`.
    pub(crate) fn arrivals_for_step(&mut self, delta: f64) -> usize {
        self.carry += self.rate * delta;
        let count = self.carry as usize;
        self.carry -= count as f64;
        count
    }
}

impl Simulation {
    /// One arrival round: draw this step's arrivals and submit each to the
    /// buffer, recording admission, displacement, or refusal.
    pub(crate) fn generate_reports(&mut self) -> Vec<StepEvent> {
        let count = self.arrivals.arrivals_for_step(self.delta);
        let mut events = Vec::with_capacity(count);

        for _ in 0..count {
            let source = SourceId(self.arrival_model.pick_source(self.sources.len()));
            let priority = self.arrival_model.pick_priority();
            let id = ReportId(self.next_report_id);
            self.next_report_id += 1;

            let report = Report::new(id, source, priority, self.clock.now());
            self.generated += 1;
            self.source_tallies[source.0].generated += 1;
            trace!(
                report = %id,
                source = %self.sources[source.0].name,
                priority = %priority,
                "arrival"
            );

            match self.buffer.enqueue(report) {
                Admission::Admitted { position } => {
                    events.push(StepEvent::Admitted { id, position });
                }
                Admission::Displaced { position, evicted } => {
                    // The victim counts as rejected, against its own source.
                    self.rejected += 1;
                    self.source_tallies[evicted.source.0].rejected += 1;
                    let replaced = evicted.id;
                    self.rejected_reports.push(evicted);
                    events.push(StepEvent::Evicted {
                        id,
                        replaced,
                        position,
                    });
                }
                Admission::Refused { report } => {
                    self.rejected += 1;
                    self.source_tallies[report.source.0].rejected += 1;
                    self.rejected_reports.push(report);
                    events.push(StepEvent::Rejected { id });
                }
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_rate_yields_one_arrival_every_second_step() {
        let mut acc = ArrivalAccumulator::new(1.0);
        let counts: Vec<usize> = (0..6).map(|_| acc.arrivals_for_step(0.5)).collect();
        assert_eq!(counts, vec![0, 1, 0, 1, 0, 1]);
    }

    #[test]
    fn fractional_remainder_carries_across_steps() {
        let mut acc = ArrivalAccumulator::new(2.5);
        let counts: Vec<usize> = (0..4).map(|_| acc.arrivals_for_step(1.0)).collect();
        // 2.5 -> 2 carry .5, 3.0 -> 3 carry 0, repeat.
        assert_eq!(counts, vec![2, 3, 2, 3]);
    }

    #[test]
    fn zero_rate_never_produces_arrivals() {
        let mut acc = ArrivalAccumulator::new(0.0);
        for _ in 0..100 {
            assert_eq!(acc.arrivals_for_step(1.0), 0);
        }
    }

    #[test]
    fn long_run_count_converges_on_the_nominal_rate() {
        let mut acc = ArrivalAccumulator::new(0.6);
        let total: usize = (0..10_000).map(|_| acc.arrivals_for_step(0.5)).sum();
        // 0.6 arrivals per unit over 5000 units of time.
        assert!((total as i64 - 3000).abs() <= 1);
    }
}
