/*!
# rapport-simulator

Discrete-event engine for the report-processing queueing network: reports
arrive stochastically from sources, wait in a bounded priority buffer, and
are served in same-source batches by a pool of devices.

## Key Components:
- **Fixed-step clock:** one `step()` advances simulated time by `delta`,
  runs an arrival round, then a dispatch round.
- **Arrival accumulator:** deterministic-rounding conversion of a
  continuous rate into whole arrivals per step.
- **Sampling models:** seedable source/priority/service-time draws for
  reproducible runs.
- **State hash:** a running BLAKE3 digest of the event log, so two runs of
  the same seed can be compared bit for bit.

The engine never loops on its own; a caller drives it:

```no_run
use rapport_config::SimulationConfig;
use rapport_simulator::Simulation;

let mut sim = Simulation::new(&SimulationConfig::default()).unwrap();
while !sim.is_complete() {
    for event in sim.step().unwrap() {
        println!("{event}");
    }
}
println!("{:?}", sim.summary());
```
*/

use tracing::debug;

use rapport_config::SimulationConfig;
use rapport_core::buffer::PriorityBuffer;
use rapport_core::events::StepEvent;
use rapport_core::model::{Device, DeviceId, Report, Source, SourceId};
use rapport_core::time::SimClock;
use rapport_core::SimulationError;

mod arrivals;
mod dispatch;
pub mod sampling;
pub mod stats;

use crate::arrivals::ArrivalAccumulator;
use crate::sampling::{ArrivalModel, ServiceModel, UniformArrivalModel, UniformServiceModel};
use crate::stats::{mean, utilization_percent, DeviceStats, SourceStats, Summary};

/// Per-source running totals, keyed by [`SourceId`] index.
#[derive(Debug, Default)]
struct SourceTally {
    generated: u64,
    rejected: u64,
    /// Indices into the engine's completed-report list. Back-references,
    /// not owners: the list owns the reports.
    completed: Vec<usize>,
}

/// Per-device running totals, keyed by [`DeviceId`] index.
#[derive(Debug, Default)]
struct DeviceTally {
    processed: u64,
    busy_time: f64,
}

/// The simulation engine. Owns every piece of mutable state and is driven
/// synchronously by a single caller; there is no internal looping, timing,
/// or parallelism.
pub struct Simulation {
    duration: f64,
    delta: f64,
    clock: SimClock,
    buffer: PriorityBuffer,
    devices: Vec<Device>,
    sources: Vec<Source>,
    arrivals: ArrivalAccumulator,
    arrival_model: Box<dyn ArrivalModel>,
    service_model: Box<dyn ServiceModel>,
    next_report_id: u64,
    generated: u64,
    started: u64,
    completed: u64,
    rejected: u64,
    completed_reports: Vec<Report>,
    rejected_reports: Vec<Report>,
    source_tallies: Vec<SourceTally>,
    device_tallies: Vec<DeviceTally>,
    state_hasher: blake3::Hasher,
}

impl Simulation {
    /// Builds an engine from a validated configuration.
    ///
    /// The configuration is re-validated here so a hand-assembled
    /// `SimulationConfig` that skipped the loader still fails fast instead
    /// of producing a degenerate run.
    pub fn new(config: &SimulationConfig) -> Result<Self, SimulationError> {
        config
            .ensure_valid()
            .map_err(|e| SimulationError::Config(e.to_string()))?;

        let devices = (0..config.devices)
            .map(|i| Device::new(DeviceId(i), format!("O{}", i + 1)))
            .collect::<Vec<_>>();
        let sources = (0..config.sources)
            .map(|i| Source::new(SourceId(i), format!("S{}", i + 1)))
            .collect::<Vec<_>>();

        Ok(Self {
            duration: config.duration,
            delta: config.delta,
            clock: SimClock::new(),
            buffer: PriorityBuffer::new(config.buffer_size)?,
            source_tallies: (0..sources.len()).map(|_| SourceTally::default()).collect(),
            device_tallies: (0..devices.len()).map(|_| DeviceTally::default()).collect(),
            devices,
            sources,
            arrivals: ArrivalAccumulator::new(config.lambda_rate),
            arrival_model: Box::new(UniformArrivalModel::new(config.seed)),
            service_model: Box::new(UniformServiceModel::new(
                config.service_range.min,
                config.service_range.max,
                config.seed.map(|s| s.wrapping_add(1)),
            )),
            next_report_id: 0,
            generated: 0,
            started: 0,
            completed: 0,
            rejected: 0,
            completed_reports: Vec::new(),
            rejected_reports: Vec::new(),
            state_hasher: blake3::Hasher::new(),
        })
    }

    /// Swaps the arrival sampling model.
    pub fn set_arrival_model(&mut self, model: Box<dyn ArrivalModel>) {
        self.arrival_model = model;
    }

    /// Swaps the service-time sampling model.
    pub fn set_service_model(&mut self, model: Box<dyn ServiceModel>) {
        self.service_model = model;
    }

    /// Advances the clock by one step: arrival round, then dispatch round.
    ///
    /// Generation precedes dispatch within the step, so a report can arrive
    /// and start service on the same tick when a device is free. Returns the
    /// step's events in occurrence order.
    pub fn step(&mut self) -> Result<Vec<StepEvent>, SimulationError> {
        self.clock.advance(self.delta);

        let mut events = self.generate_reports();
        events.extend(self.process_devices());

        if self.buffer.len() > self.buffer.capacity() {
            return Err(SimulationError::InternalFault(format!(
                "buffer occupancy {} exceeds capacity {}",
                self.buffer.len(),
                self.buffer.capacity()
            )));
        }

        self.state_hasher
            .update(&self.clock.now().to_bits().to_le_bytes());
        for event in &events {
            self.state_hasher.update(event.to_string().as_bytes());
        }

        debug!(
            clock = self.clock.now(),
            events = events.len(),
            queued = self.buffer.len(),
            "step complete"
        );
        Ok(events)
    }

    pub fn clock(&self) -> f64 {
        self.clock.now()
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// True once the clock has covered the configured duration.
    pub fn is_complete(&self) -> bool {
        self.clock.now() >= self.duration
    }

    /// Human-readable snapshot of the queued priorities.
    pub fn buffer_state(&self) -> String {
        format!("{} -> {:?}", self.buffer.len(), self.buffer.priorities())
    }

    /// Human-readable free/busy snapshot of every device.
    pub fn devices_state(&self) -> String {
        let clock = self.clock.now();
        self.devices
            .iter()
            .map(|d| {
                if d.is_free(clock) {
                    format!("{}:free", d.name)
                } else {
                    format!("{}:busy→{:.1}", d.name, d.busy_until)
                }
            })
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Share of arrivals rejected so far, in `[0, 100]`.
    pub fn rejection_percent(&self) -> f64 {
        if self.generated == 0 {
            0.0
        } else {
            self.rejected as f64 / self.generated as f64 * 100.0
        }
    }

    /// Mean wait between submission and service start over completed
    /// reports. 0.0 while nothing has completed.
    pub fn average_waiting_time(&self) -> f64 {
        mean(self.completed_reports.iter().filter_map(Report::waiting_time))
    }

    /// Mean booked service duration over completed reports. 0.0 while
    /// nothing has completed.
    pub fn average_service_time(&self) -> f64 {
        mean(self.completed_reports.iter().filter_map(Report::service_time))
    }

    /// Busy-time share of the elapsed clock for one device, capped at 100.
    pub fn device_utilization(&self, device: DeviceId) -> f64 {
        self.device_tallies
            .get(device.0)
            .map_or(0.0, |tally| utilization_percent(tally.busy_time, self.clock.now()))
    }

    /// Completed reports in completion order.
    pub fn completed_reports(&self) -> &[Report] {
        &self.completed_reports
    }

    /// Reports refused at admission or displaced from the buffer.
    pub fn rejected_reports(&self) -> &[Report] {
        &self.rejected_reports
    }

    /// Hex digest of the event log so far. Two runs with the same seed and
    /// configuration produce the same digest at every point in time.
    pub fn state_hash(&self) -> String {
        hex::encode(self.state_hasher.clone().finalize().as_bytes())
    }

    /// Cumulative summary, derived on demand from the underlying records.
    pub fn summary(&self) -> Summary {
        let sources = self
            .sources
            .iter()
            .map(|source| {
                let tally = &self.source_tallies[source.id.0];
                let completed = |f: fn(&Report) -> Option<f64>| {
                    tally
                        .completed
                        .iter()
                        .filter_map(move |&i| f(&self.completed_reports[i]))
                };
                SourceStats {
                    name: source.name.clone(),
                    generated: tally.generated,
                    rejected: tally.rejected,
                    completed: tally.completed.len() as u64,
                    average_waiting_time: mean(completed(Report::waiting_time)),
                    average_service_time: mean(completed(Report::service_time)),
                }
            })
            .collect();

        let devices = self
            .devices
            .iter()
            .map(|device| {
                let tally = &self.device_tallies[device.id.0];
                DeviceStats {
                    name: device.name.clone(),
                    processed: tally.processed,
                    busy_time: tally.busy_time,
                    utilization_percent: utilization_percent(tally.busy_time, self.clock.now()),
                }
            })
            .collect();

        Summary {
            generated: self.generated,
            started: self.started,
            completed: self.completed,
            rejected: self.rejected,
            rejection_percent: self.rejection_percent(),
            sources,
            devices,
        }
    }
}
