//! Device dispatch: matching free devices to queued batches.

use tracing::trace;

use rapport_core::events::StepEvent;
use rapport_core::model::ReportStatus;

use crate::Simulation;

impl Simulation {
    /// One dispatch round.
    ///
    /// Devices are scanned in registration order. Each device that is free
    /// at the current clock pulls a same-source batch from the buffer and
    /// books a single sampled service duration for the whole batch: every
    /// member shares the same start and end timestamps and the device's
    /// busy-time grows by that one duration, not once per report.
    pub(crate) fn process_devices(&mut self) -> Vec<StepEvent> {
        let mut events = Vec::new();
        let clock = self.clock.now();

        for device in &mut self.devices {
            if !device.is_free(clock) {
                continue;
            }

            let batch = self.buffer.pull_batch(true);
            if batch.is_empty() {
                continue;
            }

            let service_time = self.service_model.sample();
            device.busy_until = clock + service_time;

            let tally = &mut self.device_tallies[device.id.0];
            tally.busy_time += service_time;
            tally.processed += batch.len() as u64;
            self.started += batch.len() as u64;

            let mut batch_ids = Vec::with_capacity(batch.len());
            for mut report in batch {
                report.start_time = Some(clock);
                report.end_time = Some(clock + service_time);
                report.status = ReportStatus::Done;

                self.completed += 1;
                batch_ids.push(report.id);
                self.source_tallies[report.source.0]
                    .completed
                    .push(self.completed_reports.len());
                self.completed_reports.push(report);
            }

            trace!(
                device = %device.name,
                batch = batch_ids.len(),
                service_time,
                "batch booked"
            );
            events.push(StepEvent::Started {
                device: device.id,
                device_name: device.name.clone(),
                batch: batch_ids,
            });
        }

        events
    }
}
