//! Bounded priority buffer with evict-or-refuse admission.
//!
//! The buffer preserves insertion order. When full, an arrival may displace
//! the lowest-priority resident, but only a *strictly* lower one: ties never
//! evict, so equal-priority pending work cannot be starved by churn.
//!
//! Selection of the eviction victim is a linear scan over the queue. At the
//! capacities this system runs with (single digits to low tens) that beats
//! maintaining an indexed heap; the scan is the whole hot path.

use tracing::warn;

use crate::error::SimulationError;
use crate::model::{Report, ReportStatus};

/// Outcome of one admission attempt.
#[derive(Debug)]
pub enum Admission {
    /// Appended at the tail; `position` is the report's index in the queue.
    Admitted { position: usize },
    /// A strictly lower-priority resident was evicted to make room.
    /// `position` is the admitted report's resulting index.
    Displaced { position: usize, evicted: Report },
    /// Buffer full and no resident had lower priority. The incomer is
    /// handed back, already marked [`ReportStatus::Rejected`].
    Refused { report: Report },
}

/// Bounded holding area for pending reports.
pub struct PriorityBuffer {
    queue: Vec<Report>,
    capacity: usize,
}

impl PriorityBuffer {
    pub fn new(capacity: usize) -> Result<Self, SimulationError> {
        if capacity == 0 {
            return Err(SimulationError::Config(
                "buffer capacity must be at least 1".into(),
            ));
        }
        Ok(Self {
            queue: Vec::with_capacity(capacity),
            capacity,
        })
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot of the queued priorities in insertion order.
    pub fn priorities(&self) -> Vec<u8> {
        self.queue.iter().map(|r| r.priority.value()).collect()
    }

    /// Attempts to admit `report`.
    ///
    /// Below capacity the report is appended at the tail, so insertion order
    /// is preserved among equal priorities. At capacity the lowest-priority
    /// resident (first occurrence on ties) is evicted if it ranks strictly
    /// below the incomer; otherwise the incomer is refused and the queue is
    /// left untouched.
    pub fn enqueue(&mut self, mut report: Report) -> Admission {
        if self.queue.len() < self.capacity {
            self.queue.push(report);
            return Admission::Admitted {
                position: self.queue.len() - 1,
            };
        }

        // min_by_key keeps the first of equal elements, which is exactly the
        // insertion-order tie-break the admission policy requires.
        let lowest = self
            .queue
            .iter()
            .enumerate()
            .min_by_key(|(_, resident)| resident.priority)
            .map(|(index, _)| index);

        match lowest {
            Some(index) if self.queue[index].priority < report.priority => {
                let mut evicted = self.queue.remove(index);
                evicted.status = ReportStatus::Rejected;
                warn!(
                    evicted = %evicted.id,
                    evicted_priority = %evicted.priority,
                    incoming = %report.id,
                    incoming_priority = %report.priority,
                    "buffer full, displacing lowest-priority resident"
                );
                self.queue.push(report);
                Admission::Displaced {
                    position: self.queue.len() - 1,
                    evicted,
                }
            }
            _ => {
                report.status = ReportStatus::Rejected;
                Admission::Refused { report }
            }
        }
    }

    /// Removes and returns the next batch of work.
    ///
    /// With `batch_by_source` the head report's source is selected and every
    /// resident of that source is extracted, wherever it sits in the queue,
    /// in its original relative order. Without it only the head element is
    /// taken. Extracted reports transition to [`ReportStatus::InProgress`].
    pub fn pull_batch(&mut self, batch_by_source: bool) -> Vec<Report> {
        if self.queue.is_empty() {
            return Vec::new();
        }

        let mut batch = if batch_by_source {
            let source = self.queue[0].source;
            let drained = std::mem::take(&mut self.queue);
            let (batch, rest): (Vec<Report>, Vec<Report>) =
                drained.into_iter().partition(|r| r.source == source);
            self.queue = rest;
            batch
        } else {
            vec![self.queue.remove(0)]
        };

        for report in &mut batch {
            report.status = ReportStatus::InProgress;
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Priority, ReportId, SourceId};
    use proptest::prelude::*;

    fn report(id: u64, source: usize, priority: u8) -> Report {
        Report::new(
            ReportId(id),
            SourceId(source),
            Priority::new(priority).unwrap(),
            0.0,
        )
    }

    #[test]
    fn admits_in_insertion_order_below_capacity() {
        let mut buffer = PriorityBuffer::new(3).unwrap();
        for (i, priority) in [4u8, 1, 4].into_iter().enumerate() {
            match buffer.enqueue(report(i as u64, 0, priority)) {
                Admission::Admitted { position } => assert_eq!(position, i),
                other => panic!("expected plain admission, got {other:?}"),
            }
        }
        assert_eq!(buffer.priorities(), vec![4, 1, 4]);
    }

    #[test]
    fn full_buffer_evicts_strictly_lower_priority() {
        let mut buffer = PriorityBuffer::new(3).unwrap();
        for (i, priority) in [2u8, 3, 4].into_iter().enumerate() {
            buffer.enqueue(report(i as u64, 0, priority));
        }

        match buffer.enqueue(report(3, 0, 5)) {
            Admission::Displaced { position, evicted } => {
                assert_eq!(position, 2);
                assert_eq!(evicted.id, ReportId(0));
                assert_eq!(evicted.priority.value(), 2);
                assert_eq!(evicted.status, ReportStatus::Rejected);
            }
            other => panic!("expected displacement, got {other:?}"),
        }
        assert_eq!(buffer.priorities(), vec![3, 4, 5]);
    }

    #[test]
    fn full_buffer_refuses_when_no_resident_is_lower() {
        let mut buffer = PriorityBuffer::new(3).unwrap();
        for i in 0..3 {
            buffer.enqueue(report(i, 0, 3));
        }

        match buffer.enqueue(report(3, 0, 2)) {
            Admission::Refused { report } => {
                assert_eq!(report.id, ReportId(3));
                assert_eq!(report.status, ReportStatus::Rejected);
            }
            other => panic!("expected refusal, got {other:?}"),
        }
        // Equal priority never evicts either.
        match buffer.enqueue(report(4, 0, 3)) {
            Admission::Refused { .. } => {}
            other => panic!("expected refusal, got {other:?}"),
        }
        assert_eq!(buffer.priorities(), vec![3, 3, 3]);
    }

    #[test]
    fn eviction_tie_break_is_first_occurrence() {
        let mut buffer = PriorityBuffer::new(3).unwrap();
        buffer.enqueue(report(0, 0, 1));
        buffer.enqueue(report(1, 0, 1));
        buffer.enqueue(report(2, 0, 2));

        match buffer.enqueue(report(3, 0, 4)) {
            Admission::Displaced { evicted, .. } => assert_eq!(evicted.id, ReportId(0)),
            other => panic!("expected displacement, got {other:?}"),
        }
    }

    #[test]
    fn batch_pull_scans_the_whole_queue_for_the_head_source() {
        let mut buffer = PriorityBuffer::new(5).unwrap();
        buffer.enqueue(report(0, 7, 3));
        buffer.enqueue(report(1, 2, 3));
        buffer.enqueue(report(2, 7, 1));
        buffer.enqueue(report(3, 2, 5));

        let batch = buffer.pull_batch(true);
        let ids: Vec<u64> = batch.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![0, 2]);
        assert!(batch.iter().all(|r| r.status == ReportStatus::InProgress));
        assert_eq!(buffer.priorities(), vec![3, 5]);
    }

    #[test]
    fn head_only_pull_takes_a_single_report() {
        let mut buffer = PriorityBuffer::new(5).unwrap();
        buffer.enqueue(report(0, 1, 3));
        buffer.enqueue(report(1, 1, 4));

        let batch = buffer.pull_batch(false);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].id, ReportId(0));
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn pull_from_empty_buffer_is_empty() {
        let mut buffer = PriorityBuffer::new(1).unwrap();
        assert!(buffer.pull_batch(true).is_empty());
        assert!(buffer.pull_batch(false).is_empty());
    }

    #[test]
    fn zero_capacity_is_rejected_at_construction() {
        assert!(matches!(
            PriorityBuffer::new(0),
            Err(SimulationError::Config(_))
        ));
    }

    proptest! {
        #[test]
        fn occupancy_never_exceeds_capacity(
            ops in prop::collection::vec((1u8..=5, 0usize..3, any::<bool>()), 0..64),
        ) {
            let mut buffer = PriorityBuffer::new(4).unwrap();
            let mut next_id = 0u64;
            for (priority, source, pull) in ops {
                if pull {
                    buffer.pull_batch(true);
                } else {
                    buffer.enqueue(report(next_id, source, priority));
                    next_id += 1;
                }
                prop_assert!(buffer.len() <= buffer.capacity());
            }
        }

        #[test]
        fn below_capacity_every_arrival_is_admitted(
            priorities in prop::collection::vec(1u8..=5, 0..4),
        ) {
            let mut buffer = PriorityBuffer::new(4).unwrap();
            for (i, priority) in priorities.into_iter().enumerate() {
                prop_assert!(
                    matches!(
                        buffer.enqueue(report(i as u64, 0, priority)),
                        Admission::Admitted { .. }
                    ),
                    "expected arrival below capacity to be admitted"
                );
            }
        }
    }
}
