//! Entity records for the report-processing network.
//!
//! These are passive data carriers: identity plus lifecycle fields. Running
//! totals (generated/rejected/completed counts, busy time) live in tables
//! owned by the simulation engine and keyed by the id newtypes below, so an
//! entity can be referenced from several collections without any shared
//! mutable state hanging off it.

use std::fmt;

use serde::Serialize;

use crate::error::SimulationError;

/// Sequential identity of a generated report.
///
/// Ids are handed out in arrival order starting at 0, so a report's id is
/// also its global arrival index in event labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ReportId(pub u64);

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a configured source (`S1` has id 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SourceId(pub usize);

/// Index of a registered device (`O1` has id 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DeviceId(pub usize);

/// Report priority in `1..=5`, where 5 is the most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Priority(u8);

impl Priority {
    pub const MIN: Priority = Priority(1);
    pub const MAX: Priority = Priority(5);

    pub fn new(value: u8) -> Result<Self, SimulationError> {
        if (Self::MIN.0..=Self::MAX.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(SimulationError::Config(format!(
                "priority must be in 1..=5, got {value}"
            )))
        }
    }

    /// Clamps an out-of-band value into the valid `1..=5` band.
    pub fn saturating_from(value: u8) -> Self {
        Self(value.clamp(Self::MIN.0, Self::MAX.0))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a report from submission to one of the terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReportStatus {
    /// Waiting in the buffer.
    Pending,
    /// Pulled into a device batch, service not yet booked.
    InProgress,
    /// Served; `start_time` and `end_time` are set.
    Done,
    /// Refused at admission or evicted by a higher-priority arrival.
    Rejected,
}

/// A unit of work submitted by a source.
///
/// `start_time`/`end_time` stay `None` while the report is pending. Both are
/// stamped together when a device books the batch: completion is recorded
/// synchronously at service start, not awaited.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub id: ReportId,
    pub source: SourceId,
    pub priority: Priority,
    pub status: ReportStatus,
    pub submitted_time: f64,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
}

impl Report {
    pub fn new(id: ReportId, source: SourceId, priority: Priority, submitted_time: f64) -> Self {
        Self {
            id,
            source,
            priority,
            status: ReportStatus::Pending,
            submitted_time,
            start_time: None,
            end_time: None,
        }
    }

    /// Time spent waiting in the buffer, defined once service has started.
    pub fn waiting_time(&self) -> Option<f64> {
        self.start_time.map(|start| start - self.submitted_time)
    }

    /// Booked service duration, defined once service has started.
    pub fn service_time(&self) -> Option<f64> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}

/// An originator of reports (`S1`, `S2`, ...). Created once at setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Source {
    pub id: SourceId,
    pub name: String,
}

impl Source {
    pub fn new(id: SourceId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A server that processes one batch of reports at a time (`O1`, `O2`, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    /// Absolute time at which the device frees up again.
    pub busy_until: f64,
}

impl Device {
    pub fn new(id: DeviceId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            busy_until: 0.0,
        }
    }

    pub fn is_free(&self, clock: f64) -> bool {
        self.busy_until <= clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_accepts_declared_band() {
        for value in 1..=5 {
            assert_eq!(Priority::new(value).unwrap().value(), value);
        }
        assert!(Priority::new(0).is_err());
        assert!(Priority::new(6).is_err());
    }

    #[test]
    fn priority_saturates_out_of_band_values() {
        assert_eq!(Priority::saturating_from(0), Priority::MIN);
        assert_eq!(Priority::saturating_from(3).value(), 3);
        assert_eq!(Priority::saturating_from(9), Priority::MAX);
    }

    #[test]
    fn fresh_report_has_no_service_timestamps() {
        let report = Report::new(ReportId(0), SourceId(0), Priority::MIN, 1.5);
        assert_eq!(report.status, ReportStatus::Pending);
        assert_eq!(report.waiting_time(), None);
        assert_eq!(report.service_time(), None);
    }

    #[test]
    fn waiting_and_service_times_derive_from_timestamps() {
        let mut report = Report::new(ReportId(0), SourceId(0), Priority::MAX, 1.0);
        report.start_time = Some(3.0);
        report.end_time = Some(7.5);
        report.status = ReportStatus::Done;
        assert_eq!(report.waiting_time(), Some(2.0));
        assert_eq!(report.service_time(), Some(4.5));
    }

    #[test]
    fn device_is_free_at_exactly_busy_until() {
        let mut device = Device::new(DeviceId(0), "O1");
        assert!(device.is_free(0.0));
        device.busy_until = 4.0;
        assert!(!device.is_free(3.9));
        assert!(device.is_free(4.0));
    }
}
