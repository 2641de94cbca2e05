//! On-demand statistics over the simulation's accumulated records.
//!
//! Nothing here is cached: every query walks the same underlying records, so
//! repeated calls without an intervening step return identical values.

use serde::Serialize;

/// Per-source breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceStats {
    pub name: String,
    pub generated: u64,
    pub rejected: u64,
    pub completed: u64,
    pub average_waiting_time: f64,
    pub average_service_time: f64,
}

/// Per-device breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceStats {
    pub name: String,
    pub processed: u64,
    pub busy_time: f64,
    pub utilization_percent: f64,
}

/// Cumulative run summary, with per-source and per-device breakdowns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub generated: u64,
    pub started: u64,
    pub completed: u64,
    pub rejected: u64,
    pub rejection_percent: f64,
    pub sources: Vec<SourceStats>,
    pub devices: Vec<DeviceStats>,
}

/// Mean of a stream of samples, 0.0 for an empty stream.
pub(crate) fn mean<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let mut sum = 0.0;
    let mut count = 0u64;
    for value in values {
        sum += value;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Busy-time share of the elapsed clock, as a percentage capped at 100.
///
/// The cap matters: a device booked right before the run ends carries
/// `busy_until` past the final clock value, and uncapped accounting would
/// report more than full occupancy.
pub(crate) fn utilization_percent(busy_time: f64, clock: f64) -> f64 {
    if clock <= 0.0 {
        0.0
    } else {
        (busy_time / clock * 100.0).min(100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_empty_stream_is_zero() {
        assert_eq!(mean(std::iter::empty()), 0.0);
    }

    #[test]
    fn mean_of_samples() {
        assert_eq!(mean([1.0, 2.0, 6.0]), 3.0);
    }

    #[test]
    fn utilization_is_zero_before_the_clock_moves() {
        assert_eq!(utilization_percent(3.0, 0.0), 0.0);
    }

    #[test]
    fn utilization_is_capped_at_full_occupancy() {
        assert_eq!(utilization_percent(15.0, 10.0), 100.0);
        assert_eq!(utilization_percent(5.0, 10.0), 50.0);
    }
}
