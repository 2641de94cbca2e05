//! Step-level event records.
//!
//! Every simulation step returns the events it produced as tagged variants.
//! The presentation layer renders them through `Display`, which emits the
//! compact single-token labels (`gen#3`, `replace#7`, `rej#4`, `start#O1`),
//! so nothing downstream ever parses strings back apart.

use std::fmt;

use serde::Serialize;

use crate::model::{DeviceId, ReportId};

/// One observable outcome of a simulation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StepEvent {
    /// Arrival admitted at the buffer tail. `position` is its queue index.
    Admitted { id: ReportId, position: usize },
    /// Arrival admitted by evicting a lower-priority resident.
    Evicted {
        id: ReportId,
        replaced: ReportId,
        /// The admitted report's resulting queue index.
        position: usize,
    },
    /// Arrival refused: buffer full with no lower-priority resident.
    Rejected { id: ReportId },
    /// A device pulled a batch from the buffer and booked service for it.
    Started {
        device: DeviceId,
        device_name: String,
        batch: Vec<ReportId>,
    },
}

impl fmt::Display for StepEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepEvent::Admitted { id, .. } => write!(f, "gen#{id}"),
            StepEvent::Evicted { position, .. } => write!(f, "replace#{position}"),
            StepEvent::Rejected { id } => write!(f, "rej#{id}"),
            StepEvent::Started { device_name, .. } => write!(f, "start#{device_name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_the_console_format() {
        let admitted = StepEvent::Admitted {
            id: ReportId(3),
            position: 0,
        };
        let evicted = StepEvent::Evicted {
            id: ReportId(9),
            replaced: ReportId(4),
            position: 7,
        };
        let rejected = StepEvent::Rejected { id: ReportId(11) };
        let started = StepEvent::Started {
            device: DeviceId(0),
            device_name: "O1".into(),
            batch: vec![ReportId(1), ReportId(2)],
        };

        assert_eq!(admitted.to_string(), "gen#3");
        assert_eq!(evicted.to_string(), "replace#7");
        assert_eq!(rejected.to_string(), "rej#11");
        assert_eq!(started.to_string(), "start#O1");
    }
}
