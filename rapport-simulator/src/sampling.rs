//! Sampling models for arrivals and service durations.
//!
//! Models are pluggable and seedable so a run can be reproduced bit for bit:
//! hand every model a seed and the whole simulation becomes a pure function
//! of its configuration.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use rapport_core::model::Priority;

fn seeded(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    }
}

/// Draws the attributes of each arrival.
pub trait ArrivalModel: Send {
    /// Index of the originating source, in `0..sources`.
    fn pick_source(&mut self, sources: usize) -> usize;

    /// Priority of the arrival.
    fn pick_priority(&mut self) -> Priority;
}

/// Uniform arrival mix: source uniform over the configured pool, priority
/// from a truncated uniform draw over `[1, 5)`.
///
/// The truncation means the top priority is never *generated*: a 5 can only
/// enter the system through an externally submitted report. Admission still
/// handles the full `1..=5` band.
#[derive(Debug)]
pub struct UniformArrivalModel {
    rng: SmallRng,
}

impl UniformArrivalModel {
    pub fn new(seed: Option<u64>) -> Self {
        Self { rng: seeded(seed) }
    }
}

impl ArrivalModel for UniformArrivalModel {
    fn pick_source(&mut self, sources: usize) -> usize {
        self.rng.random_range(0..sources)
    }

    fn pick_priority(&mut self) -> Priority {
        let raw: f64 = self.rng.random_range(1.0..5.0);
        Priority::saturating_from(raw as u8)
    }
}

/// Draws the single service duration a device applies to one batch.
pub trait ServiceModel: Send {
    fn sample(&mut self) -> f64;
}

/// Uniform service duration over a configured `[min, max)` range.
#[derive(Debug)]
pub struct UniformServiceModel {
    min: f64,
    max: f64,
    rng: SmallRng,
}

impl UniformServiceModel {
    pub fn new(min: f64, max: f64, seed: Option<u64>) -> Self {
        Self {
            min,
            max,
            rng: seeded(seed),
        }
    }
}

impl ServiceModel for UniformServiceModel {
    fn sample(&mut self) -> f64 {
        if self.min >= self.max {
            // Degenerate range, e.g. min == max.
            return self.min;
        }
        self.rng.random_range(self.min..self.max)
    }
}

/// Constant service duration (for baselines and deterministic tests).
#[derive(Debug, Clone, Copy)]
pub struct FixedServiceModel(pub f64);

impl ServiceModel for FixedServiceModel {
    fn sample(&mut self) -> f64 {
        self.0
    }
}
