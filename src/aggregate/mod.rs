//! Count-once aggregation.
//!
//! Snapshots re-report every object still in view. `AggregateState` turns
//! that re-observation stream into admissions: each track id passes the
//! `AdmissionSet` once, and only then reaches the `Aggregator`.

mod admission;
mod stats;

pub use admission::AdmissionSet;
pub use stats::{Aggregator, ClassSummary, GlobalStats};

use crate::detect::Detection;

/// Deduplicator and aggregator state, reset together.
#[derive(Clone, Debug, Default)]
pub struct AggregateState {
    admissions: AdmissionSet,
    aggregator: Aggregator,
}

impl AggregateState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit every not-yet-seen tracked detection of one snapshot, in order.
    ///
    /// Returns the number of detections admitted.
    pub fn ingest(&mut self, detections: &[Detection]) -> usize {
        let fresh = self.admissions.admit_new(detections);
        for det in &fresh {
            self.aggregator.admit(det);
        }
        fresh.len()
    }

    /// Drop all admissions, summaries and totals.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn admissions(&self) -> &AdmissionSet {
        &self.admissions
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn summaries(&self) -> &[ClassSummary] {
        self.aggregator.summaries()
    }

    pub fn global(&self) -> &GlobalStats {
        self.aggregator.global()
    }
}
