//! Read-only views derived from aggregate state.
//!
//! Nothing here is cached. Every view is recomputed from the current state
//! on request.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::aggregate::{AggregateState, ClassSummary, GlobalStats};
use crate::detect::{Detection, StreamStatus};

/// One class's share of a counts map.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FrequencyEntry {
    pub class_id: u32,
    /// Fraction in 0..=1 when the divisor covers the map.
    pub frequency: f64,
}

/// One summary per admitted class, in first-admission order.
pub fn grouped_by_class(state: &AggregateState) -> Vec<ClassSummary> {
    state.summaries().to_vec()
}

/// Stable sort placing anomalous summaries first.
pub fn sorted_by_anomaly_first(summaries: &[ClassSummary]) -> Vec<ClassSummary> {
    let mut sorted = summaries.to_vec();
    // sort_by_key is stable, so insertion order survives within each group.
    sorted.sort_by_key(|s| !s.is_anomaly());
    sorted
}

pub fn anomalies_only(summaries: &[ClassSummary]) -> Vec<ClassSummary> {
    sorted_by_anomaly_first(summaries)
        .into_iter()
        .filter(|s| s.is_anomaly())
        .collect()
}

/// Normalize every entry of `counts` by `divisor`.
///
/// Empty when `divisor` is zero.
pub fn frequency_table(counts: &BTreeMap<u32, u64>, divisor: u64) -> Vec<FrequencyEntry> {
    if divisor == 0 {
        return Vec::new();
    }
    counts
        .iter()
        .map(|(&class_id, &count)| FrequencyEntry {
            class_id,
            frequency: count as f64 / divisor as f64,
        })
        .collect()
}

/// Percentage for `class_id` in `table`, rounded to two decimals. Zero when
/// the class is absent.
pub fn frequency_of(class_id: u32, table: &[FrequencyEntry]) -> f64 {
    table
        .iter()
        .find(|e| e.class_id == class_id)
        .map_or(0.0, |e| round2(e.frequency * 100.0))
}

/// Confidence as a display percentage, clamped to 0..=100.
pub fn confidence_percent(confidence: f64) -> f64 {
    confidence.clamp(0.0, 1.0) * 100.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The four frequency tables a dashboard shows.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FrequencyTables {
    pub objects_by_objects: Vec<FrequencyEntry>,
    pub anomalies_by_anomalies: Vec<FrequencyEntry>,
    pub objects_by_total: Vec<FrequencyEntry>,
    pub anomalies_by_total: Vec<FrequencyEntry>,
}

impl FrequencyTables {
    pub fn from_global(global: &GlobalStats) -> Self {
        Self {
            objects_by_objects: frequency_table(&global.object_counts, global.total_objects()),
            anomalies_by_anomalies: frequency_table(
                &global.anomaly_counts,
                global.total_anomalies(),
            ),
            objects_by_total: frequency_table(&global.object_counts, global.total_admitted),
            anomalies_by_total: frequency_table(&global.anomaly_counts, global.total_admitted),
        }
    }
}

/// Detections currently in view, collapsed by class name.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VisibleClass {
    pub class_name: String,
    pub count: usize,
    pub best_confidence: f64,
    pub is_anomaly: bool,
}

/// Group a snapshot's detections by class name, in order of first
/// appearance. Untracked detections are included; this is what is on
/// screen, not what was counted.
pub fn visible_by_class(detections: &[Detection]) -> Vec<VisibleClass> {
    let mut groups: Vec<VisibleClass> = Vec::new();
    for det in detections {
        match groups.iter_mut().find(|g| g.class_name == det.class_name) {
            Some(group) => {
                group.count += 1;
                group.is_anomaly |= det.is_anomaly;
                if det.confidence > group.best_confidence {
                    group.best_confidence = det.confidence;
                }
            }
            None => groups.push(VisibleClass {
                class_name: det.class_name.clone(),
                count: 1,
                best_confidence: det.confidence,
                is_anomaly: det.is_anomaly,
            }),
        }
    }
    groups
}

/// Everything a dashboard renders, taken from one consistent state.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DashboardView {
    pub summaries: Vec<ClassSummary>,
    pub anomalies: Vec<ClassSummary>,
    pub global: GlobalStats,
    pub average_confidence: f64,
    pub frequencies: FrequencyTables,
    pub visible: Vec<VisibleClass>,
    pub stream: StreamStatus,
    pub last_fetch_failed: bool,
    pub last_error: Option<String>,
}

impl DashboardView {
    pub fn build(state: &AggregateState) -> Self {
        let summaries = sorted_by_anomaly_first(state.summaries());
        let anomalies = anomalies_only(&summaries);
        let global = state.global().clone();
        Self {
            average_confidence: global.average_confidence(),
            frequencies: FrequencyTables::from_global(&global),
            summaries,
            anomalies,
            global,
            ..Self::default()
        }
    }
}
