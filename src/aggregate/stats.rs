use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::detect::Detection;

/// Best-so-far record for one class id.
///
/// Anomalous and non-anomalous detections of the same class share one
/// summary.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClassSummary {
    best_detection: Detection,
    seen_count: u64,
}

impl ClassSummary {
    fn first(detection: &Detection) -> Self {
        Self {
            best_detection: detection.clone(),
            seen_count: 1,
        }
    }

    pub fn class_id(&self) -> u32 {
        self.best_detection.class_id
    }

    pub fn class_name(&self) -> &str {
        &self.best_detection.class_name
    }

    /// Highest-confidence admitted detection of this class. Ties keep the
    /// earlier one.
    pub fn best_detection(&self) -> &Detection {
        &self.best_detection
    }

    pub fn seen_count(&self) -> u64 {
        self.seen_count
    }

    /// True when the best detection carries the anomaly flag.
    pub fn is_anomaly(&self) -> bool {
        self.best_detection.is_anomaly
    }
}

/// Running totals over every admitted detection.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GlobalStats {
    pub total_admitted: u64,
    pub confidence_sum: f64,
    pub max_detection: Option<Detection>,
    pub min_detection: Option<Detection>,
    /// Non-anomalous admissions per class id.
    pub object_counts: BTreeMap<u32, u64>,
    /// Anomalous admissions per class id.
    pub anomaly_counts: BTreeMap<u32, u64>,
}

impl GlobalStats {
    pub fn total_objects(&self) -> u64 {
        self.object_counts.values().sum()
    }

    pub fn total_anomalies(&self) -> u64 {
        self.anomaly_counts.values().sum()
    }

    pub fn average_confidence(&self) -> f64 {
        if self.total_admitted == 0 {
            0.0
        } else {
            self.confidence_sum / self.total_admitted as f64
        }
    }
}

/// Owns per-class summaries and global statistics.
///
/// Summaries keep first-admission order, which the view layer relies on for
/// stable sorting.
#[derive(Clone, Debug, Default)]
pub struct Aggregator {
    summaries: Vec<ClassSummary>,
    by_class: HashMap<u32, usize>,
    global: GlobalStats,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one detection. Only the pipeline calls this, after deduplication.
    pub(crate) fn admit(&mut self, detection: &Detection) {
        match self.by_class.get(&detection.class_id) {
            Some(&idx) => {
                let summary = &mut self.summaries[idx];
                summary.seen_count += 1;
                if detection.confidence > summary.best_detection.confidence {
                    summary.best_detection = detection.clone();
                }
            }
            None => {
                self.by_class
                    .insert(detection.class_id, self.summaries.len());
                self.summaries.push(ClassSummary::first(detection));
            }
        }

        let global = &mut self.global;
        global.total_admitted += 1;
        global.confidence_sum += detection.confidence;

        let new_max = global
            .max_detection
            .as_ref()
            .map_or(true, |max| detection.confidence > max.confidence);
        if new_max {
            global.max_detection = Some(detection.clone());
        }
        let new_min = global
            .min_detection
            .as_ref()
            .map_or(true, |min| detection.confidence < min.confidence);
        if new_min {
            global.min_detection = Some(detection.clone());
        }

        let counts = if detection.is_anomaly {
            &mut global.anomaly_counts
        } else {
            &mut global.object_counts
        };
        *counts.entry(detection.class_id).or_insert(0) += 1;
    }

    /// Summaries in first-admission order.
    pub fn summaries(&self) -> &[ClassSummary] {
        &self.summaries
    }

    pub fn summary(&self, class_id: u32) -> Option<&ClassSummary> {
        self.by_class.get(&class_id).map(|&idx| &self.summaries[idx])
    }

    pub fn global(&self) -> &GlobalStats {
        &self.global
    }
}
