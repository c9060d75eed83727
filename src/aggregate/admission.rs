use std::collections::HashSet;

use crate::detect::Detection;

/// Track ids that have already been counted.
///
/// Grows monotonically; only a full state reset clears it.
#[derive(Clone, Debug, Default)]
pub struct AdmissionSet {
    admitted: HashSet<u64>,
}

impl AdmissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter `detections` down to the ones seen for the first time.
    ///
    /// Walks the snapshot in order. Untracked detections are dropped, as are
    /// track ids already admitted (including earlier in the same snapshot).
    /// Every forwarded track id is recorded before returning.
    pub fn admit_new<'a>(&mut self, detections: &'a [Detection]) -> Vec<&'a Detection> {
        let mut fresh = Vec::new();
        for det in detections {
            let Some(track_id) = det.track_id else {
                continue;
            };
            if self.admitted.insert(track_id) {
                fresh.push(det);
            }
        }
        fresh
    }

    pub fn contains(&self, track_id: u64) -> bool {
        self.admitted.contains(&track_id)
    }

    pub fn len(&self) -> usize {
        self.admitted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.admitted.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BoundingBox;

    fn det(track_id: Option<u64>) -> Detection {
        Detection {
            class_id: 1,
            class_name: "bicycle".to_string(),
            confidence: 0.5,
            bounding_box: BoundingBox::new(0.0, 0.0, 1.0, 1.0),
            is_anomaly: false,
            track_id,
        }
    }

    #[test]
    fn untracked_detections_never_admitted() {
        let mut set = AdmissionSet::new();
        let dets = vec![det(None), det(None)];
        assert!(set.admit_new(&dets).is_empty());
        assert!(set.is_empty());
    }

    #[test]
    fn repeat_within_snapshot_forwarded_once() {
        let mut set = AdmissionSet::new();
        let dets = vec![det(Some(3)), det(Some(3)), det(Some(4))];
        let fresh = set.admit_new(&dets);
        let ids: Vec<_> = fresh.iter().map(|d| d.track_id).collect();
        assert_eq!(ids, vec![Some(3), Some(4)]);
    }

    #[test]
    fn repeat_across_snapshots_forwarded_once() {
        let mut set = AdmissionSet::new();
        let first = vec![det(Some(7))];
        let second = vec![det(Some(7)), det(Some(8))];
        assert_eq!(set.admit_new(&first).len(), 1);
        let fresh = set.admit_new(&second);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].track_id, Some(8));
        assert!(set.contains(7));
        assert_eq!(set.len(), 2);
    }
}
