use serde::Serialize;

use super::result::{Detection, Snapshot};

/// Stream metadata and in-view detections from the last applied snapshot.
///
/// The default value stands for "no snapshot yet" and is inactive.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StreamStatus {
    pub timestamp: f64,
    pub num_detections: u64,
    pub inference_count: u64,
    pub inference_fps: f64,
    pub has_anomaly: bool,
    pub anomaly_count: u64,
    /// Everything in view, tracked or not.
    pub visible: Vec<Detection>,
}

impl StreamStatus {
    /// True once the source has run at least one inference.
    pub fn is_active(&self) -> bool {
        self.inference_count > 0
    }

    /// Uppercased name of every anomalous detection in view, in snapshot
    /// order. Repeats are kept: two bears in view give two names.
    pub fn anomaly_names(&self) -> Vec<String> {
        self.visible
            .iter()
            .filter(|d| d.is_anomaly)
            .map(|d| d.class_name.to_uppercase())
            .collect()
    }

    /// `ANOMALY DETECTED: ...` line, if anything anomalous is in view.
    pub fn anomaly_banner(&self) -> Option<String> {
        let names = self.anomaly_names();
        if names.is_empty() {
            None
        } else {
            Some(format!("ANOMALY DETECTED: {}", names.join(", ")))
        }
    }
}

impl From<Snapshot> for StreamStatus {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            timestamp: snapshot.timestamp,
            num_detections: snapshot.num_detections,
            inference_count: snapshot.inference_count,
            inference_fps: snapshot.inference_fps,
            has_anomaly: snapshot.has_anomaly,
            anomaly_count: snapshot.anomaly_count,
            visible: snapshot.detections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BoundingBox;

    fn det(name: &str, is_anomaly: bool) -> Detection {
        Detection {
            class_id: 0,
            class_name: name.to_string(),
            confidence: 0.7,
            bounding_box: BoundingBox::new(0.0, 0.0, 4.0, 4.0),
            is_anomaly,
            track_id: None,
        }
    }

    #[test]
    fn default_status_is_inactive() {
        let status = StreamStatus::default();
        assert!(!status.is_active());
        assert_eq!(status.anomaly_banner(), None);
    }

    #[test]
    fn pre_inference_snapshot_is_inactive() {
        let status = StreamStatus::from(Snapshot {
            detections: vec![],
            ..Snapshot::default()
        });
        assert!(!status.is_active());

        let status = StreamStatus::from(Snapshot {
            inference_count: 3,
            ..Snapshot::default()
        });
        assert!(status.is_active());
    }

    #[test]
    fn banner_names_every_anomalous_detection() {
        let status = StreamStatus::from(Snapshot {
            detections: vec![det("bear", true), det("person", false), det("bear", true)],
            inference_count: 1,
            has_anomaly: true,
            anomaly_count: 2,
            ..Snapshot::default()
        });
        assert_eq!(status.anomaly_names(), vec!["BEAR", "BEAR"]);
        assert_eq!(
            status.anomaly_banner().as_deref(),
            Some("ANOMALY DETECTED: BEAR, BEAR")
        );
    }
}
