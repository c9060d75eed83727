use serde::{Deserialize, Serialize};

/// Axis-aligned box in source pixel coordinates (`x1, y1, x2, y2`).
///
/// On the wire this is a plain four-element array.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn is_finite(&self) -> bool {
        [self.x1, self.y1, self.x2, self.y2]
            .iter()
            .all(|v| v.is_finite())
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// A single detection as reported by the remote source.
///
/// Immutable once received. A detection without a `track_id` can be displayed
/// but is never admitted into aggregate statistics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class_id: u32,
    pub class_name: String,
    /// Native-precision score, nominally 0..=1.
    pub confidence: f64,
    #[serde(rename = "bbox", alias = "bounding_box")]
    pub bounding_box: BoundingBox,
    #[serde(default)]
    pub is_anomaly: bool,
    #[serde(default)]
    pub track_id: Option<u64>,
}

/// One fetch's worth of currently-visible detections plus stream metadata.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Source-side time of the inference that produced this snapshot.
    #[serde(default)]
    pub timestamp: f64,
    /// Detection count as reported by the source.
    #[serde(default)]
    pub num_detections: u64,
    pub detections: Vec<Detection>,
    #[serde(default)]
    pub inference_count: u64,
    #[serde(default)]
    pub inference_fps: f64,
    #[serde(default)]
    pub has_anomaly: bool,
    #[serde(default)]
    pub anomaly_count: u64,
}
