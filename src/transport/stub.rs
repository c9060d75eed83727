use super::fetcher::SnapshotFetcher;
use crate::detect::{BoundingBox, Detection, Snapshot};
use crate::error::FetchError;

/// Classes cycled through by the synthetic scene: (class_id, name, anomalous).
const SCENE_CLASSES: [(u32, &str, bool); 4] = [
    (0, "person", false),
    (2, "car", false),
    (16, "dog", false),
    (21, "bear", true),
];

/// Polls each synthetic object stays in view.
const DWELL_TICKS: u64 = 4;
/// Polls between two object arrivals.
const ARRIVAL_TICKS: u64 = 2;
/// Every Nth object is reported without a track id.
const UNTRACKED_EVERY: u64 = 5;

/// Stub fetcher for `stub://` sources. Replays a deterministic scene.
///
/// Objects enter one at a time and stay in view for several polls, so the
/// same track id is re-observed across consecutive snapshots the way a real
/// tracker reports it.
pub struct StubFetcher {
    tick: u64,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self { tick: 0 }
    }

    fn object_at(object: u64, tick: u64) -> Detection {
        let (class_id, name, is_anomaly) =
            SCENE_CLASSES[(object % SCENE_CLASSES.len() as u64) as usize];
        let wobble = ((object * 37 + tick * 11) % 40) as f64 / 100.0;
        let x = 40.0 * (tick - object * ARRIVAL_TICKS) as f64 + 10.0 * object as f64;
        let track_id = if (object + 1) % UNTRACKED_EVERY == 0 {
            None
        } else {
            Some(object + 1)
        };
        Detection {
            class_id,
            class_name: name.to_string(),
            confidence: 0.55 + wobble,
            bounding_box: BoundingBox::new(x, 120.0, x + 80.0, 320.0),
            is_anomaly,
            track_id,
        }
    }
}

impl Default for StubFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotFetcher for StubFetcher {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn fetch(&mut self) -> Result<Snapshot, FetchError> {
        let tick = self.tick;
        self.tick += 1;

        let newest = tick / ARRIVAL_TICKS;
        let oldest = newest.saturating_sub(DWELL_TICKS / ARRIVAL_TICKS);
        let detections: Vec<Detection> = (oldest..=newest)
            .filter(|&object| {
                let enter = object * ARRIVAL_TICKS;
                enter <= tick && tick < enter + DWELL_TICKS
            })
            .map(|object| Self::object_at(object, tick))
            .collect();

        let anomaly_count = detections.iter().filter(|d| d.is_anomaly).count() as u64;
        Ok(Snapshot {
            timestamp: tick as f64 / 10.0,
            num_detections: detections.len() as u64,
            detections,
            inference_count: tick + 1,
            inference_fps: 10.0,
            has_anomaly: anomaly_count > 0,
            anomaly_count,
        })
    }
}
