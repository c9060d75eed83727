//! Detection snapshot parsing.
//!
//! Shared by the HTTP fetcher and the integration tests.

use crate::detect::Snapshot;
use crate::error::FetchError;

/// Parse a `/detections` JSON payload into a [`Snapshot`].
///
/// Returns `MalformedSnapshot` if:
/// - The JSON is malformed or `detections` is missing
/// - Any detection lacks `class_id`, `class_name`, `confidence` or a 4-element `bbox`
/// - Any confidence or box coordinate is not finite
///
/// A malformed snapshot is rejected whole, never partially.
pub fn parse_snapshot(payload: &[u8]) -> Result<Snapshot, FetchError> {
    let snapshot: Snapshot = serde_json::from_slice(payload)?;
    validate_snapshot(&snapshot)?;
    Ok(snapshot)
}

/// Check the numeric fields serde cannot vouch for.
pub fn validate_snapshot(snapshot: &Snapshot) -> Result<(), FetchError> {
    for (idx, det) in snapshot.detections.iter().enumerate() {
        if !det.confidence.is_finite() {
            return Err(FetchError::MalformedSnapshot(format!(
                "detection {} has non-finite confidence",
                idx
            )));
        }
        if !det.bounding_box.is_finite() {
            return Err(FetchError::MalformedSnapshot(format!(
                "detection {} has non-finite bbox",
                idx
            )));
        }
    }
    Ok(())
}
