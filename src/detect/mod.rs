mod result;
mod status;

pub use result::{BoundingBox, Detection, Snapshot};
pub use status::StreamStatus;
