//! Detection source access.
//!
//! This module provides the `SnapshotFetcher` seam between the poll loop and
//! the remote detection source, the HTTP and stub implementations, and the
//! shared snapshot parser.

mod fetcher;
mod http;
pub mod snapshot;
mod stub;

pub use fetcher::{fetcher_for_url, SnapshotFetcher};
pub use http::HttpSnapshotFetcher;
pub use snapshot::{parse_snapshot, validate_snapshot};
pub use stub::StubFetcher;
