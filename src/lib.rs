//! Detection Tally
//!
//! Live, count-once statistics over a polled object-detection stream.
//!
//! # Architecture
//!
//! Data flows one way:
//!
//! 1. **Fetch** (`transport`): one request to the detection source per tick.
//! 2. **Deduplicate** (`aggregate::AdmissionSet`): each track id passes once.
//! 3. **Aggregate** (`aggregate::Aggregator`): per-class bests, totals,
//!    extremes and anomaly/object counts.
//! 4. **View** (`view`): read-only derivations recomputed on demand.
//!
//! The `poll` state machine drives steps 1-3 with at most one fetch in
//! flight, and `Engine` ties it to a single lock-guarded state.
//!
//! # Module Structure
//!
//! - `detect`: Detection and Snapshot types
//! - `transport`: Snapshot fetchers (HTTP, stub) and wire parsing
//! - `aggregate`: Admission set and aggregator
//! - `poll`: Poll loop lifecycle
//! - `engine`: Engine facade, fetch health, stream status
//! - `view` / `report`: Derived views and text rendering
//! - `config`: Monitor configuration

pub mod aggregate;
pub mod config;
pub mod detect;
pub mod engine;
pub mod error;
pub mod poll;
pub mod report;
pub mod transport;
pub mod view;

pub use aggregate::{AdmissionSet, AggregateState, Aggregator, ClassSummary, GlobalStats};
pub use config::MonitorConfig;
pub use detect::{BoundingBox, Detection, Snapshot, StreamStatus};
pub use engine::{Engine, FetchHealth, MonitorState};
pub use error::FetchError;
pub use poll::{PollLoop, PollState};
pub use transport::{
    fetcher_for_url, parse_snapshot, HttpSnapshotFetcher, SnapshotFetcher, StubFetcher,
};
pub use view::{
    anomalies_only, confidence_percent, frequency_of, frequency_table, grouped_by_class,
    sorted_by_anomaly_first, DashboardView, FrequencyEntry, FrequencyTables, VisibleClass,
};
