//! Detection aggregation engine.
//!
//! `Engine` owns one `MonitorState` behind a single `RwLock`. The poll loop's
//! completion handler takes the write side only long enough to apply one
//! snapshot; views take the read side and always see a whole batch or none
//! of it.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::aggregate::{AggregateState, ClassSummary, GlobalStats};
use crate::detect::{Snapshot, StreamStatus};
use crate::error::FetchError;
use crate::poll::{PollLoop, PollState};
use crate::transport::{validate_snapshot, SnapshotFetcher};
use crate::view::{self, DashboardView, FrequencyTables};

/// Health of the fetch side, independent of aggregate data.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FetchHealth {
    pub last_fetch_failed: bool,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
    pub successful_fetches: u64,
    pub failed_fetches: u64,
}

impl FetchHealth {
    fn record_success(&mut self) {
        self.last_fetch_failed = false;
        self.last_error = None;
        self.consecutive_failures = 0;
        self.successful_fetches += 1;
    }

    fn record_failure(&mut self, err: &FetchError) {
        self.last_fetch_failed = true;
        self.last_error = Some(err.to_string());
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.failed_fetches += 1;
    }
}

/// Everything the engine mutates, guarded as one unit.
#[derive(Clone, Debug, Default)]
pub struct MonitorState {
    pub aggregate: AggregateState,
    /// Status of the last successfully applied snapshot.
    pub stream: StreamStatus,
    pub health: FetchHealth,
}

impl MonitorState {
    /// Apply one fetch outcome. Returns the number of admissions.
    pub fn apply(&mut self, result: Result<Snapshot, FetchError>) -> usize {
        let snapshot = match result.and_then(|s| validate_snapshot(&s).map(|_| s)) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.health.record_failure(&err);
                log::warn!(
                    "snapshot fetch failed ({} in a row): {}",
                    self.health.consecutive_failures,
                    err
                );
                return 0;
            }
        };
        let admitted = self.aggregate.ingest(&snapshot.detections);
        log::debug!(
            "snapshot applied: {} in view, {} admitted, {} total",
            snapshot.detections.len(),
            admitted,
            self.aggregate.global().total_admitted
        );
        self.health.record_success();
        self.stream = StreamStatus::from(snapshot);
        if let Some(banner) = self.stream.anomaly_banner() {
            log::warn!("{}", banner);
        }
        admitted
    }

    pub fn dashboard(&self) -> DashboardView {
        let mut dashboard = DashboardView::build(&self.aggregate);
        dashboard.visible = view::visible_by_class(&self.stream.visible);
        dashboard.stream = self.stream.clone();
        dashboard.last_fetch_failed = self.health.last_fetch_failed;
        dashboard.last_error = self.health.last_error.clone();
        dashboard
    }
}

/// Live aggregator over a polled detection source.
pub struct Engine {
    state: Arc<RwLock<MonitorState>>,
    poll: PollLoop,
}

impl Engine {
    pub fn new<F: SnapshotFetcher + 'static>(fetcher: F) -> Self {
        let state = Arc::new(RwLock::new(MonitorState::default()));
        let sink = state.clone();
        let poll = PollLoop::new(fetcher, move |result| match sink.write() {
            Ok(mut state) => {
                state.apply(result);
            }
            Err(_) => log::error!("monitor state lock poisoned; dropping snapshot"),
        });
        Self { state, poll }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MonitorState>> {
        self.state
            .read()
            .map_err(|_| anyhow!("monitor state lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MonitorState>> {
        self.state
            .write()
            .map_err(|_| anyhow!("monitor state lock poisoned"))
    }

    /// Start polling. A no-op returning `false` if already running.
    pub fn start(&self, interval: Duration) -> Result<bool> {
        let started = self.poll.start(interval)?;
        if started {
            log::info!("polling every {}ms", interval.as_millis());
        }
        Ok(started)
    }

    /// Stop polling. A result still in flight is discarded when it lands.
    pub fn stop(&self) -> Result<bool> {
        let stopped = self.poll.stop()?;
        if stopped {
            log::info!("polling stopped");
        }
        Ok(stopped)
    }

    pub fn poll_state(&self) -> Result<PollState> {
        self.poll.state()
    }

    /// Apply a fetch outcome directly, bypassing the poll loop.
    pub fn ingest(&self, result: Result<Snapshot, FetchError>) -> Result<usize> {
        Ok(self.write()?.apply(result))
    }

    /// Return every accessor to its freshly-constructed value in one step.
    pub fn reset(&self) -> Result<()> {
        *self.write()? = MonitorState::default();
        log::info!("aggregate state reset");
        Ok(())
    }

    pub fn summaries(&self) -> Result<Vec<ClassSummary>> {
        Ok(view::grouped_by_class(&self.read()?.aggregate))
    }

    pub fn summary(&self, class_id: u32) -> Result<Option<ClassSummary>> {
        Ok(self
            .read()?
            .aggregate
            .aggregator()
            .summary(class_id)
            .cloned())
    }

    pub fn sorted_by_anomaly_first(&self) -> Result<Vec<ClassSummary>> {
        Ok(view::sorted_by_anomaly_first(
            self.read()?.aggregate.summaries(),
        ))
    }

    pub fn anomalies_only(&self) -> Result<Vec<ClassSummary>> {
        Ok(view::anomalies_only(self.read()?.aggregate.summaries()))
    }

    pub fn global_stats(&self) -> Result<GlobalStats> {
        Ok(self.read()?.aggregate.global().clone())
    }

    pub fn frequencies(&self) -> Result<FrequencyTables> {
        Ok(FrequencyTables::from_global(self.read()?.aggregate.global()))
    }

    pub fn admitted_tracks(&self) -> Result<usize> {
        Ok(self.read()?.aggregate.admissions().len())
    }

    pub fn stream(&self) -> Result<StreamStatus> {
        Ok(self.read()?.stream.clone())
    }

    pub fn health(&self) -> Result<FetchHealth> {
        Ok(self.read()?.health.clone())
    }

    pub fn last_fetch_failed(&self) -> Result<bool> {
        Ok(self.read()?.health.last_fetch_failed)
    }

    pub fn dashboard(&self) -> Result<DashboardView> {
        Ok(self.read()?.dashboard())
    }
}
