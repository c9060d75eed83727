//! Poll loop driving fetch → dedup → aggregate.
//!
//! The loop is an explicit state machine:
//!
//! ```text
//! Idle --start--> Fetching --completion--> Scheduled --interval--> Fetching
//!   ^                 |                        |
//!   +------stop-------+-----------stop---------+
//! ```
//!
//! A single worker thread performs fetches, so at most one fetch is ever in
//! flight. The interval is measured from the end of one cycle, which gives
//! natural backpressure against a slow source.
//!
//! Stopping bumps a generation counter that acts as the cancellation token.
//! A fetch already in flight is not aborted, but its completion handler only
//! runs if the generation it was issued under is still current, and the check
//! and the handler run under the same lock as `stop()`. Once `stop()` returns,
//! no completion mutates state.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::detect::Snapshot;
use crate::error::FetchError;
use crate::transport::SnapshotFetcher;

/// Observable poll loop state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PollState {
    /// Not started, or stopped.
    Idle,
    /// Waiting for the next tick.
    Scheduled,
    /// One fetch in flight.
    Fetching,
}

/// Completion handler invoked with each fetch result while the loop is live.
pub type CompletionHandler = dyn Fn(Result<Snapshot, FetchError>) + Send + Sync;

struct Control {
    phase: PollState,
    generation: u64,
    interval: Duration,
    worker_alive: bool,
}

struct Shared {
    control: Mutex<Control>,
    wake: Condvar,
    fetcher: Mutex<Box<dyn SnapshotFetcher>>,
    on_complete: Box<CompletionHandler>,
}

impl Shared {
    fn lock_control(&self) -> Result<MutexGuard<'_, Control>> {
        self.control
            .lock()
            .map_err(|_| anyhow!("poll control lock poisoned"))
    }
}

pub struct PollLoop {
    shared: Arc<Shared>,
}

impl PollLoop {
    pub fn new<F, H>(fetcher: F, on_complete: H) -> Self
    where
        F: SnapshotFetcher + 'static,
        H: Fn(Result<Snapshot, FetchError>) + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                control: Mutex::new(Control {
                    phase: PollState::Idle,
                    generation: 0,
                    interval: Duration::ZERO,
                    worker_alive: false,
                }),
                wake: Condvar::new(),
                fetcher: Mutex::new(Box::new(fetcher)),
                on_complete: Box::new(on_complete),
            }),
        }
    }

    /// Begin polling every `interval`, fetching once immediately.
    ///
    /// Returns `false` without doing anything if the loop is already running.
    pub fn start(&self, interval: Duration) -> Result<bool> {
        if interval.is_zero() {
            return Err(anyhow!("poll interval must be greater than zero"));
        }
        let mut control = self.shared.lock_control()?;
        if control.phase != PollState::Idle {
            return Ok(false);
        }
        control.generation += 1;
        control.phase = PollState::Fetching;
        control.interval = interval;

        if control.worker_alive {
            // A fetch from before the last stop is still in flight; that
            // worker adopts the new generation once it resolves.
            self.shared.wake.notify_all();
            return Ok(true);
        }

        let shared = self.shared.clone();
        let generation = control.generation;
        let spawned = std::thread::Builder::new()
            .name("snapshot-poll".to_string())
            .spawn(move || run_worker(shared, generation));
        match spawned {
            Ok(_) => {
                control.worker_alive = true;
                Ok(true)
            }
            Err(e) => {
                control.phase = PollState::Idle;
                Err(anyhow!("failed to spawn poll worker: {}", e))
            }
        }
    }

    /// Cancel any pending tick and return to `Idle`.
    ///
    /// Returns `false` if the loop was already idle.
    pub fn stop(&self) -> Result<bool> {
        let mut control = self.shared.lock_control()?;
        if control.phase == PollState::Idle {
            return Ok(false);
        }
        control.phase = PollState::Idle;
        control.generation += 1;
        self.shared.wake.notify_all();
        Ok(true)
    }

    pub fn state(&self) -> Result<PollState> {
        Ok(self.shared.lock_control()?.phase)
    }

    /// True while a worker thread exists, including one finishing a fetch
    /// issued before `stop()`.
    pub fn worker_alive(&self) -> Result<bool> {
        Ok(self.shared.lock_control()?.worker_alive)
    }
}

impl Drop for PollLoop {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("poll loop stop on drop failed: {}", e);
        }
    }
}

fn run_worker(shared: Arc<Shared>, mut generation: u64) {
    log::debug!("poll worker started (generation {})", generation);
    loop {
        let result = match shared.fetcher.lock() {
            Ok(mut fetcher) => fetcher.fetch(),
            Err(_) => Err(FetchError::Transport("fetcher lock poisoned".to_string())),
        };

        let mut control = match shared.control.lock() {
            Ok(control) => control,
            Err(_) => {
                log::error!("poll control lock poisoned; worker exiting");
                return;
            }
        };

        if control.generation == generation && control.phase == PollState::Fetching {
            (shared.on_complete)(result);
            control.phase = PollState::Scheduled;
        } else {
            log::debug!("discarding fetch result issued before stop");
        }

        loop {
            match control.phase {
                PollState::Idle => {
                    control.worker_alive = false;
                    log::debug!("poll worker exiting");
                    return;
                }
                PollState::Fetching => {
                    generation = control.generation;
                    break;
                }
                PollState::Scheduled => {
                    let interval = control.interval;
                    let waited = shared.wake.wait_timeout_while(control, interval, |c| {
                        c.generation == generation && c.phase == PollState::Scheduled
                    });
                    control = match waited {
                        Ok((control, _)) => control,
                        Err(_) => {
                            log::error!("poll control lock poisoned; worker exiting");
                            return;
                        }
                    };
                    if control.generation == generation && control.phase == PollState::Scheduled
                    {
                        control.phase = PollState::Fetching;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    struct CountingFetcher {
        calls: Arc<AtomicUsize>,
    }

    impl SnapshotFetcher for CountingFetcher {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn fetch(&mut self) -> Result<Snapshot, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Snapshot::default())
        }
    }

    fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        cond()
    }

    #[test]
    fn idle_until_started() {
        let calls = Arc::new(AtomicUsize::new(0));
        let poll = PollLoop::new(CountingFetcher { calls: calls.clone() }, |_| {});
        assert_eq!(poll.state().unwrap(), PollState::Idle);
        assert!(!poll.stop().unwrap());
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn first_fetch_is_immediate() {
        let calls = Arc::new(AtomicUsize::new(0));
        let poll = PollLoop::new(CountingFetcher { calls: calls.clone() }, |_| {});
        assert!(poll.start(Duration::from_secs(60)).unwrap());
        assert!(wait_until(Duration::from_secs(2), || calls.load(Ordering::SeqCst) == 1));
        assert!(wait_until(Duration::from_secs(2), || {
            poll.state().unwrap() == PollState::Scheduled
        }));
        poll.stop().unwrap();
    }

    #[test]
    fn start_is_idempotent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let poll = PollLoop::new(CountingFetcher { calls: calls.clone() }, |_| {});
        assert!(poll.start(Duration::from_secs(60)).unwrap());
        assert!(!poll.start(Duration::from_secs(60)).unwrap());
        assert!(wait_until(Duration::from_secs(2), || calls.load(Ordering::SeqCst) >= 1));
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        poll.stop().unwrap();
    }

    #[test]
    fn keeps_cadence_and_stops() {
        let calls = Arc::new(AtomicUsize::new(0));
        let poll = PollLoop::new(CountingFetcher { calls: calls.clone() }, |_| {});
        poll.start(Duration::from_millis(10)).unwrap();
        assert!(wait_until(Duration::from_secs(2), || calls.load(Ordering::SeqCst) >= 3));
        assert!(poll.stop().unwrap());
        assert!(wait_until(Duration::from_secs(2), || !poll.worker_alive().unwrap()));
        let after_stop = calls.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(calls.load(Ordering::SeqCst), after_stop);
        assert_eq!(poll.state().unwrap(), PollState::Idle);
    }

    #[test]
    fn zero_interval_rejected() {
        let calls = Arc::new(AtomicUsize::new(0));
        let poll = PollLoop::new(CountingFetcher { calls }, |_| {});
        assert!(poll.start(Duration::ZERO).is_err());
        assert_eq!(poll.state().unwrap(), PollState::Idle);
    }
}
