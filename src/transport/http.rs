use std::time::Duration;

use super::fetcher::SnapshotFetcher;
use super::snapshot::parse_snapshot;
use crate::detect::Snapshot;
use crate::error::FetchError;

/// Fetches snapshots from the source's `/detections` HTTP endpoint.
///
/// The per-request timeout is the only bound on a hung source; the poll loop
/// itself never times a fetch out.
pub struct HttpSnapshotFetcher {
    agent: ureq::Agent,
    url: String,
}

impl HttpSnapshotFetcher {
    pub fn new(url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            url: url.to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl SnapshotFetcher for HttpSnapshotFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    fn fetch(&mut self) -> Result<Snapshot, FetchError> {
        log::trace!("GET {}", self.url());
        let response = match self.agent.get(self.url()).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => return Err(FetchError::Status(code)),
            Err(ureq::Error::Transport(t)) => return Err(FetchError::Transport(t.to_string())),
        };
        let body = response
            .into_string()
            .map_err(|e| FetchError::Transport(format!("read response body: {}", e)))?;
        parse_snapshot(body.as_bytes())
    }
}
