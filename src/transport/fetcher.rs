use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use url::Url;

use super::http::HttpSnapshotFetcher;
use super::stub::StubFetcher;
use crate::detect::Snapshot;
use crate::error::FetchError;

/// One-shot access to the remote detection source.
///
/// Implementations perform exactly one request per call and hold no
/// aggregate state. Retries are the poll loop's job: it simply calls again on
/// the next tick.
pub trait SnapshotFetcher: Send {
    /// Fetcher identifier, used in logs.
    fn name(&self) -> &'static str;

    /// Fetch the current snapshot.
    fn fetch(&mut self) -> Result<Snapshot, FetchError>;
}

impl<F: SnapshotFetcher + ?Sized> SnapshotFetcher for Box<F> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn fetch(&mut self) -> Result<Snapshot, FetchError> {
        (**self).fetch()
    }
}

/// Build a fetcher for `url`.
///
/// `http(s)://` talks to a live source; `stub://` replays a synthetic scene.
pub fn fetcher_for_url(url: &str, timeout: Duration) -> Result<Box<dyn SnapshotFetcher>> {
    let parsed = Url::parse(url).with_context(|| format!("parse source url '{}'", url))?;
    match parsed.scheme() {
        "http" | "https" => Ok(Box::new(HttpSnapshotFetcher::new(url, timeout))),
        "stub" => Ok(Box::new(StubFetcher::new())),
        other => Err(anyhow!(
            "unsupported source scheme '{}'; expected http(s) or stub",
            other
        )),
    }
}
