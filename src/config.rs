use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use url::Url;

const DEFAULT_SOURCE_URL: &str = "http://127.0.0.1:8000/detections";
const DEFAULT_FETCH_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
const DEFAULT_REPORT_SECS: u64 = 5;

#[derive(Debug, Deserialize, Default)]
struct MonitorConfigFile {
    source: Option<SourceConfigFile>,
    poll: Option<PollConfigFile>,
    report: Option<ReportConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    url: Option<String>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct PollConfigFile {
    interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct ReportConfigFile {
    interval_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub source: SourceSettings,
    pub poll_interval: Duration,
    pub report_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub url: String,
    /// Per-request bound on the fetcher. The poll loop adds none of its own.
    pub timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::from_file(MonitorConfigFile::default())
    }
}

impl MonitorConfig {
    /// Load from `DETECTION_MONITOR_CONFIG` (if set), then env overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("DETECTION_MONITOR_CONFIG").ok();
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    /// Load from an explicit file path (if any), then env overrides.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: MonitorConfigFile) -> Self {
        let source = SourceSettings {
            url: file
                .source
                .as_ref()
                .and_then(|source| source.url.clone())
                .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
            timeout: Duration::from_millis(
                file.source
                    .as_ref()
                    .and_then(|source| source.timeout_ms)
                    .unwrap_or(DEFAULT_FETCH_TIMEOUT_MS),
            ),
        };
        let poll_interval = Duration::from_millis(
            file.poll
                .and_then(|poll| poll.interval_ms)
                .unwrap_or(DEFAULT_POLL_INTERVAL_MS),
        );
        let report_interval = Duration::from_secs(
            file.report
                .and_then(|report| report.interval_secs)
                .unwrap_or(DEFAULT_REPORT_SECS),
        );
        Self {
            source,
            poll_interval,
            report_interval,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("DETECTION_SOURCE_URL") {
            if !url.trim().is_empty() {
                self.source.url = url.trim().to_string();
            }
        }
        if let Some(ms) = env_u64("DETECTION_FETCH_TIMEOUT_MS")? {
            self.source.timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("DETECTION_POLL_INTERVAL_MS")? {
            self.poll_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = env_u64("DETECTION_REPORT_SECS")? {
            self.report_interval = Duration::from_secs(secs);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.source.url)
            .map_err(|e| anyhow!("invalid source url '{}': {}", self.source.url, e))?;
        if !matches!(url.scheme(), "http" | "https" | "stub") {
            return Err(anyhow!(
                "source url scheme '{}' not supported; expected http(s) or stub",
                url.scheme()
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(anyhow!("poll interval must be greater than zero"));
        }
        if self.source.timeout.is_zero() {
            return Err(anyhow!("fetch timeout must be greater than zero"));
        }
        if self.report_interval.is_zero() {
            return Err(anyhow!("report interval must be greater than zero"));
        }
        Ok(())
    }
}

fn env_u64(key: &str) -> Result<Option<u64>> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("{} must be a non-negative integer", key)),
        _ => Ok(None),
    }
}

fn read_config_file(path: &Path) -> Result<MonitorConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}
