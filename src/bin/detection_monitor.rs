//! detection_monitor - Poll a detection source and report count-once statistics.
//!
//! This binary:
//! 1. Loads monitor configuration (file, env, then CLI overrides)
//! 2. Polls the source's `/detections` endpoint on a fixed cadence
//! 3. Counts each tracked object once, however many polls it appears in
//! 4. Prints a report every report interval until Ctrl-C

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use detection_tally::{fetcher_for_url, report, Engine, MonitorConfig};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Count-once statistics over a polled detection stream"
)]
struct Args {
    /// Config file (JSON, or TOML with a .toml extension).
    #[arg(long, env = "DETECTION_MONITOR_CONFIG")]
    config: Option<PathBuf>,

    /// Detection source URL (http(s)://.../detections or stub://).
    #[arg(long)]
    source_url: Option<String>,

    /// Delay between the end of one fetch and the start of the next.
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Seconds between printed reports.
    #[arg(long)]
    report_secs: Option<u64>,

    /// Print reports as JSON instead of text.
    #[arg(long, env = "DETECTION_REPORT_JSON")]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = MonitorConfig::load_from(args.config.as_deref())?;
    if let Some(url) = args.source_url {
        cfg.source.url = url;
    }
    if let Some(ms) = args.poll_interval_ms {
        cfg.poll_interval = Duration::from_millis(ms);
    }
    if let Some(secs) = args.report_secs {
        cfg.report_interval = Duration::from_secs(secs);
    }
    cfg.validate()?;

    log::info!("detection monitor starting");
    log::info!("  Source: {}", cfg.source.url);
    log::info!("  Fetch timeout: {}ms", cfg.source.timeout.as_millis());
    log::info!("  Poll interval: {}ms", cfg.poll_interval.as_millis());
    log::info!("  Report interval: {}s", cfg.report_interval.as_secs());

    let fetcher = fetcher_for_url(&cfg.source.url, cfg.source.timeout)?;
    log::info!("  Fetcher: {}", fetcher.name());
    let engine = Engine::new(fetcher);
    engine.start(cfg.poll_interval)?;

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .expect("error setting Ctrl-C handler");

    loop {
        match rx.recv_timeout(cfg.report_interval) {
            Err(RecvTimeoutError::Timeout) => print_report(&engine, args.json)?,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    log::info!("shutdown signal received, stopping poll loop...");
    engine.stop()?;
    print_report(&engine, args.json)?;
    Ok(())
}

fn print_report(engine: &Engine, json: bool) -> Result<()> {
    let view = engine.dashboard()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!("{}", report::render(&view));
    }
    Ok(())
}
