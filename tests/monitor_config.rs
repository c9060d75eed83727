use std::sync::Mutex;
use std::time::Duration;

use tempfile::{Builder, NamedTempFile};

use detection_tally::config::MonitorConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "DETECTION_MONITOR_CONFIG",
        "DETECTION_SOURCE_URL",
        "DETECTION_FETCH_TIMEOUT_MS",
        "DETECTION_POLL_INTERVAL_MS",
        "DETECTION_REPORT_SECS",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "source": {
            "url": "http://10.0.0.7:8000/detections",
            "timeout_ms": 750
        },
        "poll": {
            "interval_ms": 250
        },
        "report": {
            "interval_secs": 30
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("DETECTION_MONITOR_CONFIG", file.path());
    std::env::set_var("DETECTION_POLL_INTERVAL_MS", "400");

    let cfg = MonitorConfig::load().expect("load config");

    assert_eq!(cfg.source.url, "http://10.0.0.7:8000/detections");
    assert_eq!(cfg.source.timeout, Duration::from_millis(750));
    assert_eq!(cfg.poll_interval, Duration::from_millis(400));
    assert_eq!(cfg.report_interval, Duration::from_secs(30));

    clear_env();
}

#[test]
fn loads_toml_config() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config");
    let toml = r#"
[source]
url = "stub://scene"

[poll]
interval_ms = 50
"#;
    std::io::Write::write_all(&mut file, toml.as_bytes()).expect("write config");

    let cfg = MonitorConfig::load_from(Some(file.path())).expect("load config");
    assert_eq!(cfg.source.url, "stub://scene");
    assert_eq!(cfg.poll_interval, Duration::from_millis(50));
    assert_eq!(cfg.source.timeout, Duration::from_millis(5_000));
    assert_eq!(cfg.report_interval, Duration::from_secs(5));

    clear_env();
}

#[test]
fn defaults_without_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = MonitorConfig::load().expect("load config");
    assert_eq!(cfg.source.url, "http://127.0.0.1:8000/detections");
    assert_eq!(cfg.poll_interval, Duration::from_millis(1_000));
}

#[test]
fn rejects_non_numeric_env_interval() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("DETECTION_POLL_INTERVAL_MS", "fast");
    let err = MonitorConfig::load().unwrap_err();
    assert!(err.to_string().contains("DETECTION_POLL_INTERVAL_MS"));

    clear_env();
}

#[test]
fn rejects_zero_interval_from_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("DETECTION_POLL_INTERVAL_MS", "0");
    assert!(MonitorConfig::load().is_err());

    clear_env();
}

#[test]
fn rejects_unsupported_source_scheme() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("DETECTION_SOURCE_URL", "rtsp://camera-1/stream");
    let err = MonitorConfig::load().unwrap_err();
    assert!(err.to_string().contains("not supported"));

    clear_env();
}
