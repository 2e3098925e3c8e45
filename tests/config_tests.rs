use meeting_continuity::config::{CaptureBackend, StoreBackend};
use meeting_continuity::Config;
use std::io::Write;
use std::time::Duration;

#[test]
fn test_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent");

    let config = Config::load(path.to_str().unwrap()).unwrap();
    assert_eq!(config.service.http.port, 8787);
    assert_eq!(config.store.backend, StoreBackend::Memory);
    assert_eq!(config.capture.backend, CaptureBackend::Log);
    assert_eq!(config.capture.subject_prefix, "capture.control");
    assert_eq!(config.minutes.timeout_secs, 120);
    assert_eq!(config.tick_interval(), Duration::from_secs(1));
}

#[test]
fn test_file_overrides_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
[service.http]
port = 9100

[store]
backend = "nats"
bucket = "sessions-test"

[capture]
backend = "nats"
timeout_secs = 2

[minutes]
base_url = "https://minutes.example.com/api"
api_key = "secret"

[display]
tick_ms = 250
"#
    )
    .unwrap();

    let config = Config::load(file.path().to_str().unwrap()).unwrap();
    assert_eq!(config.service.http.port, 9100);
    assert_eq!(config.service.http.bind, "127.0.0.1");
    assert_eq!(config.store.backend, StoreBackend::Nats);
    assert_eq!(config.store.bucket, "sessions-test");
    assert_eq!(config.store.nats_url, "nats://localhost:4222");
    assert_eq!(config.capture.backend, CaptureBackend::Nats);
    assert_eq!(config.capture.timeout_secs, 2);
    assert_eq!(config.minutes.api_key.as_deref(), Some("secret"));
    assert_eq!(config.tick_interval(), Duration::from_millis(250));
}

#[test]
fn test_unknown_backend_is_rejected() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[store]\nbackend = \"sqlite\"").unwrap();

    assert!(Config::load(file.path().to_str().unwrap()).is_err());
}
