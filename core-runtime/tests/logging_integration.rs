//! Integration tests for the logging configuration surface

use bridge_traits::LogLevel;
use core_runtime::logging::{redact_if_sensitive, strip_path, LogFormat, LoggingConfig};

#[test]
fn test_config_builder() {
    // Only one subscriber can be installed per process, so the builder is
    // tested in isolation.
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Debug)
        .with_pii_redaction(true)
        .with_spans(true);

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, LogLevel::Debug);
    assert!(config.redact_pii);
    assert!(config.enable_spans);
}

#[test]
fn test_credentials_are_redacted() {
    assert_eq!(redact_if_sensitive("auth_token", "abc"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("Authorization", "Bearer x"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("api_key", "k"), "[REDACTED]");
}

#[test]
fn test_player_fields_pass_through() {
    assert_eq!(redact_if_sensitive("track_id", "7"), "7");
    assert_eq!(redact_if_sensitive("session_id", "12"), "12");
    assert_eq!(redact_if_sensitive("segment", "100"), "100");
    assert_eq!(
        redact_if_sensitive("url", "http://host/stream/7"),
        "http://host/stream/7"
    );
}

#[test]
fn test_path_stripping() {
    assert_eq!(strip_path("/srv/media/albums/song.mp3"), "song.mp3");
    assert_eq!(strip_path("C:\\Music\\song.mp3"), "song.mp3");
    assert_eq!(strip_path("song.mp3"), "song.mp3");
    assert_eq!(strip_path("/srv/media/"), "");
}

#[test]
fn test_format_default_follows_build_profile() {
    let config = LoggingConfig::default();

    #[cfg(debug_assertions)]
    assert_eq!(config.format, LogFormat::Pretty);

    #[cfg(not(debug_assertions))]
    assert_eq!(config.format, LogFormat::Json);
}

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn)
        .with_filter("core_session=trace")
        .with_pii_redaction(false)
        .with_target(false)
        .with_thread_info(true);

    assert_eq!(config.format, LogFormat::Compact);
    assert_eq!(config.level, LogLevel::Warn);
    assert_eq!(config.filter.as_deref(), Some("core_session=trace"));
    assert!(!config.redact_pii);
    assert!(!config.display_target);
    assert!(config.display_thread_info);
}
