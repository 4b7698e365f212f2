//! Config file loading and gateway construction from config.

use std::io::Write;

use recogate::config::Config;
use recogate::{GatewayError, RecogateBuilder};

#[test]
fn load_explicit_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[upstream]
base_url = "http://127.0.0.1:9/v4"
timeout_secs = 2

[cache]
hotness_window_secs = 15

[cache.tiers]
negative_ttl_secs = 5
"#
    )
    .unwrap();

    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(config.upstream.base_url, "http://127.0.0.1:9/v4");
    assert_eq!(config.upstream.timeout_secs, 2);
    assert_eq!(config.cache.hotness_window_secs, 15);
    assert_eq!(config.cache.lookup_ttl_secs, 10_000);
    assert_eq!(config.cache.tiers.negative_ttl_secs, 5);
    assert_eq!(config.cache.tiers.hot_request_ttl_secs, 120);
}

#[test]
fn load_rejects_malformed_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[upstream\nbase_url = 1").unwrap();

    let err = Config::load(Some(file.path())).unwrap_err();
    assert!(matches!(err, GatewayError::Configuration(_)));
    assert!(!err.is_client_error());
}

#[test]
fn empty_file_means_defaults() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(config.upstream.timeout_secs, 10);
    assert!(config.store.redis_url.is_none());
}

#[test]
fn builder_from_config_with_redis_needs_connect() {
    let config =
        Config::from_toml_str("[store]\nredis_url = \"redis://127.0.0.1:6379\"").unwrap();
    let result = RecogateBuilder::from_config(&config).build();
    assert!(matches!(result, Err(GatewayError::Configuration(_))));
}

#[test]
fn builder_from_config_in_memory() {
    let config = Config::from_toml_str("[store]\nmax_entries = 1000").unwrap();
    assert!(RecogateBuilder::from_config(&config).build().is_ok());
}
