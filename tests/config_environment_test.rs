// ABOUTME: Integration tests for environment-based configuration parsing
// ABOUTME: Serialized because they mutate process environment variables

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use relay_mcp_server::config::environment::{ServerConfig, TransportFlavor};
use serial_test::serial;
use std::env;

fn clear_relay_env() {
    for key in [
        "RELAY_TRANSPORT",
        "HTTP_PORT",
        "RELAY_ALLOWED_ORIGINS",
        "RELAY_EVENT_STORE_CAPACITY",
        "RELAY_SSE_KEEPALIVE_SECS",
        "RELAY_SSE_MAX_RECONNECT_ATTEMPTS",
        "RELAY_SSE_RECONNECT_BASE_DELAY_MS",
    ] {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_defaults_without_env() {
    clear_relay_env();

    let config = ServerConfig::from_env().unwrap();
    assert_eq!(config.transport, TransportFlavor::StreamableHttp);
    assert_eq!(config.http.port, 8080);
    assert_eq!(config.event_store.capacity_per_stream, 1024);
    assert_eq!(config.sse.keepalive_interval_secs, 30);
}

#[test]
#[serial]
fn test_transport_and_port_from_env() {
    clear_relay_env();
    env::set_var("RELAY_TRANSPORT", "sse");
    env::set_var("HTTP_PORT", "9090");

    let config = ServerConfig::from_env().unwrap();
    assert_eq!(config.transport, TransportFlavor::Sse);
    assert_eq!(config.http.port, 9090);

    clear_relay_env();
}

#[test]
#[serial]
fn test_origin_list_parsing() {
    clear_relay_env();
    env::set_var(
        "RELAY_ALLOWED_ORIGINS",
        "https://app.example.com, https://admin.example.com ,",
    );

    let config = ServerConfig::from_env().unwrap();
    assert_eq!(
        config.http.allowed_origins,
        vec![
            "https://app.example.com".to_owned(),
            "https://admin.example.com".to_owned(),
        ]
    );

    clear_relay_env();
}

#[test]
#[serial]
fn test_invalid_port_is_config_error() {
    clear_relay_env();
    env::set_var("HTTP_PORT", "not-a-port");

    assert!(ServerConfig::from_env().is_err());

    clear_relay_env();
}

#[test]
#[serial]
fn test_event_store_capacity_override() {
    clear_relay_env();
    env::set_var("RELAY_EVENT_STORE_CAPACITY", "64");

    let config = ServerConfig::from_env().unwrap();
    assert_eq!(config.event_store.capacity_per_stream, 64);

    clear_relay_env();
}
