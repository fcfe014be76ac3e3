use super::{ConfigError, GatewayConfig, ServerEntry};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use std::{env, fs};

const SAMPLE: &str = r#"{
  "SX127x_conf": { "freq": 915000000, "spread_factor": 7, "pin_nss": 6 },
  "gateway_conf": {
    "ref_latitude": 0.0,
    "name": "pi-gateway",
    "servers": [
      { "address": "router.us.thethings.network", "port": 1700, "enabled": true },
      { "address": "backup.example.net" }
    ]
  }
}"#;

#[test]
fn parses_single_channel_gateway_document() {
    let config = GatewayConfig::from_json_str(SAMPLE).unwrap();
    assert_eq!(config.radio_frequency_hz, 915_000_000);
    assert_eq!(config.spread_factor, 7);
    assert_eq!(config.gateway_name, "pi-gateway");
    assert_eq!(config.servers.len(), 2);
    assert_eq!(
        config.primary_server().unwrap(),
        &ServerEntry {
            address: "router.us.thethings.network".into(),
            port: Some(1700),
            enabled: Some(true),
        }
    );
}

#[test]
fn frequency_is_shown_in_mhz() {
    let config = GatewayConfig::from_json_str(SAMPLE).unwrap();
    assert_eq!(config.frequency_mhz(), 915.0);
    assert_eq!(config.frequency_label(), "915.0");

    let mut eu = config.clone();
    eu.radio_frequency_hz = 868_100_000;
    assert_eq!(eu.frequency_label(), "868.1");
}

#[test]
fn empty_server_list_is_an_error() {
    let doc = r#"{
      "SX127x_conf": { "freq": 915000000, "spread_factor": 7 },
      "gateway_conf": { "name": "pi-gateway", "servers": [] }
    }"#;
    assert!(matches!(
        GatewayConfig::from_json_str(doc),
        Err(ConfigError::NoServers)
    ));
}

#[test]
fn primary_server_reports_empty_list() {
    let mut config = GatewayConfig::from_json_str(SAMPLE).unwrap();
    config.servers.clear();
    assert!(matches!(config.primary_server(), Err(ConfigError::NoServers)));
}

#[test]
fn missing_sections_and_fields_are_named() {
    let cases = [
        (r#"{ "gateway_conf": { "name": "x", "servers": [] } }"#, "SX127x_conf"),
        (r#"{ "SX127x_conf": { "freq": 1, "spread_factor": 7 } }"#, "gateway_conf"),
        (
            r#"{ "SX127x_conf": { "spread_factor": 7 }, "gateway_conf": { "name": "x", "servers": [] } }"#,
            "SX127x_conf.freq",
        ),
        (
            r#"{ "SX127x_conf": { "freq": 1 }, "gateway_conf": { "name": "x", "servers": [] } }"#,
            "SX127x_conf.spread_factor",
        ),
        (
            r#"{ "SX127x_conf": { "freq": 1, "spread_factor": 7 }, "gateway_conf": { "servers": [] } }"#,
            "gateway_conf.name",
        ),
        (
            r#"{ "SX127x_conf": { "freq": 1, "spread_factor": 7 }, "gateway_conf": { "name": "x" } }"#,
            "gateway_conf.servers",
        ),
    ];
    for (doc, field) in cases {
        match GatewayConfig::from_json_str(doc) {
            Err(ConfigError::MissingField(name)) => assert_eq!(name, field),
            other => panic!("expected missing {field}, got {other:?}"),
        }
    }
}

#[test]
fn server_without_address_is_malformed() {
    let doc = r#"{
      "SX127x_conf": { "freq": 915000000, "spread_factor": 7 },
      "gateway_conf": { "name": "pi-gateway", "servers": [ { "port": 1700 } ] }
    }"#;
    let err = GatewayConfig::from_json_str(doc).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
    assert_eq!(err.short_reason(), "malformed JSON");
}

#[test]
fn malformed_json_is_a_parse_error() {
    let err = GatewayConfig::from_json_str("{ not json").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = GatewayConfig::load(Path::new("/nonexistent/global_conf.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert_eq!(err.short_reason(), "file not found");
}

#[test]
fn load_reads_file_each_time() {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let path = env::temp_dir().join(format!("lora_panel_conf_{unique}.json"));
    fs::write(&path, SAMPLE).unwrap();
    assert_eq!(GatewayConfig::load(&path).unwrap().gateway_name, "pi-gateway");

    fs::write(&path, SAMPLE.replace("pi-gateway", "renamed")).unwrap();
    assert_eq!(GatewayConfig::load(&path).unwrap().gateway_name, "renamed");
    let _ = fs::remove_file(path);
}
