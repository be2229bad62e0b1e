//! Integration tests for configuration loading

use crisis_dispatch::infra::Config;
use crisis_dispatch::io::{RosterError, StaticRoster};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_config_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[service]
id = "test-dispatch"

[matching]
policy = "distance"

[metrics]
interval_secs = 15
prometheus_port = 9091

[[roster.units]]
id = "Unit_Echo"
latitude = 51.507
longitude = -0.128

[[roster.units]]
id = "Unit_Foxtrot"
latitude = 48.857
longitude = 2.352
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.service_id(), "test-dispatch");
    assert_eq!(config.matching_policy(), "distance");
    assert_eq!(config.metrics_interval_secs(), 15);
    assert_eq!(config.prometheus_port(), 9091);
    assert_eq!(config.units().len(), 2);
    assert_eq!(config.units()[0].id, "Unit_Echo");
    assert_eq!(config.units()[1].longitude, 2.352);
}

#[test]
fn test_missing_sections_use_defaults() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[service]\nid = \"partial\"\n").unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();
    assert_eq!(config.service_id(), "partial");
    assert_eq!(config.matching_policy(), "distance");
    assert_eq!(config.units().len(), 4);
    assert_eq!(config.units()[0].id, "Unit_Alpha");
}

#[test]
fn test_load_from_path_fallback() {
    let config = Config::load_from_path("/nonexistent/config.toml");
    assert_eq!(config.service_id(), "dispatch");
    assert_eq!(config.matching_policy(), "distance");
    assert_eq!(config.units().len(), 4);
}

#[test]
fn test_from_file_rejects_bad_toml() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[roster\nunits = ?").unwrap();
    temp_file.flush().unwrap();

    assert!(Config::from_file(temp_file.path()).is_err());
}

#[test]
fn test_invalid_roster_is_startup_error() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[[roster.units]]
id = "Unit_Echo"
latitude = 51.507
longitude = -0.128

[[roster.units]]
id = "Unit_Echo"
latitude = 48.857
longitude = 2.352
"#;
    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    // The TOML parses; roster validation rejects the duplicate id
    let config = Config::from_file(temp_file.path()).unwrap();
    assert_eq!(
        StaticRoster::from_config(&config).unwrap_err(),
        RosterError::DuplicateId("Unit_Echo".to_string())
    );
}

#[test]
fn test_out_of_range_roster_coordinate() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[[roster.units]]
id = "Unit_Echo"
latitude = 51.507
longitude = -200.0
"#;
    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();
    assert!(matches!(
        StaticRoster::from_config(&config).unwrap_err(),
        RosterError::Coordinate { .. }
    ));
}
