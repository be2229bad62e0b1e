//! Configuration loading from TOML files
//!
//! Config file is selected via the --config command line argument,
//! defaulting to config/dev.toml. A missing or unreadable file falls
//! back to built-in defaults with a warning.

use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Service instance identifier (metrics label)
    #[serde(default = "default_service_id")]
    pub id: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self { id: default_service_id() }
    }
}

fn default_service_id() -> String {
    "dispatch".to_string()
}

/// One roster entry as written in the config file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UnitConfig {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RosterConfig {
    #[serde(default = "default_units")]
    pub units: Vec<UnitConfig>,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self { units: default_units() }
    }
}

fn default_units() -> Vec<UnitConfig> {
    vec![
        UnitConfig { id: "Unit_Alpha".to_string(), latitude: 40.715, longitude: -74.008 },
        UnitConfig { id: "Unit_Bravo".to_string(), latitude: 40.725, longitude: -74.000 },
        UnitConfig { id: "Unit_Charlie".to_string(), latitude: 40.700, longitude: -74.020 },
        UnitConfig { id: "Unit_Delta".to_string(), latitude: 34.052, longitude: -118.243 },
    ]
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingConfig {
    /// Scoring policy name ("distance" is the only shipping value)
    #[serde(default = "default_policy")]
    pub policy: String,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self { policy: default_policy() }
    }
}

fn default_policy() -> String {
    "distance".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_interval_secs")]
    pub interval_secs: u64,
    /// Prometheus metrics HTTP port (0 to disable)
    #[serde(default = "default_prometheus_port")]
    pub prometheus_port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_metrics_interval_secs(),
            prometheus_port: default_prometheus_port(),
        }
    }
}

fn default_metrics_interval_secs() -> u64 {
    10
}

fn default_prometheus_port() -> u16 {
    0
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub roster: RosterConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    service_id: String,
    units: Vec<UnitConfig>,
    matching_policy: String,
    metrics_interval_secs: u64,
    prometheus_port: u16,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_id: default_service_id(),
            units: default_units(),
            matching_policy: default_policy(),
            metrics_interval_secs: default_metrics_interval_secs(),
            prometheus_port: default_prometheus_port(),
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self {
            service_id: toml_config.service.id,
            units: toml_config.roster.units,
            matching_policy: toml_config.matching.policy,
            metrics_interval_secs: toml_config.metrics.interval_secs,
            prometheus_port: toml_config.metrics.prometheus_port,
            config_file: path.display().to_string(),
        })
    }

    /// Load configuration - tries the TOML file first, falls back to defaults
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {}. Using defaults.", e);
                Self::default()
            }
        }
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    pub fn units(&self) -> &[UnitConfig] {
        &self.units
    }

    pub fn matching_policy(&self) -> &str {
        &self.matching_policy
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn prometheus_port(&self) -> u16 {
        self.prometheus_port
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method for tests to replace the roster
    #[cfg(test)]
    pub fn with_units(mut self, units: Vec<UnitConfig>) -> Self {
        self.units = units;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_id(), "dispatch");
        assert_eq!(config.matching_policy(), "distance");
        assert_eq!(config.metrics_interval_secs(), 10);
        assert_eq!(config.prometheus_port(), 0);
        assert_eq!(config.config_file(), "default");
    }

    #[test]
    fn test_default_roster_fixture() {
        let config = Config::default();
        let ids: Vec<&str> = config.units().iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, ["Unit_Alpha", "Unit_Bravo", "Unit_Charlie", "Unit_Delta"]);
        assert_eq!(config.units()[3].latitude, 34.052);
        assert_eq!(config.units()[3].longitude, -118.243);
    }

    #[test]
    fn test_empty_toml_uses_section_defaults() {
        let toml_config: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(toml_config.service.id, "dispatch");
        assert_eq!(toml_config.roster.units.len(), 4);
        assert_eq!(toml_config.matching.policy, "distance");
        assert_eq!(toml_config.metrics.interval_secs, 10);
    }

    #[test]
    fn test_parse_roster_section() {
        let toml_config: TomlConfig = toml::from_str(
            r#"
[[roster.units]]
id = "Unit_Echo"
latitude = 51.507
longitude = -0.128
"#,
        )
        .unwrap();
        assert_eq!(
            toml_config.roster.units,
            vec![UnitConfig { id: "Unit_Echo".to_string(), latitude: 51.507, longitude: -0.128 }]
        );
    }
}
