//! Configuration models for demogen.
//!
//! All tunable behavior is parameterized here and resolved at runtime
//! from a TOML file, with env-var fallback for the API credential.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Top-level configuration for demogen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Collection loop settings (pacing, quality gate, target count)
    #[serde(default)]
    pub collection: CollectionConfig,

    /// Census API configuration
    #[serde(default)]
    pub census: CensusConfig,

    /// ACS variable map: record field name → variable code
    #[serde(default = "default_variables")]
    pub variables: BTreeMap<String, String>,

    /// Quality assessment rules
    #[serde(default)]
    pub quality: QualityConfig,

    /// Output directories
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Collection loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Baseline delay between tracts in seconds
    #[serde(default = "default_min_delay")]
    pub min_delay_seconds: f64,

    /// Quality score threshold for retaining a record (0.0 - 1.0)
    #[serde(default = "default_quality_threshold")]
    pub min_quality_threshold: f64,

    /// Number of tracts to collect from the built-in sample
    #[serde(default = "default_target_tracts")]
    pub target_tracts: usize,
}

fn default_min_delay() -> f64 {
    1.0
}

fn default_quality_threshold() -> f64 {
    0.7
}

fn default_target_tracts() -> usize {
    10
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            min_delay_seconds: default_min_delay(),
            min_quality_threshold: default_quality_threshold(),
            target_tracts: default_target_tracts(),
        }
    }
}

/// Census API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CensusConfig {
    /// API key (can also be set via the `api_key_env` env var).
    /// Absent or placeholder key selects the synthetic data source.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable name for the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Base URL for the Census data API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// ACS vintage year
    #[serde(default = "default_year")]
    pub year: u16,

    /// Dataset path under the vintage (e.g. "acs/acs5")
    #[serde(default = "default_dataset")]
    pub dataset: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_api_key_env() -> String {
    "CENSUS_API_KEY".to_string()
}

fn default_base_url() -> String {
    "https://api.census.gov/data".to_string()
}

fn default_year() -> u16 {
    2021
}

fn default_dataset() -> String {
    "acs/acs5".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for CensusConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            year: default_year(),
            dataset: default_dataset(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_variables() -> BTreeMap<String, String> {
    [
        ("median_income", "B19013_001E"),
        ("poverty_rate", "S1701_C03_001E"),
        ("total_population", "B01003_001E"),
        ("white_population", "B02001_002E"),
        ("black_population", "B02001_003E"),
        ("vehicle_available", "B08201_001E"),
        ("no_vehicle", "B08201_002E"),
        ("snap_benefits", "B22010_002E"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Quality assessment rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Fields that must be present and non-null (-20 points each)
    #[serde(default = "default_required_fields")]
    pub required_fields: Vec<String>,

    /// Expected [min, max] per field (-15 out of range, -10 non-numeric)
    #[serde(default = "default_valid_ranges")]
    pub valid_ranges: BTreeMap<String, (f64, f64)>,

    /// Population field for the cross-field consistency check
    #[serde(default = "default_population_field")]
    pub population_field: String,

    /// Rate field that must fall in [0, 100] when the population field
    /// is present (-20 points otherwise)
    #[serde(default = "default_rate_field")]
    pub rate_field: String,
}

fn default_required_fields() -> Vec<String> {
    ["median_income", "poverty_rate", "total_population"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_valid_ranges() -> BTreeMap<String, (f64, f64)> {
    [
        ("median_income", (1_000.0, 500_000.0)),
        ("poverty_rate", (0.0, 100.0)),
        ("total_population", (0.0, 100_000.0)),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn default_population_field() -> String {
    "total_population".to_string()
}

fn default_rate_field() -> String {
    "poverty_rate".to_string()
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            required_fields: default_required_fields(),
            valid_ranges: default_valid_ranges(),
            population_field: default_population_field(),
            rate_field: default_rate_field(),
        }
    }
}

/// Output directories. Created on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_logs_dir")]
    pub logs: PathBuf,

    #[serde(default = "default_raw_data_dir")]
    pub raw_data: PathBuf,

    #[serde(default = "default_metadata_dir")]
    pub metadata: PathBuf,

    #[serde(default = "default_reports_dir")]
    pub reports: PathBuf,
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_raw_data_dir() -> PathBuf {
    PathBuf::from("data/raw")
}

fn default_metadata_dir() -> PathBuf {
    PathBuf::from("data/metadata")
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from("reports")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            logs: default_logs_dir(),
            raw_data: default_raw_data_dir(),
            metadata: default_metadata_dir(),
            reports: default_reports_dir(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_owned(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            source: e,
        })
    }

    /// Resolve the Census API key from config or environment.
    ///
    /// Returns `None` when no usable key is configured - the caller then
    /// falls back to the synthetic data source. A placeholder key left
    /// over from a config template (contains `YOUR_`) counts as absent.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = &self.census.api_key {
            let key = expand_env_vars(key);
            if !key.trim().is_empty() && !key.contains("YOUR_") && !key.contains("${") {
                return Some(key);
            }
        }

        std::env::var(&self.census.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

/// Expand environment variables in a string.
///
/// Supports ${VAR_NAME} syntax.
/// If the variable is not set, the placeholder is left unchanged.
pub fn expand_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();

    for cap in re.captures_iter(s) {
        let var_name = &cap[1];
        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_fills_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.collection.min_delay_seconds, 1.0);
        assert_eq!(config.collection.min_quality_threshold, 0.7);
        assert_eq!(config.collection.target_tracts, 10);
        assert_eq!(config.census.base_url, "https://api.census.gov/data");
        assert_eq!(config.census.year, 2021);
        assert!(config.variables.contains_key("median_income"));
        assert_eq!(
            config.quality.valid_ranges.get("poverty_rate"),
            Some(&(0.0, 100.0))
        );
        assert_eq!(config.paths.reports, PathBuf::from("reports"));
    }

    #[test]
    fn test_partial_config_overrides_defaults() {
        let config: Config = toml::from_str(
            r#"
            [collection]
            min_quality_threshold = 0.9

            [quality.valid_ranges]
            median_income = [0.0, 250000.0]
            "#,
        )
        .unwrap();
        assert_eq!(config.collection.min_quality_threshold, 0.9);
        // Sibling keys in the same section still default
        assert_eq!(config.collection.target_tracts, 10);
        assert_eq!(
            config.quality.valid_ranges.get("median_income"),
            Some(&(0.0, 250_000.0))
        );
    }

    #[test]
    fn test_placeholder_api_key_counts_as_absent() {
        let config = Config {
            census: CensusConfig {
                api_key: Some("YOUR_API_KEY_HERE".to_string()),
                api_key_env: "DEMOGEN_TEST_KEY_UNSET".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.resolve_api_key().is_none());
    }

    #[test]
    fn test_explicit_api_key_resolves() {
        let config = Config {
            census: CensusConfig {
                api_key: Some("abc123".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key().as_deref(), Some("abc123"));
    }
}
