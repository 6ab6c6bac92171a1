//! Scoring configuration.
//!
//! # Config file format (`codescale.toml`)
//!
//! ```toml
//! [metrics.weights]
//! readability = 0.3
//! consistency = 0.2
//! time_complexity = 0.2
//! code_documentation = 0.2
//! external_dependencies = 0.1
//! ```
//!
//! A file without a `[metrics.weights]` table keeps the built-in equal
//! weights.  A table that is present must name only known metrics, hold
//! finite non-negative weights, and sum to 1.

use std::collections::HashMap;
use std::path::Path;

use crate::error::ConfigError;
use crate::report::MetricId;
use crate::weights::{ConfiguredWeights, StaticWeights, WeightProvider, WeightVector, SUM_TOLERANCE};

/// Conventional file name looked up by the CLI.
pub const DEFAULT_CONFIG_FILE: &str = "codescale.toml";

#[derive(serde::Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    metrics: MetricsSection,
}

#[derive(serde::Deserialize, Default)]
struct MetricsSection {
    /// Metric id to base weight.
    #[serde(default)]
    weights: Option<HashMap<String, f64>>,
}

/// Validated scoring settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringConfig {
    weights: Option<ConfiguredWeights>,
}

impl ScoringConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ConfigFile = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        match file.metrics.weights {
            Some(map) => Self::from_weight_map(map),
            None => Ok(Self::default()),
        }
    }

    /// Validate an in-memory weight override keyed by metric id.
    pub fn from_weight_map(map: HashMap<String, f64>) -> Result<Self, ConfigError> {
        if map.is_empty() {
            return Err(ConfigError::InvalidWeights("weight table is empty".into()));
        }

        let mut weights = WeightVector::new();
        for (id, weight) in map {
            let metric = id
                .parse::<MetricId>()
                .map_err(|e| ConfigError::InvalidWeights(e.to_string()))?;
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::InvalidWeights(format!(
                    "weight for `{metric}` must be a finite non-negative number, got {weight}"
                )));
            }
            weights.insert(metric, weight);
        }

        let total: f64 = weights.values().sum();
        if (total - 1.0).abs() > SUM_TOLERANCE {
            return Err(ConfigError::InvalidWeights(format!(
                "weights must sum to 1.0, got {total}"
            )));
        }

        let weights = ConfiguredWeights::new(weights)
            .ok_or_else(|| ConfigError::InvalidWeights("weights do not form a valid vector".into()))?;
        Ok(Self {
            weights: Some(weights),
        })
    }

    /// Whether a weight override is configured.
    pub fn has_weight_override(&self) -> bool {
        self.weights.is_some()
    }

    /// The provider an evaluator should use for these settings.
    pub fn weight_provider(&self) -> Box<dyn WeightProvider> {
        match &self.weights {
            Some(configured) => Box::new(configured.clone()),
            None => Box::new(StaticWeights),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn full_weight_table_is_loaded() {
        let file = write_config(
            "[metrics.weights]\nreadability = 0.3\nconsistency = 0.2\ntime_complexity = 0.2\n\
             code_documentation = 0.2\nexternal_dependencies = 0.1\n",
        );
        let config = ScoringConfig::load(file.path()).unwrap();
        assert!(config.has_weight_override());
        let weights = config.weight_provider().base_weights();
        assert!((weights[&MetricId::Readability] - 0.3).abs() < 1e-12);
        assert!((weights[&MetricId::Dependencies] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn missing_table_keeps_defaults() {
        let file = write_config("# nothing configured yet\n[metrics]\n");
        let config = ScoringConfig::load(file.path()).unwrap();
        assert!(!config.has_weight_override());
        assert_eq!(
            config.weight_provider().base_weights(),
            StaticWeights.base_weights()
        );
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ScoringConfig::load(&dir.path().join(DEFAULT_CONFIG_FILE)).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let file = write_config("[metrics.weights\nreadability = ");
        let err = ScoringConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        let file = write_config("[metrics.weights]\nreadability = \"high\"\n");
        let err = ScoringConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn invalid_weights_are_rejected() {
        let cases = [
            "[metrics.weights]\nspeed = 1.0\n",
            "[metrics.weights]\nreadability = 0.5\n",
            "[metrics.weights]\nreadability = 1.5\nconsistency = -0.5\n",
            "[metrics.weights]\n",
        ];
        for case in cases {
            let file = write_config(case);
            let err = ScoringConfig::load(file.path()).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidWeights(_)),
                "expected invalid weights for {case:?}, got {err}"
            );
        }
    }

    #[test]
    fn in_memory_override_is_validated_the_same_way() {
        let map = HashMap::from([
            ("readability".to_string(), 0.6),
            ("consistency".to_string(), 0.4),
        ]);
        assert!(ScoringConfig::from_weight_map(map).is_ok());

        let map = HashMap::from([("readability".to_string(), f64::NAN)]);
        assert!(ScoringConfig::from_weight_map(map).is_err());
    }
}
