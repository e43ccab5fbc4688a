//! Configuration for aggregator registries
//!
//! Configuration can be built in code, or loaded from a YAML file with
//! environment overrides:
//!
//! ```yaml
//! window_count: 4
//! window_type: rolling
//! granularity:
//!   mode: time
//!   window_ms: 60000
//! ```
//!
//! Environment variables prefixed with `AGGREGATORS_` override file values;
//! nested keys are separated by `__`, e.g. `AGGREGATORS_GRANULARITY__WINDOW_MS`.

use crate::error::{AggregatorError, Result};
use crate::window::{WindowGranularity, WindowType};
use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default environment prefix for overrides
pub const ENV_PREFIX: &str = "AGGREGATORS_";

/// Registry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatorsConfig {
    /// Number of windows retained by rolling aggregators
    #[serde(default = "default_window_count")]
    pub window_count: usize,

    /// Retention policy
    #[serde(default)]
    pub window_type: WindowType,

    /// What advances the current window
    #[serde(default)]
    pub granularity: WindowGranularity,
}

impl Default for AggregatorsConfig {
    fn default() -> Self {
        Self {
            window_count: default_window_count(),
            window_type: WindowType::Rolling,
            granularity: WindowGranularity::Manual,
        }
    }
}

impl AggregatorsConfig {
    /// Rolling windows retained `window_count` deep
    pub fn rolling(window_count: usize) -> Self {
        Self {
            window_count,
            window_type: WindowType::Rolling,
            ..Default::default()
        }
    }

    /// Only the current window is kept
    pub fn tumbling() -> Self {
        Self {
            window_count: 1,
            window_type: WindowType::Tumbling,
            ..Default::default()
        }
    }

    pub fn with_granularity(mut self, granularity: WindowGranularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// Load from an optional YAML file, then `AGGREGATORS_` environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        Self::load_with_prefix(config_path, ENV_PREFIX)
    }

    /// Load with a custom environment prefix
    pub fn load_with_prefix(config_path: Option<PathBuf>, env_prefix: &str) -> Result<Self> {
        let mut figment = Figment::from(figment::providers::Serialized::defaults(
            AggregatorsConfig::default(),
        ));

        if let Some(path) = config_path {
            figment = figment.merge(Yaml::file(path));
        }

        figment = figment.merge(Env::prefixed(env_prefix).split("__"));

        let config: AggregatorsConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.window_count == 0 {
            return Err(AggregatorError::configuration(
                "window_count must be greater than 0",
            ));
        }

        match self.granularity {
            WindowGranularity::Time { window_ms: 0 } => Err(AggregatorError::configuration(
                "time granularity requires window_ms greater than 0",
            )),
            WindowGranularity::Events { per_window: 0 } => Err(AggregatorError::configuration(
                "event granularity requires per_window greater than 0",
            )),
            _ => Ok(()),
        }
    }
}

fn default_window_count() -> usize {
    2
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = AggregatorsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.window_count, 2);
        assert_eq!(config.window_type, WindowType::Rolling);
        assert_eq!(config.granularity, WindowGranularity::Manual);
    }

    #[test]
    fn test_zero_window_count_rejected() {
        let err = AggregatorsConfig::rolling(0).validate().unwrap_err();
        assert!(err.to_string().contains("window_count"));
    }

    #[test]
    fn test_zero_granularity_rejected() {
        let time = AggregatorsConfig::default().with_granularity(WindowGranularity::Time { window_ms: 0 });
        assert!(time.validate().is_err());

        let events =
            AggregatorsConfig::default().with_granularity(WindowGranularity::Events { per_window: 0 });
        assert!(events.validate().is_err());
    }

    #[test]
    fn test_tumbling_constructor() {
        let config = AggregatorsConfig::tumbling();
        assert_eq!(config.window_type, WindowType::Tumbling);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "window_count: 4\nwindow_type: tumbling\ngranularity:\n  mode: time\n  window_ms: 500"
        )
        .unwrap();

        let config = AggregatorsConfig::load_with_prefix(
            Some(file.path().to_path_buf()),
            "AGG_TEST_YAML_ONLY_",
        )
        .unwrap();

        assert_eq!(config.window_count, 4);
        assert_eq!(config.window_type, WindowType::Tumbling);
        assert_eq!(config.granularity, WindowGranularity::Time { window_ms: 500 });
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "window_count: 4").unwrap();

        std::env::set_var("AGG_TEST_OVERRIDE_WINDOW_COUNT", "7");
        let config = AggregatorsConfig::load_with_prefix(
            Some(file.path().to_path_buf()),
            "AGG_TEST_OVERRIDE_",
        )
        .unwrap();
        std::env::remove_var("AGG_TEST_OVERRIDE_WINDOW_COUNT");

        assert_eq!(config.window_count, 7);
        assert_eq!(config.window_type, WindowType::Rolling);
    }

    #[test]
    fn test_invalid_loaded_config_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "window_count: 0").unwrap();

        let result = AggregatorsConfig::load_with_prefix(
            Some(file.path().to_path_buf()),
            "AGG_TEST_INVALID_",
        );
        assert!(matches!(result, Err(AggregatorError::Configuration { .. })));
    }
}
