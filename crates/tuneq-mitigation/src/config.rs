//! Configuration for mitigation sessions.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML)
//! 2. Environment variables (with `TUNEQ_` prefix)
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Hard ceiling on `max_qubits`: 2^n calibration circuits and a dense
/// 2^n × 2^n matrix stop being practical well before this.
pub const MAX_SUPPORTED_QUBITS: usize = 16;

/// Default allowed deviation of a calibration column sum from 1.
pub const DEFAULT_COLUMN_TOLERANCE: f64 = 1e-6;

/// How the calibration experiments are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationStrategy {
    /// One circuit per basis state (2^n circuits). Captures correlated
    /// readout errors.
    #[default]
    Full,
    /// Two circuits per qubit (2n circuits); the n-qubit matrix is the
    /// tensor product of single-qubit matrices. Ignores correlations.
    Tensored,
}

impl fmt::Display for CalibrationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationStrategy::Full => write!(f, "full"),
            CalibrationStrategy::Tensored => write!(f, "tensored"),
        }
    }
}

impl FromStr for CalibrationStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(CalibrationStrategy::Full),
            "tensored" | "tensor" => Ok(CalibrationStrategy::Tensored),
            other => Err(ConfigError::ValidationError(format!(
                "Unknown calibration strategy: '{other}'. Available: full, tensored"
            ))),
        }
    }
}

/// Mitigation session settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MitigationConfig {
    /// Shots per calibration circuit, and the default for payload runs.
    #[serde(default = "default_shots")]
    pub shots: u32,

    /// Largest register a session will calibrate.
    #[serde(default = "default_max_qubits")]
    pub max_qubits: usize,

    /// Calibration circuit layout.
    #[serde(default)]
    pub strategy: CalibrationStrategy,

    /// Allowed deviation of a calibration column sum from 1.
    #[serde(default = "default_column_tolerance")]
    pub column_tolerance: f64,

    /// Condition number above which the pseudo-inverse is used.
    #[serde(default = "default_condition_threshold")]
    pub condition_threshold: f64,

    /// Singular values below `pinv_rcond * σ_max` are dropped by the
    /// pseudo-inverse.
    #[serde(default = "default_pinv_rcond")]
    pub pinv_rcond: f64,

    /// Divide each calibration column by its own observed total instead of
    /// the requested shots.
    #[serde(default)]
    pub normalize_by_observed_shots: bool,
}

fn default_shots() -> u32 {
    1024
}

fn default_max_qubits() -> usize {
    10
}

fn default_column_tolerance() -> f64 {
    DEFAULT_COLUMN_TOLERANCE
}

fn default_condition_threshold() -> f64 {
    1e10
}

fn default_pinv_rcond() -> f64 {
    1e-10
}

impl Default for MitigationConfig {
    fn default() -> Self {
        Self {
            shots: default_shots(),
            max_qubits: default_max_qubits(),
            strategy: CalibrationStrategy::default(),
            column_tolerance: default_column_tolerance(),
            condition_threshold: default_condition_threshold(),
            pinv_rcond: default_pinv_rcond(),
            normalize_by_observed_shots: false,
        }
    }
}

impl MitigationConfig {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shot count.
    pub fn with_shots(mut self, shots: u32) -> Self {
        self.shots = shots;
        self
    }

    /// Set the largest register a session may calibrate.
    pub fn with_max_qubits(mut self, max_qubits: usize) -> Self {
        self.max_qubits = max_qubits;
        self
    }

    /// Set the calibration strategy.
    pub fn with_strategy(mut self, strategy: CalibrationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the column-sum tolerance.
    pub fn with_column_tolerance(mut self, tolerance: f64) -> Self {
        self.column_tolerance = tolerance;
        self
    }

    /// Set the ill-conditioning threshold.
    pub fn with_condition_threshold(mut self, threshold: f64) -> Self {
        self.condition_threshold = threshold;
        self
    }

    /// Set the relative singular-value cut-off for the pseudo-inverse.
    pub fn with_pinv_rcond(mut self, rcond: f64) -> Self {
        self.pinv_rcond = rcond;
        self
    }

    /// Tolerate backends that drop shots during calibration.
    pub fn with_observed_shot_normalization(mut self, enabled: bool) -> Self {
        self.normalize_by_observed_shots = enabled;
        self
    }

    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_yaml_str(&contents)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: MitigationConfig =
            serde_yaml_ng::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with the following precedence:
    /// 1. Load from file if provided
    /// 2. Apply environment variable overrides
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        let config = config.merge_env_with(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Merge overrides looked up by environment variable name.
    ///
    /// Only variables that are present and parse cleanly override the
    /// current values.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `TUNEQ_SHOTS` | `shots` |
    /// | `TUNEQ_MAX_QUBITS` | `max_qubits` |
    /// | `TUNEQ_STRATEGY` | `strategy` |
    /// | `TUNEQ_COLUMN_TOLERANCE` | `column_tolerance` |
    /// | `TUNEQ_CONDITION_THRESHOLD` | `condition_threshold` |
    /// | `TUNEQ_PINV_RCOND` | `pinv_rcond` |
    pub fn merge_env_with<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("TUNEQ_SHOTS").and_then(|v| v.parse().ok()) {
            self.shots = val;
        }
        if let Some(val) = lookup("TUNEQ_MAX_QUBITS").and_then(|v| v.parse().ok()) {
            self.max_qubits = val;
        }
        if let Some(val) = lookup("TUNEQ_STRATEGY").and_then(|v| v.parse().ok()) {
            self.strategy = val;
        }
        if let Some(val) = lookup("TUNEQ_COLUMN_TOLERANCE").and_then(|v| v.parse().ok()) {
            self.column_tolerance = val;
        }
        if let Some(val) = lookup("TUNEQ_CONDITION_THRESHOLD").and_then(|v| v.parse().ok()) {
            self.condition_threshold = val;
        }
        if let Some(val) = lookup("TUNEQ_PINV_RCOND").and_then(|v| v.parse().ok()) {
            self.pinv_rcond = val;
        }
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shots == 0 {
            return Err(ConfigError::ValidationError(
                "shots must be at least 1".into(),
            ));
        }
        if self.max_qubits == 0 || self.max_qubits > MAX_SUPPORTED_QUBITS {
            return Err(ConfigError::ValidationError(format!(
                "max_qubits must be between 1 and {MAX_SUPPORTED_QUBITS}, got {}",
                self.max_qubits
            )));
        }
        if !(self.column_tolerance.is_finite() && self.column_tolerance > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "column_tolerance must be positive, got {}",
                self.column_tolerance
            )));
        }
        if !(self.condition_threshold.is_finite() && self.condition_threshold >= 1.0) {
            return Err(ConfigError::ValidationError(format!(
                "condition_threshold must be at least 1, got {}",
                self.condition_threshold
            )));
        }
        if !(self.pinv_rcond.is_finite() && self.pinv_rcond > 0.0 && self.pinv_rcond < 1.0) {
            return Err(ConfigError::ValidationError(format!(
                "pinv_rcond must lie in (0, 1), got {}",
                self.pinv_rcond
            )));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = MitigationConfig::default();
        assert_eq!(config.shots, 1024);
        assert_eq!(config.max_qubits, 10);
        assert_eq!(config.strategy, CalibrationStrategy::Full);
        assert!((config.column_tolerance - 1e-6).abs() < f64::EPSILON);
        assert!((config.condition_threshold - 1e10).abs() < 1.0);
        assert!(!config.normalize_by_observed_shots);
        config.validate().unwrap();
    }

    #[test]
    fn test_builder() {
        let config = MitigationConfig::new()
            .with_shots(4000)
            .with_strategy(CalibrationStrategy::Tensored)
            .with_condition_threshold(1e6);
        assert_eq!(config.shots, 4000);
        assert_eq!(config.strategy, CalibrationStrategy::Tensored);
        config.validate().unwrap();
    }

    #[test]
    fn test_yaml_partial_uses_defaults() {
        let config = MitigationConfig::from_yaml_str("shots: 2000\nstrategy: tensored\n").unwrap();
        assert_eq!(config.shots, 2000);
        assert_eq!(config.strategy, CalibrationStrategy::Tensored);
        assert_eq!(config.max_qubits, 10);
    }

    #[test]
    fn test_yaml_invalid_values_rejected() {
        let err = MitigationConfig::from_yaml_str("shots: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));

        let err = MitigationConfig::from_yaml_str("strategy: bayesian\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tuneq.yaml");
        std::fs::write(&path, "max_qubits: 4\ncolumn_tolerance: 0.001\n").unwrap();

        let config = MitigationConfig::from_file(&path).unwrap();
        assert_eq!(config.max_qubits, 4);
        assert!((config.column_tolerance - 1e-3).abs() < f64::EPSILON);

        let missing = MitigationConfig::from_file(dir.path().join("nope.yaml"));
        assert!(matches!(missing, Err(ConfigError::IoError(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("TUNEQ_SHOTS", "512"),
            ("TUNEQ_STRATEGY", "tensored"),
            ("TUNEQ_CONDITION_THRESHOLD", "1e8"),
            ("TUNEQ_MAX_QUBITS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let config =
            MitigationConfig::default().merge_env_with(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.shots, 512);
        assert_eq!(config.strategy, CalibrationStrategy::Tensored);
        assert!((config.condition_threshold - 1e8).abs() < 1.0);
        // Unparseable values leave the field untouched.
        assert_eq!(config.max_qubits, 10);
    }

    #[test]
    fn test_validate_bounds() {
        assert!(MitigationConfig::new().with_max_qubits(0).validate().is_err());
        assert!(
            MitigationConfig::new()
                .with_max_qubits(MAX_SUPPORTED_QUBITS + 1)
                .validate()
                .is_err()
        );
        assert!(MitigationConfig::new().with_column_tolerance(0.0).validate().is_err());
        assert!(MitigationConfig::new().with_pinv_rcond(1.5).validate().is_err());
        assert!(MitigationConfig::new().with_condition_threshold(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("FULL".parse::<CalibrationStrategy>().unwrap(), CalibrationStrategy::Full);
        assert_eq!(
            "tensor".parse::<CalibrationStrategy>().unwrap(),
            CalibrationStrategy::Tensored
        );
        assert!("ibu".parse::<CalibrationStrategy>().is_err());
    }
}
