//! Quality engine configuration.
//!
//! This module provides the thresholds, penalties, field lists, patterns and
//! default rule set used by the engine. Every section deserializes with
//! defaults so partial JSON configuration files are accepted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rules::Rule;
use crate::{DataQcError, Result};

/// Anomaly detection sensitivity level.
///
/// Controls how many standard deviations from the mean a value
/// must be to be considered an outlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnomalySensitivity {
    /// 3.0 standard deviations - fewer false positives
    #[default]
    Low,
    /// 2.5 standard deviations - balanced detection
    Medium,
    /// 2.0 standard deviations - more aggressive detection
    High,
}

impl AnomalySensitivity {
    /// Returns the z-score threshold for this sensitivity level.
    pub fn z_score_threshold(&self) -> f64 {
        match self {
            AnomalySensitivity::Low => 3.0,
            AnomalySensitivity::Medium => 2.5,
            AnomalySensitivity::High => 2.0,
        }
    }
}

/// Record validation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Minimum confidence (0.0-1.0) for a record to be valid
    pub confidence_threshold: f64,
    /// Score deducted per warning
    pub warning_penalty: f64,
    /// Penalty for a rule that cannot be evaluated
    pub evaluation_error_penalty: f64,
    /// Validate records on the rayon pool
    pub parallel: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.8,
            warning_penalty: 5.0,
            evaluation_error_penalty: 15.0,
            parallel: true,
        }
    }
}

impl ValidationConfig {
    /// Creates a new validation config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the confidence threshold.
    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        if !(0.0..=1.0).contains(&threshold) {
            tracing::warn!(
                "confidence_threshold {} clamped to valid range [0.0, 1.0]",
                threshold
            );
        }
        self.confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Builder method to set the per-warning penalty.
    pub fn with_warning_penalty(mut self, penalty: f64) -> Self {
        if penalty < 0.0 {
            tracing::warn!("warning_penalty {} clamped to 0", penalty);
        }
        self.warning_penalty = penalty.max(0.0);
        self
    }

    /// Builder method to set the evaluation-error penalty.
    pub fn with_evaluation_error_penalty(mut self, penalty: f64) -> Self {
        if penalty < 0.0 {
            tracing::warn!("evaluation_error_penalty {} clamped to 0", penalty);
        }
        self.evaluation_error_penalty = penalty.max(0.0);
        self
    }

    /// Builder method to enable/disable parallel validation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Anomaly detection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Enable anomaly detection
    pub enabled: bool,
    /// Detection sensitivity level
    pub sensitivity: AnomalySensitivity,
    /// A field is low-uniqueness when its distinct count falls below
    /// `max(1, ratio * record_count)`
    pub low_uniqueness_ratio: f64,
    /// Anomaly count, as a share of the batch, above which a data-entry
    /// review is recommended
    pub review_ratio: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sensitivity: AnomalySensitivity::Low,
            low_uniqueness_ratio: 0.01,
            review_ratio: 0.10,
        }
    }
}

impl AnomalyConfig {
    /// Creates a new anomaly config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to enable/disable anomaly detection.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Builder method to set sensitivity level.
    pub fn with_sensitivity(mut self, sensitivity: AnomalySensitivity) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    /// Builder method to set the low-uniqueness ratio.
    pub fn with_low_uniqueness_ratio(mut self, ratio: f64) -> Self {
        if !(0.0..=1.0).contains(&ratio) {
            tracing::warn!(
                "low_uniqueness_ratio {} clamped to valid range [0.0, 1.0]",
                ratio
            );
        }
        self.low_uniqueness_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Builder method to set the review ratio.
    pub fn with_review_ratio(mut self, ratio: f64) -> Self {
        if !(0.0..=1.0).contains(&ratio) {
            tracing::warn!("review_ratio {} clamped to valid range [0.0, 1.0]", ratio);
        }
        self.review_ratio = ratio.clamp(0.0, 1.0);
        self
    }
}

/// Where the completeness checker takes its expected field set from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SchemaSource {
    /// Keys of the first record
    #[default]
    FirstRecord,
    /// Keys of every record in the batch
    Union,
}

/// Completeness checker settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletenessConfig {
    /// Expected field set source
    pub schema_source: SchemaSource,
    /// Minimum percentage for `good` status
    pub good_min: f64,
    /// Minimum percentage for `fair` status
    pub fair_min: f64,
}

impl Default for CompletenessConfig {
    fn default() -> Self {
        Self {
            schema_source: SchemaSource::FirstRecord,
            good_min: 95.0,
            fair_min: 80.0,
        }
    }
}

impl CompletenessConfig {
    /// Creates a new completeness config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the schema source.
    pub fn with_schema_source(mut self, source: SchemaSource) -> Self {
        self.schema_source = source;
        self
    }
}

/// Field names inspected by each accuracy sub-check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccuracyConfig {
    /// Fields checked against the email pattern
    pub email_fields: Vec<String>,
    /// Fields checked against the phone pattern
    pub phone_fields: Vec<String>,
    /// Fields that must hold a parseable date
    pub date_fields: Vec<String>,
    /// Fields that must hold a number
    pub numeric_fields: Vec<String>,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

impl Default for AccuracyConfig {
    fn default() -> Self {
        Self {
            email_fields: names(&["email"]),
            phone_fields: names(&["phone"]),
            date_fields: names(&["dateOfBirth", "date", "createdAt", "updatedAt"]),
            numeric_fields: names(&["quantity", "price", "amount", "score", "rating"]),
        }
    }
}

/// Regular expressions for email, phone and date-of-birth checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Email address pattern
    pub email: String,
    /// Phone pattern, matched after separators are stripped
    pub phone: String,
    /// Date-of-birth pattern used by the default rule set
    pub date_of_birth: String,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            email: r"^[^\s@]+@[^\s@]+\.[^\s@]+$".to_string(),
            phone: r"^\+?[1-9]\d{1,14}$".to_string(),
            date_of_birth: r"^\d{4}-\d{2}-\d{2}$".to_string(),
        }
    }
}

/// Quality engine configuration.
///
/// Controls validation thresholds, anomaly detection, completeness bands,
/// accuracy field lists, patterns and the default rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Record validation settings
    pub validation: ValidationConfig,
    /// Anomaly detection settings
    pub anomaly_detection: AnomalyConfig,
    /// Completeness settings
    pub completeness: CompletenessConfig,
    /// Accuracy field lists
    pub accuracy: AccuracyConfig,
    /// Format patterns
    pub patterns: PatternConfig,
    /// Rules applied when a request supplies none
    pub default_rules: Vec<Rule>,
}

/// Validation errors for quality configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigValidationError {
    #[error("confidence_threshold must be between 0.0 and 1.0, got {0}")]
    InvalidThreshold(f64),
    #[error("{name} must be a non-negative number, got {value}")]
    InvalidPenalty { name: &'static str, value: f64 },
    #[error("{name} must be between 0.0 and 1.0, got {value}")]
    InvalidRatio { name: &'static str, value: f64 },
    #[error("completeness bands must satisfy 0 <= fair_min <= good_min <= 100, got fair {fair}, good {good}")]
    InvalidCompletenessBands { good: f64, fair: f64 },
}

/// Rules used when a request does not supply its own.
pub fn default_rules(patterns: &PatternConfig) -> Vec<Rule> {
    vec![
        Rule::required("firstName"),
        Rule::required("lastName"),
        Rule::email("email"),
        Rule::phone("phone"),
        Rule::format("dateOfBirth", patterns.date_of_birth.clone()),
    ]
}

impl Default for QualityConfig {
    fn default() -> Self {
        let patterns = PatternConfig::default();
        Self {
            validation: ValidationConfig::default(),
            anomaly_detection: AnomalyConfig::default(),
            completeness: CompletenessConfig::default(),
            accuracy: AccuracyConfig::default(),
            default_rules: default_rules(&patterns),
            patterns,
        }
    }
}

impl QualityConfig {
    /// Creates a new quality config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a JSON configuration document.
    ///
    /// # Errors
    /// Returns `DataQcError::Serialization` for malformed JSON and
    /// `DataQcError::Configuration` when a value is out of range.
    ///
    /// When the document has no `default_rules`, the default rule set is
    /// rebuilt from the document's `patterns`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let document: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| DataQcError::serialization("Failed to parse quality configuration", e))?;
        let has_rules = document.get("default_rules").is_some();
        let mut config: Self = serde_json::from_value(document)
            .map_err(|e| DataQcError::serialization("Failed to parse quality configuration", e))?;
        if !has_rules {
            config.default_rules = default_rules(&config.patterns);
        }
        config
            .validate()
            .map_err(|e| DataQcError::configuration(e.to_string()))?;
        Ok(config)
    }

    /// Builder method to set validation settings.
    pub fn with_validation(mut self, validation: ValidationConfig) -> Self {
        self.validation = validation;
        self
    }

    /// Builder method to set the confidence threshold.
    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.validation = self.validation.with_confidence_threshold(threshold);
        self
    }

    /// Builder method to enable/disable parallel validation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.validation = self.validation.with_parallel(parallel);
        self
    }

    /// Builder method to set anomaly detection config.
    pub fn with_anomaly_detection(mut self, config: AnomalyConfig) -> Self {
        self.anomaly_detection = config;
        self
    }

    /// Builder method to set completeness config.
    pub fn with_completeness(mut self, config: CompletenessConfig) -> Self {
        self.completeness = config;
        self
    }

    /// Builder method to set accuracy field lists.
    pub fn with_accuracy(mut self, config: AccuracyConfig) -> Self {
        self.accuracy = config;
        self
    }

    /// Builder method to set patterns.
    ///
    /// A default rule set still built from the previous patterns is rebuilt
    /// from the new ones; a customized rule set is left alone.
    pub fn with_patterns(mut self, patterns: PatternConfig) -> Self {
        if self.default_rules == default_rules(&self.patterns) {
            self.default_rules = default_rules(&patterns);
        }
        self.patterns = patterns;
        self
    }

    /// Builder method to replace the default rule set.
    pub fn with_default_rules(mut self, rules: Vec<Rule>) -> Self {
        self.default_rules = rules;
        self
    }

    /// Validates the configuration.
    ///
    /// Returns an error if any threshold, penalty or ratio is outside its
    /// valid range. Patterns are not checked here: an invalid pattern is
    /// reported per field during evaluation.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        let validation = &self.validation;
        if !(0.0..=1.0).contains(&validation.confidence_threshold) {
            return Err(ConfigValidationError::InvalidThreshold(
                validation.confidence_threshold,
            ));
        }
        for (name, value) in [
            ("warning_penalty", validation.warning_penalty),
            ("evaluation_error_penalty", validation.evaluation_error_penalty),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(ConfigValidationError::InvalidPenalty { name, value });
            }
        }
        for (name, value) in [
            (
                "low_uniqueness_ratio",
                self.anomaly_detection.low_uniqueness_ratio,
            ),
            ("review_ratio", self.anomaly_detection.review_ratio),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigValidationError::InvalidRatio { name, value });
            }
        }
        let CompletenessConfig {
            good_min, fair_min, ..
        } = self.completeness;
        if !(0.0 <= fair_min && fair_min <= good_min && good_min <= 100.0) {
            return Err(ConfigValidationError::InvalidCompletenessBands {
                good: good_min,
                fair: fair_min,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleKind;

    #[test]
    fn test_anomaly_sensitivity_z_scores() {
        assert_eq!(AnomalySensitivity::Low.z_score_threshold(), 3.0);
        assert_eq!(AnomalySensitivity::Medium.z_score_threshold(), 2.5);
        assert_eq!(AnomalySensitivity::High.z_score_threshold(), 2.0);
    }

    #[test]
    fn test_anomaly_sensitivity_default() {
        // Outliers are flagged beyond three standard deviations by default
        assert_eq!(AnomalySensitivity::default(), AnomalySensitivity::Low);
    }

    #[test]
    fn test_quality_config_default() {
        let config = QualityConfig::default();
        assert_eq!(config.validation.confidence_threshold, 0.8);
        assert_eq!(config.validation.warning_penalty, 5.0);
        assert_eq!(config.validation.evaluation_error_penalty, 15.0);
        assert!(config.validation.parallel);
        assert!(config.anomaly_detection.enabled);
        assert_eq!(config.anomaly_detection.low_uniqueness_ratio, 0.01);
        assert_eq!(config.completeness.schema_source, SchemaSource::FirstRecord);
        assert_eq!(config.accuracy.date_fields.len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_rules() {
        let config = QualityConfig::default();
        let summary: Vec<_> = config
            .default_rules
            .iter()
            .map(|rule| (rule.field.as_str(), rule.kind.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("firstName", "required"),
                ("lastName", "required"),
                ("email", "email"),
                ("phone", "phone"),
                ("dateOfBirth", "format"),
            ]
        );
        match &config.default_rules[4].kind {
            RuleKind::Format { parameters } => {
                assert_eq!(parameters.pattern, r"^\d{4}-\d{2}-\d{2}$");
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_quality_config_builder() {
        let config = QualityConfig::new()
            .with_confidence_threshold(0.6)
            .with_parallel(false)
            .with_anomaly_detection(
                AnomalyConfig::new()
                    .with_enabled(false)
                    .with_sensitivity(AnomalySensitivity::High),
            )
            .with_completeness(CompletenessConfig::new().with_schema_source(SchemaSource::Union))
            .with_default_rules(vec![]);

        assert_eq!(config.validation.confidence_threshold, 0.6);
        assert!(!config.validation.parallel);
        assert!(!config.anomaly_detection.enabled);
        assert_eq!(
            config.anomaly_detection.sensitivity,
            AnomalySensitivity::High
        );
        assert_eq!(config.completeness.schema_source, SchemaSource::Union);
        assert!(config.default_rules.is_empty());
    }

    #[test]
    fn test_builder_clamping() {
        let config = QualityConfig::new().with_confidence_threshold(1.5);
        assert_eq!(config.validation.confidence_threshold, 1.0);

        let validation = ValidationConfig::new()
            .with_warning_penalty(-3.0)
            .with_evaluation_error_penalty(-1.0);
        assert_eq!(validation.warning_penalty, 0.0);
        assert_eq!(validation.evaluation_error_penalty, 0.0);

        let anomaly = AnomalyConfig::new()
            .with_low_uniqueness_ratio(2.0)
            .with_review_ratio(-0.5);
        assert_eq!(anomaly.low_uniqueness_ratio, 1.0);
        assert_eq!(anomaly.review_ratio, 0.0);
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        // Fields are set directly to bypass builder clamping
        let mut config = QualityConfig::default();
        config.validation.confidence_threshold = 1.2;
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::InvalidThreshold(1.2))
        );

        let mut config = QualityConfig::default();
        config.validation.warning_penalty = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidPenalty {
                name: "warning_penalty",
                ..
            })
        ));

        let mut config = QualityConfig::default();
        config.anomaly_detection.review_ratio = 3.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidRatio {
                name: "review_ratio",
                ..
            })
        ));

        let mut config = QualityConfig::default();
        config.completeness.fair_min = 97.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidCompletenessBands { .. })
        ));
    }

    #[test]
    fn test_from_json_str_accepts_partial_documents() {
        let config = QualityConfig::from_json_str(
            r#"{
                "validation": {"confidence_threshold": 0.5},
                "anomaly_detection": {"sensitivity": "high"},
                "completeness": {"schema_source": "union"}
            }"#,
        )
        .unwrap();

        assert_eq!(config.validation.confidence_threshold, 0.5);
        assert_eq!(config.validation.warning_penalty, 5.0);
        assert_eq!(
            config.anomaly_detection.sensitivity,
            AnomalySensitivity::High
        );
        assert_eq!(config.completeness.schema_source, SchemaSource::Union);
        assert_eq!(config.default_rules.len(), 5);
    }

    #[test]
    fn test_from_json_str_custom_rules() {
        let config = QualityConfig::from_json_str(
            r#"{"default_rules": [{"field": "sku", "type": "required"}]}"#,
        )
        .unwrap();
        assert_eq!(config.default_rules.len(), 1);
        assert_eq!(config.default_rules[0].field, "sku");
    }

    #[test]
    fn test_from_json_str_rebuilds_default_rules_from_patterns() {
        let config = QualityConfig::from_json_str(
            r#"{"patterns": {"date_of_birth": "^\\d{2}/\\d{2}/\\d{4}$"}}"#,
        )
        .unwrap();

        assert_eq!(config.patterns.date_of_birth, r"^\d{2}/\d{2}/\d{4}$");
        assert_eq!(config.default_rules, default_rules(&config.patterns));
    }

    #[test]
    fn test_with_patterns_rebuilds_only_default_rules() {
        let patterns = PatternConfig {
            date_of_birth: r"^\d{8}$".to_string(),
            ..PatternConfig::default()
        };

        let config = QualityConfig::new().with_patterns(patterns.clone());
        assert_eq!(config.default_rules, default_rules(&patterns));

        let custom = vec![Rule::required("sku")];
        let config = QualityConfig::new()
            .with_default_rules(custom.clone())
            .with_patterns(patterns);
        assert_eq!(config.default_rules, custom);
    }

    #[test]
    fn test_from_json_str_errors() {
        assert!(matches!(
            QualityConfig::from_json_str("{not json"),
            Err(DataQcError::Serialization { .. })
        ));
        assert!(matches!(
            QualityConfig::from_json_str(r#"{"validation": {"confidence_threshold": 4}}"#),
            Err(DataQcError::Configuration { .. })
        ));
    }

    #[test]
    fn test_config_roundtrips_through_json() {
        let config = QualityConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(QualityConfig::from_json_str(&json).unwrap(), config);
    }
}
