//! Record validation.
//!
//! Applies an ordered rule set to each record and turns the rule outcomes
//! into a penalty-based confidence score:
//!
//! ```text
//! score      = 100 - Σ error penalties - warnings × warning_penalty
//! confidence = max(0, score) / 100
//! is_valid   = no errors && confidence >= threshold
//! ```
//!
//! A record that is not a JSON object fails with a single error and scores 0.
//! A rule definition that could not be parsed is reported on every record.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::QualityConfig;
use crate::models::Record;
use crate::patterns::CompiledPatterns;
use crate::rules::{CustomValidators, RuleEntry, RuleEvaluator, RuleSet};
use crate::value::type_name;

/// Penalty for a record that is not an object.
const MALFORMED_RECORD_PENALTY: f64 = 100.0;

/// Field name used for issues that concern the record as a whole.
pub const RECORD_FIELD: &str = "$record";

/// One validation error or warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Field the issue concerns
    pub field: String,
    /// Rule display name
    pub rule: String,
    /// Human-readable message
    pub message: String,
    /// Score deducted for this issue
    pub penalty: f64,
}

impl Issue {
    /// Creates a new issue.
    pub fn new(
        field: impl Into<String>,
        rule: impl Into<String>,
        message: impl Into<String>,
        penalty: f64,
    ) -> Self {
        Self {
            field: field.into(),
            rule: rule.into(),
            message: message.into(),
            penalty,
        }
    }
}

/// Validation outcome for one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Position of the record in the batch
    pub record_index: usize,
    /// The record's `id` field, or `record_<index>`
    pub record_id: String,
    /// No errors and confidence at or above the threshold
    pub is_valid: bool,
    /// Confidence in `[0, 1]`
    pub confidence: f64,
    /// Raw score; may go below zero
    pub score: f64,
    /// Failed error-severity rules
    pub errors: Vec<Issue>,
    /// Failed warning-severity rules
    pub warnings: Vec<Issue>,
}

impl ValidationResult {
    fn from_issues(
        record_index: usize,
        record_id: String,
        errors: Vec<Issue>,
        warnings: Vec<Issue>,
        warning_penalty: f64,
        threshold: f64,
    ) -> Self {
        let error_penalty: f64 = errors.iter().map(|issue| issue.penalty).sum();
        let score = 100.0 - error_penalty - warnings.len() as f64 * warning_penalty;
        let confidence = (score.max(0.0) / 100.0).min(1.0);
        let is_valid = errors.is_empty() && confidence >= threshold;

        Self {
            record_index,
            record_id,
            is_valid,
            confidence,
            score,
            errors,
            warnings,
        }
    }
}

/// Applies a rule set to records.
///
/// # Example
///
/// ```rust
/// use dataqc_core::config::QualityConfig;
/// use dataqc_core::models::Record;
/// use dataqc_core::validation::RecordValidator;
/// use serde_json::json;
///
/// let config = QualityConfig::default();
/// let validator = RecordValidator::with_default_rules(&config);
/// let record = Record::new(json!({
///     "firstName": "Ada", "lastName": "Lovelace", "email": "ada@example.com"
/// }));
///
/// let result = validator.validate_record(0, &record);
/// assert!(result.is_valid);
/// assert_eq!(result.confidence, 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct RecordValidator {
    rules: RuleSet,
    evaluator: RuleEvaluator,
    threshold: f64,
    warning_penalty: f64,
    parallel: bool,
}

impl RecordValidator {
    /// Creates a validator for `rules`, compiling every pattern once.
    pub fn new(
        rules: RuleSet,
        config: &QualityConfig,
        patterns: CompiledPatterns,
        custom: CustomValidators,
    ) -> Self {
        let evaluator = RuleEvaluator::new(
            rules.rules(),
            patterns,
            custom,
            config.validation.evaluation_error_penalty,
        );
        Self {
            rules,
            evaluator,
            threshold: config.validation.confidence_threshold,
            warning_penalty: config.validation.warning_penalty,
            parallel: config.validation.parallel,
        }
    }

    /// Creates a validator for the configured default rule set.
    pub fn with_default_rules(config: &QualityConfig) -> Self {
        Self::new(
            RuleSet::from(config.default_rules.clone()),
            config,
            CompiledPatterns::compile(&config.patterns),
            CustomValidators::new(),
        )
    }

    /// Builder method to override the confidence threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        if !(0.0..=1.0).contains(&threshold) {
            tracing::warn!("threshold {} clamped to valid range [0.0, 1.0]", threshold);
        }
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Returns the rule set.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Returns the confidence threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Validates one record.
    pub fn validate_record(&self, index: usize, record: &Record) -> ValidationResult {
        let record_id = record.id_or_position(index);

        if !record.is_object() {
            let kind = type_name(record.as_value());
            let issue = Issue::new(
                RECORD_FIELD,
                "record_object",
                format!("record must be an object, got {}", kind),
                MALFORMED_RECORD_PENALTY,
            );
            return ValidationResult::from_issues(
                index,
                record_id,
                vec![issue],
                Vec::new(),
                self.warning_penalty,
                self.threshold,
            );
        }

        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for entry in self.rules.entries() {
            match entry {
                RuleEntry::Rule(rule) => {
                    let value = record.resolve(&rule.field);
                    let outcome = self.evaluator.evaluate(value, rule, record);
                    let message = outcome.message.unwrap_or_default();
                    if !outcome.is_valid {
                        errors.push(Issue::new(
                            rule.target_field(),
                            rule.display_name(),
                            message,
                            outcome.penalty,
                        ));
                    } else if outcome.has_warning {
                        warnings.push(Issue::new(
                            rule.target_field(),
                            rule.display_name(),
                            message,
                            self.warning_penalty,
                        ));
                    }
                }
                RuleEntry::Broken(broken) => errors.push(Issue::new(
                    broken.field.clone(),
                    "invalid_rule",
                    format!("Rule #{} is invalid: {}", broken.position, broken.reason),
                    self.evaluator.evaluation_error_penalty(),
                )),
            }
        }

        ValidationResult::from_issues(
            index,
            record_id,
            errors,
            warnings,
            self.warning_penalty,
            self.threshold,
        )
    }

    /// Validates a batch, returning results in record order.
    ///
    /// Records are spread over the rayon pool unless parallel validation is
    /// disabled in the configuration.
    pub fn validate_batch(&self, records: &[Record]) -> Vec<ValidationResult> {
        if self.parallel {
            records
                .par_iter()
                .enumerate()
                .map(|(index, record)| self.validate_record(index, record))
                .collect()
        } else {
            records
                .iter()
                .enumerate()
                .map(|(index, record)| self.validate_record(index, record))
                .collect()
        }
    }
}
