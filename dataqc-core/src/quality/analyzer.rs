//! Quality analyzer facade.
//!
//! This module provides the main `QualityAnalyzer` that runs record
//! validation, anomaly detection, completeness and accuracy over a batch
//! and merges them into one report.

use std::time::Instant;

use serde_json::Value;

use crate::config::QualityConfig;
use crate::models::Record;
use crate::patterns::CompiledPatterns;
use crate::rules::{CustomValidators, RuleSet};
use crate::validation::RecordValidator;

use super::accuracy::analyze_accuracy;
use super::anomaly::analyze_anomalies;
use super::completeness::analyze_completeness;
use super::models::{
    AccuracyReport, AnomalyReport, CompletenessReport, CompletenessStatus, DimensionScores,
    QualityReport, QualityScorecard, ReportSection, ValidationMetrics,
};

/// Validation pass rate below which a recommendation is emitted.
const PASS_RATE_TARGET: f64 = 80.0;
/// Completeness below which a recommendation is emitted.
const COMPLETENESS_TARGET: f64 = 95.0;
/// Accuracy below which a recommendation is emitted.
const ACCURACY_TARGET: f64 = 90.0;

/// Quality analyzer for record batches.
///
/// The analyzer compiles the configured patterns once and can be shared
/// across threads; every run is a pure function of the batch, the rule set
/// and the configuration.
///
/// # Example
///
/// ```rust
/// use dataqc_core::models::Record;
/// use dataqc_core::quality::QualityAnalyzer;
/// use serde_json::json;
///
/// let analyzer = QualityAnalyzer::with_defaults();
/// let records = vec![Record::new(json!({
///     "firstName": "Ada", "lastName": "Lovelace", "email": "ada@example.com"
/// }))];
///
/// let report = analyzer.generate_report(&records, &analyzer.default_rule_set(), None);
/// assert_eq!(report.sections.len(), 4);
/// println!("Quality score: {:.2}", report.quality_score);
/// ```
#[derive(Debug, Clone)]
pub struct QualityAnalyzer {
    config: QualityConfig,
    patterns: CompiledPatterns,
    custom: CustomValidators,
}

impl QualityAnalyzer {
    /// Creates a new quality analyzer with the given configuration.
    pub fn new(config: QualityConfig) -> Self {
        let patterns = CompiledPatterns::compile(&config.patterns);
        Self {
            config,
            patterns,
            custom: CustomValidators::new(),
        }
    }

    /// Creates a new quality analyzer with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(QualityConfig::default())
    }

    /// Builder method to supply predicates for `custom` rules.
    pub fn with_custom_validators(mut self, custom: CustomValidators) -> Self {
        self.custom = custom;
        self
    }

    /// Returns a reference to the analyzer configuration.
    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// The configured default rules.
    pub fn default_rule_set(&self) -> RuleSet {
        RuleSet::from(self.config.default_rules.clone())
    }

    /// Resolves request rules: `None` selects the default rules, while an
    /// explicit list (even an empty one) is used as given.
    pub fn rule_set(&self, rules: Option<&[Value]>) -> RuleSet {
        match rules {
            Some(definitions) => RuleSet::from_values(definitions),
            None => self.default_rule_set(),
        }
    }

    /// Builds a record validator for `rules`.
    pub fn validator(&self, rules: &RuleSet, threshold: Option<f64>) -> RecordValidator {
        let validator = RecordValidator::new(
            rules.clone(),
            &self.config,
            self.patterns.clone(),
            self.custom.clone(),
        );
        match threshold {
            Some(threshold) => validator.with_threshold(threshold),
            None => validator,
        }
    }

    /// Validates every record and summarizes the results.
    pub fn validate_quality(
        &self,
        records: &[Record],
        rules: &RuleSet,
        threshold: Option<f64>,
    ) -> ValidationMetrics {
        let started = Instant::now();
        let results = self.validator(rules, threshold).validate_batch(records);
        let metrics = ValidationMetrics::from_results(results);
        tracing::debug!(
            "Validated {} records against {} rules in {:?} ({} valid)",
            metrics.total_records,
            rules.len(),
            started.elapsed(),
            metrics.valid_records
        );
        metrics
    }

    /// Builds field distributions and detects anomalies.
    pub fn detect_anomalies(&self, records: &[Record]) -> AnomalyReport {
        analyze_anomalies(records, &self.config.anomaly_detection)
    }

    /// Measures completeness.
    pub fn check_completeness(&self, records: &[Record]) -> CompletenessReport {
        analyze_completeness(records, &self.config.completeness)
    }

    /// Measures format accuracy.
    pub fn check_accuracy(&self, records: &[Record]) -> AccuracyReport {
        analyze_accuracy(records, &self.config.accuracy, &self.patterns)
    }

    /// Runs every quality dimension and merges the results.
    ///
    /// The four dimensions read the same immutable batch, so with parallel
    /// mode on they run concurrently on the rayon pool.
    pub fn generate_report(
        &self,
        records: &[Record],
        rules: &RuleSet,
        threshold: Option<f64>,
    ) -> QualityReport {
        let started = Instant::now();

        let (quality_metrics, (anomalies, (completeness, accuracy))) =
            if self.config.validation.parallel {
                rayon::join(
                    || self.validate_quality(records, rules, threshold),
                    || {
                        rayon::join(
                            || self.detect_anomalies(records),
                            || {
                                rayon::join(
                                    || self.check_completeness(records),
                                    || self.check_accuracy(records),
                                )
                            },
                        )
                    },
                )
            } else {
                (
                    self.validate_quality(records, rules, threshold),
                    (
                        self.detect_anomalies(records),
                        (self.check_completeness(records), self.check_accuracy(records)),
                    ),
                )
            };

        let total_records = records.len();
        let scores = if total_records == 0 {
            DimensionScores::default()
        } else {
            DimensionScores {
                validation: quality_metrics.quality_score,
                anomalies: anomalies.score(),
                completeness: completeness.overall_completeness,
                accuracy: accuracy.accuracy_score,
            }
        };
        let quality_score = scores.overall();

        let sections = build_sections(
            &scores,
            &quality_metrics,
            &anomalies,
            &completeness,
            &accuracy,
        );
        let recommendations = if total_records == 0 {
            Vec::new()
        } else {
            build_recommendations(&scores, &anomalies, &completeness)
        };

        tracing::info!(
            "Quality report for {} records: score {:.2} ({} anomalies)",
            total_records,
            quality_score,
            anomalies.total_anomalies
        );
        tracing::debug!("Report generated in {:?}", started.elapsed());

        QualityReport {
            total_records,
            quality_score,
            scores,
            sections,
            quality_metrics,
            anomalies,
            completeness,
            accuracy,
            recommendations,
        }
    }

    /// Computes the dimension scores without per-record detail.
    pub fn scorecard(
        &self,
        records: &[Record],
        rules: &RuleSet,
        threshold: Option<f64>,
    ) -> QualityScorecard {
        QualityScorecard::from(&self.generate_report(records, rules, threshold))
    }
}

fn build_sections(
    scores: &DimensionScores,
    metrics: &ValidationMetrics,
    anomalies: &AnomalyReport,
    completeness: &CompletenessReport,
    accuracy: &AccuracyReport,
) -> Vec<ReportSection> {
    let checked = accuracy.email.total_checked
        + accuracy.phone.total_checked
        + accuracy.dates.total_checked
        + accuracy.numeric.total_checked;
    let passed = accuracy.email.passed
        + accuracy.phone.passed
        + accuracy.dates.passed
        + accuracy.numeric.passed;

    vec![
        ReportSection::new(
            "quality_overview",
            "Quality Overview",
            scores.validation,
            format!(
                "{} of {} records passed validation (average confidence {:.2})",
                metrics.valid_records, metrics.total_records, metrics.average_confidence
            ),
        ),
        ReportSection::new(
            "anomalies",
            "Anomaly Detection",
            scores.anomalies,
            format!(
                "{} anomalies detected across {} fields",
                anomalies.total_anomalies,
                anomalies.field_distributions.len()
            ),
        ),
        ReportSection::new(
            "completeness",
            "Data Completeness",
            scores.completeness,
            format!(
                "{:.1}% of expected field values present, {} incomplete records",
                completeness.overall_completeness,
                completeness.incomplete_records.len()
            ),
        ),
        ReportSection::new(
            "accuracy",
            "Data Accuracy",
            scores.accuracy,
            format!(
                "{} of {} checked values correctly formatted",
                passed, checked
            ),
        ),
    ]
}

fn build_recommendations(
    scores: &DimensionScores,
    anomalies: &AnomalyReport,
    completeness: &CompletenessReport,
) -> Vec<String> {
    let mut recommendations = anomalies.recommendations.clone();

    if scores.validation < PASS_RATE_TARGET {
        recommendations.push(format!(
            "Improve input validation: only {:.1}% of records pass the rule set",
            scores.validation
        ));
    }
    if scores.completeness < COMPLETENESS_TARGET {
        let poor: Vec<&str> = completeness
            .fields
            .iter()
            .filter(|f| f.status == CompletenessStatus::Poor)
            .map(|f| f.field.as_str())
            .collect();
        if poor.is_empty() {
            recommendations.push("Fill in missing values to improve completeness".to_string());
        } else {
            recommendations.push(format!(
                "Fill in missing values for poorly populated fields: {}",
                poor.join(", ")
            ));
        }
    }
    if scores.accuracy < ACCURACY_TARGET {
        recommendations.push(
            "Correct malformed email, phone, date and numeric values at the source".to_string(),
        );
    }

    recommendations
}
