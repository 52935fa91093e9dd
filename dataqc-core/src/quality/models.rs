//! Data quality report models.
//!
//! This module defines the data structures produced by the quality
//! dimensions. Reports carry no timestamps or generated identifiers so that
//! the same batch always serializes to the same bytes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::validation::ValidationResult;

/// Numeric statistics for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericStats {
    /// Arithmetic mean
    pub mean: f64,
    /// Population standard deviation (divides by N)
    pub std_dev: f64,
    /// Smallest value
    pub min: f64,
    /// Largest value
    pub max: f64,
    /// Element at index `n / 2` of the ascending values
    pub median: f64,
    /// Number of numeric-coercible values
    pub count: usize,
}

/// Observed value distribution of one field across a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDistribution {
    /// Field name
    pub field: String,
    /// Records carrying the field, nulls included
    pub value_count: usize,
    /// Records carrying the field as null
    pub null_count: usize,
    /// Non-null values by type name
    pub type_histogram: BTreeMap<String, usize>,
    /// Distinct values
    pub unique_count: usize,
    /// Mode, ties broken by first appearance
    pub most_common_value: Option<Value>,
    /// Occurrences of the mode
    pub most_common_count: usize,
    /// Present iff at least one value was numeric-coercible
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_stats: Option<NumericStats>,
}

/// Anomaly categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// Too few distinct values for the batch size
    LowUniqueness,
    /// More than one value type in a field
    MixedTypes,
    /// Numeric value beyond the z-score threshold
    Outlier,
}

impl AnomalyKind {
    /// Wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyKind::LowUniqueness => "low_uniqueness",
            AnomalyKind::MixedTypes => "mixed_types",
            AnomalyKind::Outlier => "outlier",
        }
    }
}

/// Anomaly severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalySeverity {
    /// Informational
    Low,
    /// Worth reviewing
    Medium,
    /// Likely a data defect
    High,
}

impl AnomalySeverity {
    /// Wire name of the severity.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalySeverity::Low => "low",
            AnomalySeverity::Medium => "medium",
            AnomalySeverity::High => "high",
        }
    }
}

/// One detected anomaly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    /// Field the anomaly concerns
    pub field: String,
    /// Anomaly category
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    /// Offending record, for outliers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_index: Option<usize>,
    /// Offending raw value, for outliers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Z-score of the value, for outliers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_score: Option<f64>,
    /// What was observed
    pub description: String,
    /// How bad it is
    pub severity: AnomalySeverity,
    /// What to do about it
    pub recommendation: String,
}

/// Anomaly detection output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyReport {
    /// Number of anomalies
    pub total_anomalies: usize,
    /// Anomalies per kind
    pub by_type: BTreeMap<String, usize>,
    /// Anomalies per severity
    pub by_severity: BTreeMap<String, usize>,
    /// Anomalies per 100 records, clamped to `[0, 100]`
    pub anomaly_rate: f64,
    /// Anomalies in field order
    pub anomalies: Vec<Anomaly>,
    /// Distributions the anomalies were derived from
    pub field_distributions: BTreeMap<String, FieldDistribution>,
    /// Suggested follow-ups
    pub recommendations: Vec<String>,
}

impl AnomalyReport {
    /// Builds a report from detected anomalies.
    pub fn new(
        anomalies: Vec<Anomaly>,
        field_distributions: BTreeMap<String, FieldDistribution>,
        recommendations: Vec<String>,
        record_count: usize,
    ) -> Self {
        let mut by_type = BTreeMap::new();
        let mut by_severity = BTreeMap::new();
        for anomaly in &anomalies {
            *by_type.entry(anomaly.kind.as_str().to_string()).or_insert(0) += 1;
            *by_severity
                .entry(anomaly.severity.as_str().to_string())
                .or_insert(0) += 1;
        }

        let anomaly_rate = if record_count == 0 {
            0.0
        } else {
            (anomalies.len() as f64 / record_count as f64 * 100.0).clamp(0.0, 100.0)
        };

        Self {
            total_anomalies: anomalies.len(),
            by_type,
            by_severity,
            anomaly_rate,
            anomalies,
            field_distributions,
            recommendations,
        }
    }

    /// Anomaly dimension score: `100 - anomaly_rate`.
    pub fn score(&self) -> f64 {
        100.0 - self.anomaly_rate
    }
}

/// Completeness band of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletenessStatus {
    /// At or above the good threshold
    Good,
    /// At or above the fair threshold
    Fair,
    /// Below the fair threshold
    Poor,
}

/// Completeness of one schema field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldCompleteness {
    /// Field name
    pub field: String,
    /// Records with a non-blank value
    pub complete: usize,
    /// Records without one
    pub missing: usize,
    /// `complete / records × 100`
    pub percentage: f64,
    /// Band
    pub status: CompletenessStatus,
}

/// A record missing at least one schema field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncompleteRecord {
    /// Position in the batch
    pub record_index: usize,
    /// `id` field or `record_<index>`
    pub record_id: String,
    /// Schema fields that are absent, null or blank
    pub missing_fields: Vec<String>,
}

/// Completeness checker output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletenessReport {
    /// Records checked
    pub total_records: usize,
    /// Expected fields, in schema order
    pub schema: Vec<String>,
    /// Complete field instances / expected instances × 100
    pub overall_completeness: f64,
    /// Per-field breakdown
    pub fields: Vec<FieldCompleteness>,
    /// Records with at least one missing field
    pub incomplete_records: Vec<IncompleteRecord>,
}

/// A value that failed an accuracy sub-check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracyFailure {
    /// Position in the batch
    pub record_index: usize,
    /// Field checked
    pub field: String,
    /// Offending value
    pub value: Value,
}

/// Result of one accuracy sub-check.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracyCheck {
    /// Present, non-null values inspected
    pub total_checked: usize,
    /// Values in the expected format
    pub passed: usize,
    /// `passed / total_checked × 100`, 100 when nothing was checked
    pub accuracy: f64,
    /// Values not in the expected format
    pub failures: Vec<AccuracyFailure>,
}

impl AccuracyCheck {
    /// Records one inspected value.
    pub fn record(&mut self, record_index: usize, field: &str, value: &Value, passed: bool) {
        self.total_checked += 1;
        if passed {
            self.passed += 1;
        } else {
            self.failures.push(AccuracyFailure {
                record_index,
                field: field.to_string(),
                value: value.clone(),
            });
        }
    }

    /// Fills in the accuracy percentage.
    pub fn finish(mut self) -> Self {
        self.accuracy = if self.total_checked == 0 {
            100.0
        } else {
            self.passed as f64 / self.total_checked as f64 * 100.0
        };
        self
    }
}

/// Accuracy checker output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracyReport {
    /// Records checked
    pub total_records: usize,
    /// Email format check
    pub email: AccuracyCheck,
    /// Phone format check
    pub phone: AccuracyCheck,
    /// Date validity check
    pub dates: AccuracyCheck,
    /// Numeric validity check
    pub numeric: AccuracyCheck,
    /// Σ passed / Σ checked × 100 over all sub-checks
    pub accuracy_score: f64,
    /// `round(accuracy_score / 100 × total_records)`
    pub valid_records: usize,
}

/// Record validation summary.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationMetrics {
    /// Records validated
    pub total_records: usize,
    /// Records that passed
    pub valid_records: usize,
    /// Records that failed
    pub invalid_records: usize,
    /// Mean confidence, 0 for an empty batch
    pub average_confidence: f64,
    /// Pass rate in percent
    pub quality_score: f64,
    /// Per-record results in batch order
    pub results: Vec<ValidationResult>,
}

impl ValidationMetrics {
    /// Summarizes per-record results.
    pub fn from_results(results: Vec<ValidationResult>) -> Self {
        let total_records = results.len();
        if total_records == 0 {
            return Self::default();
        }

        let valid_records = results.iter().filter(|r| r.is_valid).count();
        let confidence_sum: f64 = results.iter().map(|r| r.confidence).sum();

        Self {
            total_records,
            valid_records,
            invalid_records: total_records - valid_records,
            average_confidence: confidence_sum / total_records as f64,
            quality_score: valid_records as f64 / total_records as f64 * 100.0,
            results,
        }
    }
}

/// The four dimension scores, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionScores {
    /// Validation pass rate
    pub validation: f64,
    /// `100 - anomaly rate`
    pub anomalies: f64,
    /// Overall completeness
    pub completeness: f64,
    /// Accuracy score
    pub accuracy: f64,
}

impl DimensionScores {
    /// Unweighted mean of the four scores.
    pub fn overall(&self) -> f64 {
        (self.validation + self.anomalies + self.completeness + self.accuracy) / 4.0
    }
}

/// One titled section of a quality report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSection {
    /// Stable identifier
    pub id: String,
    /// Display title
    pub title: String,
    /// Dimension score
    pub score: f64,
    /// One-line summary
    pub summary: String,
}

impl ReportSection {
    /// Creates a section.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        score: f64,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            score,
            summary: summary.into(),
        }
    }
}

/// Complete quality report for one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    /// Records in the batch
    pub total_records: usize,
    /// Mean of the dimension scores
    pub quality_score: f64,
    /// Individual dimension scores
    pub scores: DimensionScores,
    /// Overview, anomalies, completeness, accuracy, in that order
    pub sections: Vec<ReportSection>,
    /// Record validation
    pub quality_metrics: ValidationMetrics,
    /// Anomaly detection
    pub anomalies: AnomalyReport,
    /// Completeness
    pub completeness: CompletenessReport,
    /// Accuracy
    pub accuracy: AccuracyReport,
    /// Suggested follow-ups
    pub recommendations: Vec<String>,
}

/// Dimension scores without per-record detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityScorecard {
    /// Records in the batch
    pub total_records: usize,
    /// Mean of the dimension scores
    pub quality_score: f64,
    /// Individual dimension scores
    pub scores: DimensionScores,
    /// Anomalies found
    pub total_anomalies: usize,
    /// Valid records
    pub valid_records: usize,
}

impl From<&QualityReport> for QualityScorecard {
    fn from(report: &QualityReport) -> Self {
        Self {
            total_records: report.total_records,
            quality_score: report.quality_score,
            scores: report.scores,
            total_anomalies: report.anomalies.total_anomalies,
            valid_records: report.quality_metrics.valid_records,
        }
    }
}
