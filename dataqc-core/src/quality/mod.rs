//! Data quality assessment module.
//!
//! This module provides batch-level quality analysis:
//! - **Distributions**: per-field type histograms, uniqueness and numeric statistics
//! - **Anomaly Detection**: low uniqueness, mixed types and z-score outliers
//! - **Completeness**: share of expected field values that are present
//! - **Accuracy**: email, phone, date and numeric format checks
//!
//! `QualityAnalyzer` combines these with record validation into a single
//! `QualityReport`.
//!
//! # Example
//! ```rust
//! use dataqc_core::config::QualityConfig;
//! use dataqc_core::models::Record;
//! use dataqc_core::quality::QualityAnalyzer;
//! use serde_json::json;
//!
//! let analyzer = QualityAnalyzer::new(QualityConfig::default());
//! let records = vec![Record::new(json!({"age": 25})), Record::new(json!({"age": "thirty"}))];
//! let report = analyzer.detect_anomalies(&records);
//! assert_eq!(report.total_anomalies, 1);
//! ```

mod accuracy;
mod analyzer;
mod anomaly;
mod completeness;
mod distribution;
mod models;

// Re-export public API
pub use accuracy::{analyze_accuracy, is_valid_date};
pub use analyzer::QualityAnalyzer;
pub use anomaly::{analyze_anomalies, anomaly_recommendations, detect_anomalies};
pub use completeness::analyze_completeness;
pub use distribution::{analyze_distributions, calculate_statistics};
pub use models::{
    AccuracyCheck, AccuracyFailure, AccuracyReport, Anomaly, AnomalyKind, AnomalyReport,
    AnomalySeverity, CompletenessReport, CompletenessStatus, DimensionScores, FieldCompleteness,
    FieldDistribution, IncompleteRecord, NumericStats, QualityReport, QualityScorecard,
    ReportSection, ValidationMetrics,
};
