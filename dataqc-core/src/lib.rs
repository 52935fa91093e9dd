//! Core engine for DataQC.
//!
//! This crate validates batches of JSON records against declarative rules
//! and produces quality reports: per-record validation with confidence
//! scores, field distributions and anomalies, completeness and format
//! accuracy. The `dataqc` binary is a thin shell around [`QualityService`].
//!
//! # Guarantees
//! - Offline only: no network I/O anywhere in the engine
//! - Reports are a pure function of records, rules and configuration
//! - Bad data never aborts a run; it lowers scores and produces issues
//!
//! # Architecture
//! - `rules`: rule model and the evaluator that applies one rule to one value
//! - `validation`: per-record validation and batch fan-out
//! - `quality`: distributions, anomalies, completeness, accuracy and the
//!   report-building [`QualityAnalyzer`]
//! - `service`: request/response envelopes and dispatch on the action

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod patterns;
pub mod quality;
pub mod request_schema;
pub mod rules;
pub mod service;
pub mod sink;
pub mod validation;
pub mod value;

// Re-export commonly used types
pub use config::{
    AccuracyConfig, AnomalyConfig, AnomalySensitivity, CompletenessConfig, ConfigValidationError,
    PatternConfig, QualityConfig, SchemaSource, ValidationConfig,
};
pub use error::{DataQcError, Result};
pub use logging::init_logging;
pub use models::{Record, records_from_value};
pub use quality::{QualityAnalyzer, QualityReport, QualityScorecard, ValidationMetrics};
pub use request_schema::{RequestSchemaError, initialize_request_validator, validate_request};
pub use rules::{CustomValidators, Rule, RuleKind, RuleSet, RuleSeverity};
pub use service::{
    ErrorEnvelope, QUALITY_CONTROL_FAILED, QualityAction, QualityRequest, QualityResponse,
    QualityService,
};
pub use sink::{JsonLinesSink, MemorySink, ResultSink};
pub use validation::{Issue, RecordValidator, ValidationResult};
