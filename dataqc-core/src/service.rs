//! Request/response service over the quality analyzer.
//!
//! Two failure levels are kept apart:
//!
//! - the *data* failed (data not a list, invalid threshold, malformed
//!   envelope fields): the service answers `success: false` with an `error`
//!   message, like an HTTP 200 carrying a negative result;
//! - the *service* failed (no usable `action`): the service returns `Err`,
//!   and the transport answers with an [`ErrorEnvelope`] carrying the
//!   `QUALITY_CONTROL_FAILED` code, like an HTTP 500.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Record, records_from_value};
use crate::quality::{
    AccuracyReport, AnomalyReport, CompletenessReport, QualityAnalyzer, QualityReport,
    QualityScorecard, ValidationMetrics,
};
use crate::request_schema::{RequestSchemaError, validate_request};
use crate::sink::ResultSink;
use crate::{DataQcError, Result};

/// Error code carried by transport-level failure envelopes.
pub const QUALITY_CONTROL_FAILED: &str = "QUALITY_CONTROL_FAILED";

/// Operations the service performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityAction {
    /// Validate every record against the rules
    ValidateQuality,
    /// Field distributions and anomalies
    DetectAnomalies,
    /// Completeness report
    CheckCompleteness,
    /// Format accuracy report
    ValidateAccuracy,
    /// Full quality report
    GenerateQcReport,
    /// Dimension scores only
    GetQualityMetrics,
}

impl QualityAction {
    /// All actions in documentation order.
    pub const ALL: [QualityAction; 6] = [
        QualityAction::ValidateQuality,
        QualityAction::DetectAnomalies,
        QualityAction::CheckCompleteness,
        QualityAction::ValidateAccuracy,
        QualityAction::GenerateQcReport,
        QualityAction::GetQualityMetrics,
    ];

    /// Wire name of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityAction::ValidateQuality => "validate_quality",
            QualityAction::DetectAnomalies => "detect_anomalies",
            QualityAction::CheckCompleteness => "check_completeness",
            QualityAction::ValidateAccuracy => "validate_accuracy",
            QualityAction::GenerateQcReport => "generate_qc_report",
            QualityAction::GetQualityMetrics => "get_quality_metrics",
        }
    }

    /// Parses a wire name.
    ///
    /// # Errors
    /// Returns `DataQcError::InvalidInput` for unknown names.
    pub fn parse(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == name)
            .ok_or_else(|| DataQcError::invalid_input(format!("Unknown action '{}'", name)))
    }
}

impl fmt::Display for QualityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A quality request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityRequest {
    /// Operation to perform
    pub action: QualityAction,
    /// Record batch; must be an array (absent means empty)
    #[serde(default)]
    pub data: Value,
    /// Rule definitions; `None` selects the configured default rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<Value>>,
    /// Confidence threshold override in `[0, 1]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

impl QualityRequest {
    /// Creates a request with default rules and threshold.
    pub fn new(action: QualityAction, data: Value) -> Self {
        Self {
            action,
            data,
            rules: None,
            threshold: None,
        }
    }

    /// Builder method to set rule definitions.
    pub fn with_rules(mut self, rules: Vec<Value>) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Builder method to set the confidence threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }
}

/// Response to a quality request.
///
/// Exactly one payload field is set on success, matching the action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityResponse {
    /// Action that was performed
    pub action: QualityAction,
    /// When the response was produced
    pub timestamp: DateTime<Utc>,
    /// False when the input failed validation
    pub success: bool,
    /// `validate_quality` payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_metrics: Option<ValidationMetrics>,
    /// `detect_anomalies` payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomalies: Option<AnomalyReport>,
    /// `check_completeness` payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completeness: Option<CompletenessReport>,
    /// `validate_accuracy` payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<AccuracyReport>,
    /// `generate_qc_report` payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<QualityReport>,
    /// `get_quality_metrics` payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<QualityScorecard>,
    /// Why the input was rejected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QualityResponse {
    /// Successful response without a payload.
    pub fn success(action: QualityAction) -> Self {
        Self {
            action,
            timestamp: Utc::now(),
            success: true,
            quality_metrics: None,
            anomalies: None,
            completeness: None,
            accuracy: None,
            report: None,
            metrics: None,
            error: None,
        }
    }

    /// Response for input that failed validation.
    pub fn failure(action: QualityAction, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::success(action)
        }
    }
}

/// Transport-level failure envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Always false
    pub success: bool,
    /// What went wrong
    pub error: String,
    /// Always [`QUALITY_CONTROL_FAILED`]
    pub code: String,
    /// When the failure was reported
    pub timestamp: DateTime<Utc>,
}

impl ErrorEnvelope {
    /// Wraps a service error.
    pub fn from_error(error: &DataQcError) -> Self {
        Self {
            success: false,
            error: error.to_string(),
            code: QUALITY_CONTROL_FAILED.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Quality service: validates requests, runs the analyzer and hands the
/// response to an optional audit sink.
#[derive(Clone)]
pub struct QualityService {
    analyzer: QualityAnalyzer,
    sink: Option<Arc<dyn ResultSink>>,
}

impl fmt::Debug for QualityService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QualityService")
            .field("analyzer", &self.analyzer)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

impl QualityService {
    /// Creates a service around an analyzer.
    pub fn new(analyzer: QualityAnalyzer) -> Self {
        Self {
            analyzer,
            sink: None,
        }
    }

    /// Creates a service with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(QualityAnalyzer::with_defaults())
    }

    /// Builder method to attach an audit sink.
    pub fn with_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Returns the analyzer.
    pub fn analyzer(&self) -> &QualityAnalyzer {
        &self.analyzer
    }

    /// Handles a raw JSON request envelope.
    ///
    /// # Errors
    /// Returns `DataQcError::InvalidInput` when the envelope has no usable
    /// `action`. Every other problem is reported in the response.
    pub fn handle_value(&self, request: &Value) -> Result<QualityResponse> {
        let action = match request.get("action") {
            Some(Value::String(name)) => QualityAction::parse(name)?,
            Some(other) => {
                return Err(DataQcError::invalid_input(format!(
                    "action must be a string, got {}",
                    crate::value::type_name(other)
                )));
            }
            None => return Err(DataQcError::invalid_input("action is required")),
        };

        match validate_request(request) {
            Ok(()) => {}
            Err(RequestSchemaError::ValidationFailed { errors, .. }) => {
                return Ok(self.finish(QualityResponse::failure(
                    action,
                    format!("Invalid request: {}", errors.join("; ")),
                )));
            }
            Err(e) => return Err(DataQcError::configuration(e.to_string())),
        }

        match QualityRequest::deserialize(request) {
            Ok(parsed) => Ok(self.handle(parsed)),
            Err(e) => Ok(self.finish(QualityResponse::failure(
                action,
                format!("Invalid request: {}", e),
            ))),
        }
    }

    /// Handles a typed request.
    pub fn handle(&self, request: QualityRequest) -> QualityResponse {
        let QualityRequest {
            action,
            data,
            rules,
            threshold,
        } = request;

        let response = match self.run(action, data, rules.as_deref(), threshold) {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Request {} rejected: {}", action, e);
                QualityResponse::failure(action, e.to_string())
            }
        };
        self.finish(response)
    }

    /// Validates the envelope fields and dispatches on the action.
    ///
    /// Missing (`null`) and empty `data` both run as an empty batch and
    /// succeed with zero records; only `data` of another type is rejected.
    fn run(
        &self,
        action: QualityAction,
        data: Value,
        rules: Option<&[Value]>,
        threshold: Option<f64>,
    ) -> Result<QualityResponse> {
        if let Some(threshold) = threshold
            && !(0.0..=1.0).contains(&threshold)
        {
            return Err(DataQcError::invalid_input(format!(
                "threshold must be between 0.0 and 1.0, got {}",
                threshold
            )));
        }

        let records: Vec<Record> = if data.is_null() {
            Vec::new()
        } else {
            records_from_value(data)?
        };

        tracing::info!("Running {} over {} records", action, records.len());

        let analyzer = &self.analyzer;
        let mut response = QualityResponse::success(action);
        match action {
            QualityAction::ValidateQuality => {
                let rule_set = analyzer.rule_set(rules);
                response.quality_metrics =
                    Some(analyzer.validate_quality(&records, &rule_set, threshold));
            }
            QualityAction::DetectAnomalies => {
                response.anomalies = Some(analyzer.detect_anomalies(&records));
            }
            QualityAction::CheckCompleteness => {
                response.completeness = Some(analyzer.check_completeness(&records));
            }
            QualityAction::ValidateAccuracy => {
                response.accuracy = Some(analyzer.check_accuracy(&records));
            }
            QualityAction::GenerateQcReport => {
                let rule_set = analyzer.rule_set(rules);
                response.report = Some(analyzer.generate_report(&records, &rule_set, threshold));
            }
            QualityAction::GetQualityMetrics => {
                let rule_set = analyzer.rule_set(rules);
                response.metrics = Some(analyzer.scorecard(&records, &rule_set, threshold));
            }
        }
        Ok(response)
    }

    fn finish(&self, response: QualityResponse) -> QualityResponse {
        if let Some(sink) = &self.sink
            && let Err(e) = sink.persist(&response)
        {
            tracing::warn!("Failed to persist {} response: {}", response.action, e);
        }
        response
    }
}
