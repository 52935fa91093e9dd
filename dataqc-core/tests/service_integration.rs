//! End-to-end tests for the quality service
//!
//! These drive `QualityService` through raw JSON envelopes the same way the
//! CLI does, and check the response documents callers actually see.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::uninlined_format_args)]

use std::sync::Arc;

use dataqc_core::{
    AnomalyConfig, DataQcError, ErrorEnvelope, JsonLinesSink, MemorySink, QUALITY_CONTROL_FAILED,
    QualityAction, QualityAnalyzer, QualityConfig, QualityRequest, QualityResponse,
    QualityService, ResultSink,
};
use serde_json::{Value, json};
use tempfile::TempDir;

fn people() -> Value {
    json!([
        {
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "a@b.com",
            "phone": "+15551234567"
        },
        {
            "firstName": "Alan",
            "lastName": "Turing",
            "email": "bad-email",
            "phone": "not-a-phone"
        }
    ])
}

#[test]
fn test_service_validate_quality_with_default_rules() {
    let service = QualityService::with_defaults();
    let response = service
        .handle_value(&json!({"action": "validate_quality", "data": people()}))
        .unwrap();

    assert!(response.success);
    let metrics = response.quality_metrics.expect("validation payload");
    assert_eq!(metrics.total_records, 2);
    assert_eq!(metrics.valid_records, 1);
    assert_eq!(metrics.invalid_records, 1);

    let first = &metrics.results[0];
    assert!(first.is_valid);
    assert!(first.errors.is_empty());

    let second = &metrics.results[1];
    assert!(!second.is_valid);
    assert_eq!(second.errors.len(), 2);
    assert!(second.confidence < 0.8);
    assert!((second.confidence - 0.6).abs() < 0.001);

    let fields: Vec<&str> = second.errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["email", "phone"]);
}

#[test]
fn test_service_empty_rules_and_no_data() {
    let service = QualityService::with_defaults();
    let response = service
        .handle_value(&json!({"action": "validate_quality", "rules": []}))
        .unwrap();

    assert!(response.success);
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["qualityMetrics"]["totalRecords"], 0);
    assert_eq!(json["qualityMetrics"]["qualityScore"], 0.0);
}

#[test]
fn test_service_detects_mixed_types() {
    let service = QualityService::with_defaults();
    let response = service.handle(QualityRequest::new(
        QualityAction::DetectAnomalies,
        json!([{"age": 25}, {"age": "thirty"}, {"age": 40}]),
    ));

    let report = response.anomalies.expect("anomaly payload");
    let mixed: Vec<_> = report
        .anomalies
        .iter()
        .filter(|a| a.kind.as_str() == "mixed_types")
        .collect();
    assert_eq!(mixed.len(), 1);
    assert_eq!(mixed[0].field, "age");

    let distribution = &report.field_distributions["age"];
    assert_eq!(distribution.type_histogram["number"], 2);
    assert_eq!(distribution.type_histogram["string"], 1);
}

#[test]
fn test_service_disabled_anomaly_detection_keeps_distributions() {
    let config = QualityConfig::default()
        .with_anomaly_detection(AnomalyConfig::new().with_enabled(false));
    let service = QualityService::new(QualityAnalyzer::new(config));

    let response = service.handle(QualityRequest::new(
        QualityAction::DetectAnomalies,
        json!([{"age": 25}, {"age": "thirty"}]),
    ));
    let report = response.anomalies.unwrap();
    assert_eq!(report.total_anomalies, 0);
    assert!(report.field_distributions.contains_key("age"));
}

#[test]
fn test_service_full_report() {
    let service = QualityService::with_defaults();
    let response = service
        .handle_value(&json!({
            "action": "generate_qc_report",
            "data": people(),
            "threshold": 0.5
        }))
        .unwrap();

    let report = response.report.expect("report payload");
    assert_eq!(report.total_records, 2);
    // Record 1 sits at 0.6 confidence but still has errors
    assert_eq!(report.quality_metrics.valid_records, 1);
    assert!((report.scores.completeness - 100.0).abs() < 0.001);
    assert!(report.quality_score > 0.0 && report.quality_score <= 100.0);
    assert_eq!(report.sections.len(), 4);
    assert!(!report.recommendations.is_empty());
}

#[test]
fn test_service_scorecard_matches_report() {
    let service = QualityService::with_defaults();
    let report = service
        .handle(QualityRequest::new(QualityAction::GenerateQcReport, people()))
        .report
        .unwrap();
    let scorecard = service
        .handle(QualityRequest::new(QualityAction::GetQualityMetrics, people()))
        .metrics
        .unwrap();

    assert_eq!(scorecard.total_records, report.total_records);
    assert!((scorecard.quality_score - report.quality_score).abs() < 0.001);
    assert_eq!(scorecard.scores, report.scores);
}

#[test]
fn test_service_report_is_deterministic() {
    let service = QualityService::with_defaults();
    let run = || {
        let response = service.handle(QualityRequest::new(
            QualityAction::GenerateQcReport,
            people(),
        ));
        serde_json::to_value(response.report.unwrap()).unwrap()
    };
    assert_eq!(run(), run());

    let sequential = QualityService::new(QualityAnalyzer::new(
        QualityConfig::default().with_parallel(false),
    ));
    let response = sequential.handle(QualityRequest::new(
        QualityAction::GenerateQcReport,
        people(),
    ));
    assert_eq!(serde_json::to_value(response.report.unwrap()).unwrap(), run());
}

#[test]
fn test_service_custom_rules_from_request() {
    let service = QualityService::with_defaults();
    let response = service
        .handle_value(&json!({
            "action": "validate_quality",
            "data": [{"age": 17}, {"age": 30}],
            "rules": [
                {"field": "age", "type": "range", "parameters": {"min": 18, "max": 120}}
            ]
        }))
        .unwrap();

    let metrics = response.quality_metrics.unwrap();
    assert!(!metrics.results[0].is_valid);
    assert!(metrics.results[1].is_valid);
}

#[test]
fn test_service_broken_rule_does_not_abort_batch() {
    let service = QualityService::with_defaults();
    let response = service
        .handle_value(&json!({
            "action": "validate_quality",
            "data": [{"name": "x"}],
            "rules": [{"field": "name", "type": "telepathy"}]
        }))
        .unwrap();

    assert!(response.success);
    let result = &response.quality_metrics.unwrap().results[0];
    assert!(!result.is_valid);
    assert_eq!(result.errors[0].rule, "invalid_rule");
}

#[test]
fn test_service_transport_error_envelope() {
    let service = QualityService::with_defaults();
    let error = service
        .handle_value(&json!({"data": people()}))
        .unwrap_err();

    let envelope = serde_json::to_value(ErrorEnvelope::from_error(&error)).unwrap();
    assert_eq!(envelope["success"], false);
    assert_eq!(envelope["code"], QUALITY_CONTROL_FAILED);
    assert!(envelope["timestamp"].is_string());
    assert!(envelope["error"].as_str().unwrap().contains("action"));
}

#[test]
fn test_service_response_serialization_is_stable() {
    let service = QualityService::with_defaults();
    let response = service.handle(QualityRequest::new(
        QualityAction::CheckCompleteness,
        json!([{"a": 1, "b": 2}, {"a": 3}]),
    ));

    let first = serde_json::to_string(&response).unwrap();
    let parsed: QualityResponse = serde_json::from_str(&first).unwrap();
    let second = serde_json::to_string(&parsed).unwrap();
    assert_eq!(first, second);

    let json: Value = serde_json::from_str(&first).unwrap();
    assert_eq!(json["completeness"]["overallCompleteness"], 75.0);
}

#[test]
fn test_service_persists_to_json_lines() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("audit.jsonl");
    let service =
        QualityService::with_defaults().with_sink(Arc::new(JsonLinesSink::new(&path)));

    service.handle(QualityRequest::new(QualityAction::ValidateAccuracy, people()));
    service.handle(QualityRequest::new(QualityAction::ValidateQuality, json!(42)));

    let contents = std::fs::read_to_string(&path).unwrap();
    let entries: Vec<Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["success"], true);
    assert!(entries[0]["accuracy"].is_object());
    assert_eq!(entries[1]["success"], false);
}

#[test]
fn test_service_sink_failure_keeps_result() {
    struct Unavailable;

    impl ResultSink for Unavailable {
        fn persist(&self, _response: &QualityResponse) -> dataqc_core::Result<()> {
            Err(DataQcError::persistence_failed(
                "audit store",
                std::io::Error::other("connection refused"),
            ))
        }
    }

    let memory = Arc::new(MemorySink::new());
    let failing = QualityService::with_defaults().with_sink(Arc::new(Unavailable));
    let recording = QualityService::with_defaults().with_sink(memory.clone());

    let a = failing.handle(QualityRequest::new(QualityAction::ValidateQuality, people()));
    let b = recording.handle(QualityRequest::new(QualityAction::ValidateQuality, people()));

    assert!(a.success);
    assert_eq!(a.quality_metrics, b.quality_metrics);
    assert_eq!(memory.len(), 1);
}
