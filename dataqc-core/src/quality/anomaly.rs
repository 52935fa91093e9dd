//! Anomaly detection for data quality assessment.
//!
//! This module flags low-uniqueness fields, fields holding more than one
//! value type, and numeric outliers found by z-score analysis over the
//! field distributions.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::config::AnomalyConfig;
use crate::models::Record;
use crate::value::{as_number, display};

use super::distribution::analyze_distributions;
use super::models::{Anomaly, AnomalyKind, AnomalyReport, AnomalySeverity, FieldDistribution};

/// Fields whose values are this close together have no outliers.
const MIN_STD_DEV: f64 = 1e-10;

/// Analyzes anomalies in a batch.
///
/// Builds the field distributions, detects anomalies from them and derives
/// recommendations. With detection disabled only the distributions are
/// reported.
pub fn analyze_anomalies(records: &[Record], config: &AnomalyConfig) -> AnomalyReport {
    let distributions = analyze_distributions(records);

    if !config.enabled {
        return AnomalyReport::new(Vec::new(), distributions, Vec::new(), records.len());
    }

    let anomalies = detect_anomalies(records, &distributions, config);
    let recommendations = anomaly_recommendations(&anomalies, records.len(), config);

    tracing::debug!(
        "Detected {} anomalies across {} fields",
        anomalies.len(),
        distributions.len()
    );

    AnomalyReport::new(anomalies, distributions, recommendations, records.len())
}

/// Detects anomalies from precomputed distributions.
///
/// Output is ordered by field name; within a field, low uniqueness comes
/// first, then mixed types, then outliers by record index.
pub fn detect_anomalies(
    records: &[Record],
    distributions: &BTreeMap<String, FieldDistribution>,
    config: &AnomalyConfig,
) -> Vec<Anomaly> {
    let z_threshold = config.sensitivity.z_score_threshold();
    let uniqueness_floor = (config.low_uniqueness_ratio * records.len() as f64).max(1.0);
    let mut anomalies = Vec::new();

    for (field, distribution) in distributions {
        if (distribution.unique_count as f64) < uniqueness_floor {
            anomalies.push(Anomaly {
                field: field.clone(),
                kind: AnomalyKind::LowUniqueness,
                record_index: None,
                value: None,
                z_score: None,
                description: format!(
                    "Field '{}' has only {} distinct values across {} records",
                    field,
                    distribution.unique_count,
                    records.len()
                ),
                severity: AnomalySeverity::Medium,
                recommendation: format!(
                    "Check whether '{}' is populated with defaults or placeholders",
                    field
                ),
            });
        }

        if distribution.type_histogram.len() > 1 {
            let types: Vec<&str> = distribution
                .type_histogram
                .keys()
                .map(String::as_str)
                .collect();
            let severity = if types.len() > 2 {
                AnomalySeverity::High
            } else {
                AnomalySeverity::Medium
            };
            anomalies.push(Anomaly {
                field: field.clone(),
                kind: AnomalyKind::MixedTypes,
                record_index: None,
                value: None,
                z_score: None,
                description: format!(
                    "Field '{}' holds mixed value types: {}",
                    field,
                    types.join(", ")
                ),
                severity,
                recommendation: format!("Standardize '{}' to a single data type", field),
            });
        }

        let Some(stats) = &distribution.numeric_stats else {
            continue;
        };
        if stats.std_dev < MIN_STD_DEV {
            continue;
        }

        for (index, value) in field_values(records, field) {
            let Some(number) = as_number(value) else {
                continue;
            };
            let z_score = (number - stats.mean).abs() / stats.std_dev;
            if z_score > z_threshold {
                anomalies.push(Anomaly {
                    field: field.clone(),
                    kind: AnomalyKind::Outlier,
                    record_index: Some(index),
                    value: Some(value.clone()),
                    z_score: Some(z_score),
                    description: format!(
                        "Value {} in '{}' is {:.2} standard deviations from the mean ({:.2})",
                        display(value),
                        field,
                        z_score,
                        stats.mean
                    ),
                    severity: AnomalySeverity::High,
                    recommendation: format!(
                        "Verify record {} for a data entry error in '{}'",
                        index, field
                    ),
                });
            }
        }
    }

    anomalies
}

fn field_values<'a>(
    records: &'a [Record],
    field: &'a str,
) -> impl Iterator<Item = (usize, &'a Value)> + 'a {
    records
        .iter()
        .enumerate()
        .filter_map(move |(index, record)| record.get(field).map(|value| (index, value)))
}

/// Derives recommendations from the anomaly kinds present.
pub fn anomaly_recommendations(
    anomalies: &[Anomaly],
    record_count: usize,
    config: &AnomalyConfig,
) -> Vec<String> {
    let kinds: BTreeSet<AnomalyKind> = anomalies.iter().map(|a| a.kind).collect();
    let mut recommendations = Vec::new();

    if kinds.contains(&AnomalyKind::LowUniqueness) {
        recommendations.push(
            "Review low-uniqueness fields for default or placeholder values".to_string(),
        );
    }
    if kinds.contains(&AnomalyKind::MixedTypes) {
        recommendations.push("Standardize data types for fields with mixed types".to_string());
    }
    if kinds.contains(&AnomalyKind::Outlier) {
        recommendations.push("Investigate numeric outliers for data entry errors".to_string());
    }
    if record_count > 0 && anomalies.len() as f64 > config.review_ratio * record_count as f64 {
        recommendations.push(format!(
            "Review the data entry process: anomalies exceed {:.0}% of records",
            config.review_ratio * 100.0
        ));
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnomalySensitivity;
    use serde_json::json;

    fn create_sample(rows: Vec<Value>) -> Vec<Record> {
        rows.into_iter().map(Record::new).collect()
    }

    fn values(field: &str, values: &[Value]) -> Vec<Record> {
        values
            .iter()
            .map(|v| {
                let mut map = serde_json::Map::new();
                map.insert(field.to_string(), v.clone());
                Record::new(Value::Object(map))
            })
            .collect()
    }

    fn outliers(report: &AnomalyReport) -> Vec<&Anomaly> {
        report
            .anomalies
            .iter()
            .filter(|a| a.kind == AnomalyKind::Outlier)
            .collect()
    }

    #[test]
    fn test_anomaly_no_outliers() {
        let records = values("value", &[json!(50), json!(52), json!(48), json!(51), json!(49)]);
        let report = analyze_anomalies(&records, &AnomalyConfig::default());
        assert!(outliers(&report).is_empty());
    }

    #[test]
    fn test_small_batch_outlier_stays_below_threshold() {
        // z(100) is about 2.0 with population std dev
        let records = values(
            "value",
            &[json!(1), json!(2), json!(3), json!(4), json!(100)],
        );
        let report = analyze_anomalies(&records, &AnomalyConfig::default());
        assert!(outliers(&report).is_empty());

        // A lone outlier among five values cannot exceed z = 2
        let records = values(
            "value",
            &[json!(10), json!(10), json!(10), json!(10), json!(1000)],
        );
        let report = analyze_anomalies(&records, &AnomalyConfig::default());
        assert!(outliers(&report).is_empty());
    }

    #[test]
    fn test_anomaly_with_outlier() {
        let mut rows = vec![json!(10); 19];
        rows.push(json!(1000));
        let records = values("value", &rows);

        let report = analyze_anomalies(&records, &AnomalyConfig::default());
        let found = outliers(&report);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].record_index, Some(19));
        assert_eq!(found[0].value, Some(json!(1000)));
        assert_eq!(found[0].severity, AnomalySeverity::High);
        assert!((found[0].z_score.unwrap() - 4.3589).abs() < 0.001);
    }

    #[test]
    fn test_numeric_string_outliers_keep_raw_value() {
        let mut rows = vec![json!("10"); 19];
        rows.push(json!("1000"));
        let report = analyze_anomalies(&values("value", &rows), &AnomalyConfig::default());
        assert_eq!(outliers(&report)[0].value, Some(json!("1000")));
    }

    #[test]
    fn test_anomaly_sensitivity_levels() {
        // z(25) = 2.0 exactly; only strictly greater values are flagged
        let rows = [json!(10), json!(10), json!(10), json!(10), json!(25)];
        let records = values("value", &rows);
        for sensitivity in [
            AnomalySensitivity::Low,
            AnomalySensitivity::Medium,
            AnomalySensitivity::High,
        ] {
            let config = AnomalyConfig::new().with_sensitivity(sensitivity);
            assert!(outliers(&analyze_anomalies(&records, &config)).is_empty());
        }

        // Ten values: z(lone outlier) = 3.0, flagged at medium and high only
        let mut rows = vec![json!(10); 9];
        rows.push(json!(100));
        let records = values("value", &rows);
        let low = analyze_anomalies(&records, &AnomalyConfig::default());
        let medium = analyze_anomalies(
            &records,
            &AnomalyConfig::new().with_sensitivity(AnomalySensitivity::Medium),
        );
        assert!(outliers(&low).is_empty());
        assert_eq!(outliers(&medium).len(), 1);
    }

    #[test]
    fn test_constant_field_has_no_outliers() {
        let records = values("value", &vec![json!(7); 30]);
        assert!(outliers(&analyze_anomalies(&records, &AnomalyConfig::default())).is_empty());
    }

    #[test]
    fn test_mixed_types() {
        let records = create_sample(vec![json!({"age": 25}), json!({"age": "thirty"})]);
        let report = analyze_anomalies(&records, &AnomalyConfig::default());

        let mixed: Vec<_> = report
            .anomalies
            .iter()
            .filter(|a| a.kind == AnomalyKind::MixedTypes)
            .collect();
        assert_eq!(mixed.len(), 1);
        assert_eq!(mixed[0].field, "age");
        assert_eq!(mixed[0].severity, AnomalySeverity::Medium);
        assert!(
            report
                .recommendations
                .iter()
                .any(|r| r.contains("Standardize"))
        );
    }

    #[test]
    fn test_three_types_is_high_severity() {
        let records = create_sample(vec![
            json!({"x": 1}),
            json!({"x": "one"}),
            json!({"x": true}),
            json!({"x": null}),
        ]);
        let report = analyze_anomalies(&records, &AnomalyConfig::default());
        let mixed = report
            .anomalies
            .iter()
            .find(|a| a.kind == AnomalyKind::MixedTypes)
            .unwrap();
        assert_eq!(mixed.severity, AnomalySeverity::High);
    }

    #[test]
    fn test_low_uniqueness() {
        // 200 records: the floor is max(1, 0.01 * 200) = 2 distinct values
        let rows: Vec<Value> = (0..200)
            .map(|i| json!({"country": "US", "id": i}))
            .collect();
        let report = analyze_anomalies(&create_sample(rows), &AnomalyConfig::default());

        let low: Vec<_> = report
            .anomalies
            .iter()
            .filter(|a| a.kind == AnomalyKind::LowUniqueness)
            .collect();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].field, "country");
        assert_eq!(low[0].severity, AnomalySeverity::Medium);
    }

    #[test]
    fn test_all_null_field_is_low_uniqueness() {
        let records = create_sample(vec![json!({"note": null}), json!({"note": null})]);
        let report = analyze_anomalies(&records, &AnomalyConfig::default());
        assert_eq!(report.anomalies.len(), 1);
        assert_eq!(report.anomalies[0].kind, AnomalyKind::LowUniqueness);
    }

    #[test]
    fn test_anomaly_order_is_stable() {
        let mut rows: Vec<Value> = (0..19).map(|_| json!({"b": 10, "a": 1})).collect();
        rows.push(json!({"b": 1000, "a": "one"}));
        let report = analyze_anomalies(&create_sample(rows), &AnomalyConfig::default());

        let order: Vec<_> = report
            .anomalies
            .iter()
            .map(|a| (a.field.as_str(), a.kind))
            .collect();
        assert_eq!(
            order,
            vec![("a", AnomalyKind::MixedTypes), ("b", AnomalyKind::Outlier)]
        );
    }

    #[test]
    fn test_review_recommendation() {
        let records = create_sample(vec![json!({"age": 25}), json!({"age": "thirty"})]);
        let report = analyze_anomalies(&records, &AnomalyConfig::default());
        assert!(
            report
                .recommendations
                .iter()
                .any(|r| r.contains("data entry process"))
        );
    }

    #[test]
    fn test_disabled_detection_still_reports_distributions() {
        let records = create_sample(vec![json!({"age": 25}), json!({"age": "thirty"})]);
        let report = analyze_anomalies(&records, &AnomalyConfig::new().with_enabled(false));
        assert_eq!(report.total_anomalies, 0);
        assert!(report.field_distributions.contains_key("age"));
    }

    #[test]
    fn test_empty_batch() {
        let report = analyze_anomalies(&[], &AnomalyConfig::default());
        assert_eq!(report.total_anomalies, 0);
        assert_eq!(report.anomaly_rate, 0.0);
        assert!(report.recommendations.is_empty());
    }
}
