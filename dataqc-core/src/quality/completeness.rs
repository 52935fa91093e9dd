//! Completeness analysis for data quality assessment.
//!
//! This module measures how many expected field instances across a batch
//! hold a usable (non-null, non-blank) value.

use std::collections::HashSet;

use crate::config::{CompletenessConfig, SchemaSource};
use crate::models::Record;
use crate::value::is_blank;

use super::models::{CompletenessReport, CompletenessStatus, FieldCompleteness, IncompleteRecord};

/// Analyzes completeness of a batch.
///
/// # Note
/// With [`SchemaSource::FirstRecord`] the expected fields are the keys of the
/// first record only, so fields that appear exclusively in later records are
/// not checked. [`SchemaSource::Union`] takes every key seen in the batch.
pub fn analyze_completeness(records: &[Record], config: &CompletenessConfig) -> CompletenessReport {
    let schema = expected_fields(records, config.schema_source);
    let total_records = records.len();

    if total_records == 0 || schema.is_empty() {
        return CompletenessReport {
            total_records,
            schema,
            ..CompletenessReport::default()
        };
    }

    let mut complete_counts = vec![0usize; schema.len()];
    let mut incomplete_records = Vec::new();

    for (index, record) in records.iter().enumerate() {
        let mut missing_fields = Vec::new();
        for (position, field) in schema.iter().enumerate() {
            if is_blank(record.get(field)) {
                missing_fields.push(field.clone());
            } else {
                complete_counts[position] += 1;
            }
        }
        if !missing_fields.is_empty() {
            incomplete_records.push(IncompleteRecord {
                record_index: index,
                record_id: record.id_or_position(index),
                missing_fields,
            });
        }
    }

    let fields: Vec<FieldCompleteness> = schema
        .iter()
        .zip(&complete_counts)
        .map(|(field, &complete)| {
            let percentage = complete as f64 / total_records as f64 * 100.0;
            FieldCompleteness {
                field: field.clone(),
                complete,
                missing: total_records - complete,
                percentage,
                status: classify(percentage, config),
            }
        })
        .collect();

    let complete_total: usize = complete_counts.iter().sum();
    let overall_completeness =
        complete_total as f64 / (schema.len() * total_records) as f64 * 100.0;

    CompletenessReport {
        total_records,
        schema,
        overall_completeness,
        fields,
        incomplete_records,
    }
}

fn expected_fields(records: &[Record], source: SchemaSource) -> Vec<String> {
    match source {
        SchemaSource::FirstRecord => records
            .first()
            .and_then(Record::fields)
            .map(|fields| fields.keys().cloned().collect())
            .unwrap_or_default(),
        SchemaSource::Union => {
            let mut seen = HashSet::new();
            records
                .iter()
                .filter_map(Record::fields)
                .flat_map(|fields| fields.keys())
                .filter(|key| seen.insert(key.as_str()))
                .cloned()
                .collect()
        }
    }
}

fn classify(percentage: f64, config: &CompletenessConfig) -> CompletenessStatus {
    if percentage >= config.good_min {
        CompletenessStatus::Good
    } else if percentage >= config.fair_min {
        CompletenessStatus::Fair
    } else {
        CompletenessStatus::Poor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn create_sample(rows: Vec<Value>) -> Vec<Record> {
        rows.into_iter().map(Record::new).collect()
    }

    #[test]
    fn test_completeness_all_present() {
        let records = create_sample(vec![
            json!({"id": 1, "name": "Alice", "email": "alice@example.com"}),
            json!({"id": 2, "name": "Bob", "email": "bob@example.com"}),
        ]);
        let report = analyze_completeness(&records, &CompletenessConfig::default());

        assert_eq!(report.overall_completeness, 100.0);
        assert!(report.incomplete_records.is_empty());
        assert!(
            report
                .fields
                .iter()
                .all(|f| f.status == CompletenessStatus::Good)
        );
    }

    #[test]
    fn test_completeness_with_missing_values() {
        let records = create_sample(vec![
            json!({"id": 1, "name": "Alice", "email": "alice@example.com"}),
            json!({"id": 2, "name": null, "email": "bob@example.com"}),
            json!({"id": 3, "name": "Carol", "email": "   "}),
            json!({"id": 4, "email": ""}),
        ]);
        let report = analyze_completeness(&records, &CompletenessConfig::default());

        // 12 expected instances, 8 complete
        assert!((report.overall_completeness - 66.666).abs() < 0.01);

        let name = report.fields.iter().find(|f| f.field == "name").unwrap();
        assert_eq!(name.complete, 2);
        assert_eq!(name.missing, 2);
        assert_eq!(name.status, CompletenessStatus::Poor);

        assert_eq!(report.incomplete_records.len(), 3);
        assert_eq!(report.incomplete_records[0].record_index, 1);
        assert_eq!(report.incomplete_records[0].record_id, "2");
        assert_eq!(report.incomplete_records[2].missing_fields, vec!["email", "name"]);
    }

    #[test]
    fn test_status_bands() {
        let config = CompletenessConfig::default();
        assert_eq!(classify(100.0, &config), CompletenessStatus::Good);
        assert_eq!(classify(95.0, &config), CompletenessStatus::Good);
        assert_eq!(classify(94.9, &config), CompletenessStatus::Fair);
        assert_eq!(classify(80.0, &config), CompletenessStatus::Fair);
        assert_eq!(classify(79.9, &config), CompletenessStatus::Poor);
    }

    #[test]
    fn test_schema_from_first_record_ignores_later_fields() {
        let records = create_sample(vec![json!({"a": 1}), json!({"a": 2, "b": 3})]);
        let report = analyze_completeness(&records, &CompletenessConfig::default());

        assert_eq!(report.schema, vec!["a"]);
        assert_eq!(report.overall_completeness, 100.0);
    }

    #[test]
    fn test_union_schema() {
        let records = create_sample(vec![json!({"a": 1}), json!({"a": 2, "b": 3})]);
        let config = CompletenessConfig::new().with_schema_source(SchemaSource::Union);
        let report = analyze_completeness(&records, &config);

        assert_eq!(report.schema, vec!["a", "b"]);
        assert!((report.overall_completeness - 75.0).abs() < 0.001);
        assert_eq!(report.incomplete_records[0].missing_fields, vec!["b"]);
    }

    #[test]
    fn test_malformed_records_count_as_missing_everything() {
        let records = create_sample(vec![json!({"a": 1}), json!(42)]);
        let report = analyze_completeness(&records, &CompletenessConfig::default());
        assert!((report.overall_completeness - 50.0).abs() < 0.001);
        assert_eq!(report.incomplete_records[0].record_id, "record_1");
    }

    #[test]
    fn test_empty_batch_or_schema() {
        let report = analyze_completeness(&[], &CompletenessConfig::default());
        assert_eq!(report.overall_completeness, 0.0);

        let records = create_sample(vec![json!({}), json!({"a": 1})]);
        let report = analyze_completeness(&records, &CompletenessConfig::default());
        assert_eq!(report.overall_completeness, 0.0);
        assert!(report.schema.is_empty());
        assert_eq!(report.total_records, 2);
    }
}
