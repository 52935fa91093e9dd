//! Format accuracy analysis.
//!
//! Four independent sub-checks inspect well-known field names: email format,
//! phone format, date validity and numeric validity. Only present, non-null
//! values are checked.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::config::AccuracyConfig;
use crate::models::Record;
use crate::patterns::CompiledPatterns;
use crate::value::{as_number, display, present};

use super::models::{AccuracyCheck, AccuracyReport};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];
const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Analyzes format accuracy of a batch.
pub fn analyze_accuracy(
    records: &[Record],
    config: &AccuracyConfig,
    patterns: &CompiledPatterns,
) -> AccuracyReport {
    let email = run_check(records, &config.email_fields, |value| {
        // An unusable configured pattern fails every value it inspects
        patterns.is_email(&display(value)).unwrap_or(false)
    });
    let phone = run_check(records, &config.phone_fields, |value| {
        patterns.is_phone(&display(value)).unwrap_or(false)
    });
    let dates = run_check(records, &config.date_fields, is_valid_date);
    let numeric = run_check(records, &config.numeric_fields, |value| {
        as_number(value).is_some()
    });

    let checks = [&email, &phone, &dates, &numeric];
    let total_checked: usize = checks.iter().map(|c| c.total_checked).sum();
    let passed: usize = checks.iter().map(|c| c.passed).sum();

    let accuracy_score = if records.is_empty() {
        0.0
    } else if total_checked == 0 {
        100.0
    } else {
        passed as f64 / total_checked as f64 * 100.0
    };
    let valid_records = (accuracy_score / 100.0 * records.len() as f64).round() as usize;

    AccuracyReport {
        total_records: records.len(),
        email,
        phone,
        dates,
        numeric,
        accuracy_score,
        valid_records,
    }
}

fn run_check(
    records: &[Record],
    fields: &[String],
    passes: impl Fn(&Value) -> bool,
) -> AccuracyCheck {
    let mut check = AccuracyCheck::default();
    for (index, record) in records.iter().enumerate() {
        for field in fields {
            if let Some(value) = present(record.get(field)) {
                check.record(index, field, value, passes(value));
            }
        }
    }
    check.finish()
}

/// Returns true for values a date field may hold: RFC 3339 timestamps,
/// `YYYY-MM-DD`, `YYYY-MM-DD[T ]HH:MM:SS[.fff]`, `MM/DD/YYYY`, or a finite
/// number of epoch milliseconds.
pub fn is_valid_date(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_f64().is_some_and(f64::is_finite),
        Value::String(s) => parses_as_date(s.trim()),
        _ => false,
    }
}

fn parses_as_date(text: &str) -> bool {
    DateTime::parse_from_rfc3339(text).is_ok()
        || DATE_FORMATS
            .iter()
            .any(|format| NaiveDate::parse_from_str(text, format).is_ok())
        || DATE_TIME_FORMATS
            .iter()
            .any(|format| NaiveDateTime::parse_from_str(text, format).is_ok())
}
