//! Rule evaluation: one rule against one field value.

use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::custom::CustomValidators;
use super::model::{
    Bounds, Condition, ConditionOperator, FORMAT_PENALTY, LENGTH_PENALTY, NOT_NUMERIC_PENALTY,
    OUT_OF_RANGE_PENALTY, REQUIRED_PENALTY, Rule, RuleKind, RuleSeverity,
};
use crate::models::Record;
use crate::patterns::{CompiledPattern, CompiledPatterns};
use crate::value::{as_number, display, is_blank, loosely_equal, present};

/// Conditional rules nested deeper than this are treated as broken.
const MAX_CONDITIONAL_DEPTH: usize = 8;

/// Result of evaluating one rule against one value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleOutcome {
    /// False when the rule failed with error severity
    pub is_valid: bool,
    /// Failure or warning message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Penalty to subtract from the record score (0 unless failed)
    pub penalty: f64,
    /// True when the rule failed with warning severity
    pub has_warning: bool,
}

impl RuleOutcome {
    /// Passing outcome.
    pub fn pass() -> Self {
        Self {
            is_valid: true,
            message: None,
            penalty: 0.0,
            has_warning: false,
        }
    }

    /// Failing outcome with a penalty.
    pub fn fail(message: impl Into<String>, penalty: f64) -> Self {
        Self {
            is_valid: false,
            message: Some(message.into()),
            penalty,
            has_warning: false,
        }
    }

    /// Warning outcome; the validator applies the warning penalty.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            message: Some(message.into()),
            penalty: 0.0,
            has_warning: true,
        }
    }
}

/// Reasons a rule cannot be evaluated at all.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleError {
    /// A format or configured pattern failed to compile
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
    /// A custom rule names a predicate that is not registered
    #[error("no custom validator registered as '{0}'")]
    UnknownValidator(String),
    /// Conditional rules are nested too deeply
    #[error("conditional rules nested deeper than {0} levels")]
    NestingTooDeep(usize),
}

/// Evaluates rules against record values.
///
/// Construct once per run: every `format` pattern of the rule set and every
/// configured pattern is compiled up front, so evaluation itself is
/// allocation-light and safe to share across threads.
#[derive(Debug, Clone)]
pub struct RuleEvaluator {
    patterns: CompiledPatterns,
    formats: HashMap<String, CompiledPattern>,
    custom: CustomValidators,
    evaluation_error_penalty: f64,
}

impl RuleEvaluator {
    /// Creates an evaluator for `rules`.
    pub fn new<'a>(
        rules: impl IntoIterator<Item = &'a Rule>,
        patterns: CompiledPatterns,
        custom: CustomValidators,
        evaluation_error_penalty: f64,
    ) -> Self {
        let mut sources = Vec::new();
        for rule in rules {
            rule.collect_patterns(&mut sources);
        }
        let formats = sources
            .into_iter()
            .map(|source| (source.to_string(), CompiledPattern::new(source)))
            .collect();

        Self {
            patterns,
            formats,
            custom,
            evaluation_error_penalty,
        }
    }

    /// Penalty charged when a rule cannot be evaluated.
    pub fn evaluation_error_penalty(&self) -> f64 {
        self.evaluation_error_penalty
    }

    /// Evaluates `rule` against `value`, the rule field's value in `record`.
    ///
    /// Never fails: a rule that cannot be evaluated yields a failing outcome
    /// carrying the evaluation-error penalty.
    pub fn evaluate(&self, value: Option<&Value>, rule: &Rule, record: &Record) -> RuleOutcome {
        self.evaluate_at_depth(value, rule, record, 0)
    }

    fn evaluate_at_depth(
        &self,
        value: Option<&Value>,
        rule: &Rule,
        record: &Record,
        depth: usize,
    ) -> RuleOutcome {
        match self.check(value, rule, record, depth) {
            Ok(outcome) if !outcome.is_valid && rule.severity == RuleSeverity::Warning => {
                RuleOutcome::warning(outcome.message.unwrap_or_default())
            }
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::debug!("Rule '{}' could not be evaluated: {}", rule.display_name(), e);
                RuleOutcome::fail(
                    format!("Rule '{}' could not be evaluated: {}", rule.display_name(), e),
                    self.evaluation_error_penalty,
                )
            }
        }
    }

    fn check(
        &self,
        value: Option<&Value>,
        rule: &Rule,
        record: &Record,
        depth: usize,
    ) -> std::result::Result<RuleOutcome, RuleError> {
        let field = rule.field.as_str();

        if !rule.kind.handles_absent_values() && present(value).is_none() {
            return Ok(RuleOutcome::pass());
        }
        let value = present(value);

        match &rule.kind {
            RuleKind::Required => Ok(if is_blank(value) {
                RuleOutcome::fail(
                    format!("{} is required", field),
                    rule.penalty_or(REQUIRED_PENALTY),
                )
            } else {
                RuleOutcome::pass()
            }),
            RuleKind::Format { parameters } => {
                let pattern = self.format_pattern(&parameters.pattern);
                let text = value.map(display).unwrap_or_default();
                match_outcome(
                    matches(&pattern, &text)?,
                    || format!("{} does not match the required format", field),
                    rule.penalty_or(FORMAT_PENALTY),
                )
            }
            RuleKind::Length { parameters } => Ok(check_length(field, value, parameters, rule)),
            RuleKind::Range { parameters } => Ok(check_range(field, value, parameters, rule)),
            RuleKind::Email => {
                let text = value.map(display).unwrap_or_default();
                match_outcome(
                    matches(&self.patterns.email, &text)?,
                    || format!("{} has invalid email format", field),
                    rule.penalty_or(FORMAT_PENALTY),
                )
            }
            RuleKind::Phone => {
                let text = value.map(display).unwrap_or_default();
                let cleaned = crate::patterns::clean_phone(&text);
                match_outcome(
                    matches(&self.patterns.phone, &cleaned)?,
                    || format!("{} has invalid phone format", field),
                    rule.penalty_or(FORMAT_PENALTY),
                )
            }
            RuleKind::Custom { parameters } => {
                let predicate = self
                    .custom
                    .get(&parameters.validator)
                    .ok_or_else(|| RuleError::UnknownValidator(parameters.validator.clone()))?;
                let value = value.unwrap_or(&Value::Null);
                Ok(match predicate(value, record) {
                    Ok(()) => RuleOutcome::pass(),
                    Err(message) => {
                        RuleOutcome::fail(message, rule.penalty_or(FORMAT_PENALTY))
                    }
                })
            }
            RuleKind::Conditional {
                condition,
                then_validator,
            } => {
                if depth >= MAX_CONDITIONAL_DEPTH {
                    return Err(RuleError::NestingTooDeep(MAX_CONDITIONAL_DEPTH));
                }
                if !condition_holds(condition, record) {
                    return Ok(RuleOutcome::pass());
                }
                let nested_value = record.resolve(&then_validator.field);
                let mut outcome =
                    self.evaluate_at_depth(nested_value, then_validator, record, depth + 1);
                if let Some(penalty) = rule.penalty
                    && !outcome.is_valid
                {
                    outcome.penalty = penalty;
                }
                Ok(outcome)
            }
        }
    }

    fn format_pattern(&self, source: &str) -> Cow<'_, CompiledPattern> {
        // Patterns from the rule set are pre-compiled; anything else is
        // compiled on demand.
        match self.formats.get(source) {
            Some(pattern) => Cow::Borrowed(pattern),
            None => Cow::Owned(CompiledPattern::new(source)),
        }
    }
}

fn matches(pattern: &CompiledPattern, text: &str) -> std::result::Result<bool, RuleError> {
    pattern
        .is_match(text)
        .map_err(|reason| RuleError::InvalidPattern {
            pattern: pattern.source().to_string(),
            reason,
        })
}

fn match_outcome(
    matched: bool,
    message: impl FnOnce() -> String,
    penalty: f64,
) -> std::result::Result<RuleOutcome, RuleError> {
    Ok(if matched {
        RuleOutcome::pass()
    } else {
        RuleOutcome::fail(message(), penalty)
    })
}

fn check_length(
    field: &str,
    value: Option<&Value>,
    bounds: &Bounds<usize>,
    rule: &Rule,
) -> RuleOutcome {
    let (length, unit) = match value {
        Some(Value::String(s)) => (s.chars().count(), "characters"),
        Some(Value::Array(items)) => (items.len(), "items"),
        _ => return RuleOutcome::pass(),
    };

    if let Some(min) = bounds.min
        && length < min
    {
        return RuleOutcome::fail(
            format!("{} must be at least {} {}", field, min, unit),
            rule.penalty_or(LENGTH_PENALTY),
        );
    }
    if let Some(max) = bounds.max
        && length > max
    {
        return RuleOutcome::fail(
            format!("{} must be no more than {} {}", field, max, unit),
            rule.penalty_or(LENGTH_PENALTY),
        );
    }
    RuleOutcome::pass()
}

fn check_range(
    field: &str,
    value: Option<&Value>,
    bounds: &Bounds<f64>,
    rule: &Rule,
) -> RuleOutcome {
    let Some(number) = value.and_then(as_number) else {
        return RuleOutcome::fail(
            format!("{} must be a number", field),
            rule.penalty_or(NOT_NUMERIC_PENALTY),
        );
    };

    if let Some(min) = bounds.min
        && number < min
    {
        return RuleOutcome::fail(
            format!("{} must be at least {}", field, min),
            rule.penalty_or(OUT_OF_RANGE_PENALTY),
        );
    }
    if let Some(max) = bounds.max
        && number > max
    {
        return RuleOutcome::fail(
            format!("{} must be at most {}", field, max),
            rule.penalty_or(OUT_OF_RANGE_PENALTY),
        );
    }
    RuleOutcome::pass()
}

/// Evaluates a conditional guard against a record.
pub fn condition_holds(condition: &Condition, record: &Record) -> bool {
    let actual = present(record.resolve(&condition.field));
    let expected = &condition.value;

    match condition.operator {
        ConditionOperator::Equals => actual.is_some_and(|v| loosely_equal(v, expected)),
        ConditionOperator::NotEquals => !actual.is_some_and(|v| loosely_equal(v, expected)),
        ConditionOperator::Contains => match actual {
            Some(Value::String(s)) => s.contains(display(expected).as_str()),
            Some(Value::Array(items)) => items.iter().any(|item| loosely_equal(item, expected)),
            _ => false,
        },
        ConditionOperator::GreaterThan => compare(actual, expected, |a, b| a > b),
        ConditionOperator::LessThan => compare(actual, expected, |a, b| a < b),
    }
}

fn compare(actual: Option<&Value>, expected: &Value, op: impl Fn(f64, f64) -> bool) -> bool {
    match (actual.and_then(as_number), as_number(expected)) {
        (Some(a), Some(b)) => op(a, b),
        _ => false,
    }
}
