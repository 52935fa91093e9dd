//! Rule definitions.
//!
//! Rules are configuration data. The wire shape is
//! `{"field": "...", "type": "<kind>", "parameters": {...}, "penalty": n,
//! "name": "...", "severity": "error" | "warning"}` with `condition` and
//! `thenValidator` on conditional rules.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Penalty for a missing required value.
pub const REQUIRED_PENALTY: f64 = 25.0;
/// Penalty for a pattern, email, phone or custom failure.
pub const FORMAT_PENALTY: f64 = 20.0;
/// Penalty for a length violation.
pub const LENGTH_PENALTY: f64 = 15.0;
/// Penalty for a value that cannot be read as a number in a range rule.
pub const NOT_NUMERIC_PENALTY: f64 = 20.0;
/// Penalty for a number outside its configured bounds.
pub const OUT_OF_RANGE_PENALTY: f64 = 15.0;

/// Whether a failing rule produces an error or a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverity {
    /// Failure is an error and subtracts the rule penalty
    #[default]
    Error,
    /// Failure is a warning and subtracts the fixed warning penalty
    Warning,
}

/// Parameters for `format` rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternParameters {
    /// Regular expression the value must match
    pub pattern: String,
}

/// Optional inclusive bounds for `length` and `range` rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Bounds<T> {
    /// Lower bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<T>,
    /// Upper bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<T>,
}

/// Parameters for `custom` rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomParameters {
    /// Name of a predicate registered in [`super::CustomValidators`]
    pub validator: String,
}

/// Comparison operators for conditional rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    /// Field equals the value
    Equals,
    /// Field does not equal the value (absent fields count as not equal)
    NotEquals,
    /// String field contains the value, or array field contains the element
    Contains,
    /// Numeric field is greater than the value
    GreaterThan,
    /// Numeric field is less than the value
    LessThan,
}

/// A `field operator value` triple evaluated against a whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Field to inspect (dotted paths allowed)
    pub field: String,
    /// Comparison to apply
    pub operator: ConditionOperator,
    /// Operand
    pub value: Value,
}

/// The closed set of rule kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleKind {
    /// Value must be present and not blank
    Required,
    /// Present value must match a regular expression
    Format {
        /// Pattern parameters
        parameters: PatternParameters,
    },
    /// Present string must satisfy length bounds
    Length {
        /// Character count bounds
        #[serde(default)]
        parameters: Bounds<usize>,
    },
    /// Present value must be numeric and within bounds
    Range {
        /// Numeric bounds
        #[serde(default)]
        parameters: Bounds<f64>,
    },
    /// Present value must look like an email address
    Email,
    /// Present value must look like a phone number
    Phone,
    /// Present value must satisfy a registered predicate
    Custom {
        /// Predicate selection
        parameters: CustomParameters,
    },
    /// Nested rule applied only when the condition holds
    Conditional {
        /// Guard evaluated against the record
        condition: Condition,
        /// Rule evaluated when the guard holds
        #[serde(rename = "thenValidator")]
        then_validator: Box<Rule>,
    },
}

impl RuleKind {
    /// Wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Required => "required",
            RuleKind::Format { .. } => "format",
            RuleKind::Length { .. } => "length",
            RuleKind::Range { .. } => "range",
            RuleKind::Email => "email",
            RuleKind::Phone => "phone",
            RuleKind::Custom { .. } => "custom",
            RuleKind::Conditional { .. } => "conditional",
        }
    }

    /// True for kinds that inspect absent values instead of skipping them.
    pub fn handles_absent_values(&self) -> bool {
        matches!(self, RuleKind::Required | RuleKind::Conditional { .. })
    }
}

/// One configured check applied to one field of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Target field (dotted paths allowed)
    pub field: String,
    /// Kind and parameters
    #[serde(flatten)]
    pub kind: RuleKind,
    /// Penalty override applied to every failure of this rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penalty: Option<f64>,
    /// Display name used in issues
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Error or warning
    #[serde(default)]
    pub severity: RuleSeverity,
}

impl Rule {
    /// Creates a rule with default penalty, name and severity.
    pub fn new(field: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            field: field.into(),
            kind,
            penalty: None,
            name: None,
            severity: RuleSeverity::Error,
        }
    }

    /// `required` rule.
    pub fn required(field: impl Into<String>) -> Self {
        Self::new(field, RuleKind::Required)
    }

    /// `format` rule.
    pub fn format(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(
            field,
            RuleKind::Format {
                parameters: PatternParameters {
                    pattern: pattern.into(),
                },
            },
        )
    }

    /// `length` rule.
    pub fn length(field: impl Into<String>, min: Option<usize>, max: Option<usize>) -> Self {
        Self::new(
            field,
            RuleKind::Length {
                parameters: Bounds { min, max },
            },
        )
    }

    /// `range` rule.
    pub fn range(field: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        Self::new(
            field,
            RuleKind::Range {
                parameters: Bounds { min, max },
            },
        )
    }

    /// `email` rule.
    pub fn email(field: impl Into<String>) -> Self {
        Self::new(field, RuleKind::Email)
    }

    /// `phone` rule.
    pub fn phone(field: impl Into<String>) -> Self {
        Self::new(field, RuleKind::Phone)
    }

    /// `custom` rule bound to a registered predicate.
    pub fn custom(field: impl Into<String>, validator: impl Into<String>) -> Self {
        Self::new(
            field,
            RuleKind::Custom {
                parameters: CustomParameters {
                    validator: validator.into(),
                },
            },
        )
    }

    /// `conditional` rule. The rule's own field is the guard field.
    pub fn conditional(condition: Condition, then_validator: Rule) -> Self {
        Self::new(
            condition.field.clone(),
            RuleKind::Conditional {
                condition,
                then_validator: Box::new(then_validator),
            },
        )
    }

    /// Builder method to override the penalty.
    pub fn with_penalty(mut self, penalty: f64) -> Self {
        self.penalty = Some(penalty);
        self
    }

    /// Builder method to set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder method to set the severity.
    pub fn with_severity(mut self, severity: RuleSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Name used in issues: the configured name or `<field>_<kind>`.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{}_{}", self.field, self.kind.as_str()))
    }

    /// Field a failure is reported against: the innermost nested rule's
    /// field for conditionals, the rule's own field otherwise.
    pub fn target_field(&self) -> &str {
        match &self.kind {
            RuleKind::Conditional { then_validator, .. } => then_validator.target_field(),
            _ => &self.field,
        }
    }

    /// Penalty for a failure whose kind-specific default is `default`.
    pub fn penalty_or(&self, default: f64) -> f64 {
        self.penalty.unwrap_or(default)
    }

    /// Collects every `format` pattern in this rule, including nested ones.
    pub(crate) fn collect_patterns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match &self.kind {
            RuleKind::Format { parameters } => out.push(&parameters.pattern),
            RuleKind::Conditional { then_validator, .. } => then_validator.collect_patterns(out),
            _ => {}
        }
    }
}

/// A rule definition that could not be parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokenRule {
    /// Position in the submitted rule list
    pub position: usize,
    /// Field the definition targeted, when readable
    pub field: String,
    /// Parse failure
    pub reason: String,
}

/// An entry of a rule set: a usable rule or a broken definition.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleEntry {
    /// Parsed rule
    Rule(Rule),
    /// Unparseable definition, reported on every record
    Broken(BrokenRule),
}

/// Ordered rules for one validation run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuleSet {
    entries: Vec<RuleEntry>,
}

impl RuleSet {
    /// Parses raw rule definitions one by one.
    ///
    /// A malformed definition does not reject the set; it is kept as a
    /// [`BrokenRule`] so that validation reports it with a fixed penalty.
    pub fn from_values(values: &[Value]) -> Self {
        let entries = values
            .iter()
            .enumerate()
            .map(|(position, value)| match Rule::deserialize(value) {
                Ok(rule) => RuleEntry::Rule(rule),
                Err(e) => {
                    let field = value
                        .get("field")
                        .and_then(Value::as_str)
                        .unwrap_or("$rule")
                        .to_string();
                    tracing::warn!("Rule #{} for '{}' is malformed: {}", position, field, e);
                    RuleEntry::Broken(BrokenRule {
                        position,
                        field,
                        reason: e.to_string(),
                    })
                }
            })
            .collect();
        Self { entries }
    }

    /// Returns the entries in evaluation order.
    pub fn entries(&self) -> &[RuleEntry] {
        &self.entries
    }

    /// Iterates over parsed rules only.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.entries.iter().filter_map(|entry| match entry {
            RuleEntry::Rule(rule) => Some(rule),
            RuleEntry::Broken(_) => None,
        })
    }

    /// Iterates over broken definitions only.
    pub fn broken(&self) -> impl Iterator<Item = &BrokenRule> {
        self.entries.iter().filter_map(|entry| match entry {
            RuleEntry::Broken(broken) => Some(broken),
            RuleEntry::Rule(_) => None,
        })
    }

    /// Number of entries, broken ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<Rule>> for RuleSet {
    fn from(rules: Vec<Rule>) -> Self {
        Self {
            entries: rules.into_iter().map(RuleEntry::Rule).collect(),
        }
    }
}

impl From<&[Rule]> for RuleSet {
    fn from(rules: &[Rule]) -> Self {
        Self::from(rules.to_vec())
    }
}
