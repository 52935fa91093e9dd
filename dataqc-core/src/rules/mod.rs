//! Validation rules: definitions, custom predicates and evaluation.

pub mod custom;
pub mod evaluator;
pub mod model;

pub use custom::{CustomPredicate, CustomValidators};
pub use evaluator::{RuleError, RuleEvaluator, RuleOutcome, condition_holds};
pub use model::{
    Bounds, BrokenRule, Condition, ConditionOperator, CustomParameters, PatternParameters, Rule,
    RuleEntry, RuleKind, RuleSet, RuleSeverity,
};
