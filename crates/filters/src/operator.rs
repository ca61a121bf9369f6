//! Per-backend operator tables.

use model::{core::value::Value, filters::Operator};

/// Rewrites a value before it reaches a pattern-matching operator.
///
/// `%` and `_` inside the value are not escaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Identity,
    /// `%v%`
    Contains,
    /// `v%`
    StartsWith,
    /// `%v`
    EndsWith,
}

impl Transform {
    pub fn apply(self, text: &str) -> String {
        match self {
            Transform::Identity => text.to_string(),
            Transform::Contains => format!("%{text}%"),
            Transform::StartsWith => format!("{text}%"),
            Transform::EndsWith => format!("%{text}"),
        }
    }

    /// Identity keeps the value as is; the wildcard transforms work on its
    /// text form and yield a string.
    pub fn apply_value(self, value: &Value) -> Value {
        match self {
            Transform::Identity => value.clone(),
            other => Value::String(other.apply(&value.to_string())),
        }
    }
}

/// How a backend expresses one [`Operator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mapping<Op> {
    /// A native operator, fed the transformed value.
    Direct(Op, Transform),
    /// Needs a dedicated construction in the compiler (null tests, negated
    /// lists on backends without a negated list operator).
    Structural,
}

/// A total, stateless map from logical operators to a backend's own.
pub trait OperatorTable {
    type Op: Copy;

    fn mapping(operator: Operator) -> Mapping<Self::Op>;
}
