use crate::filters::FilterParseError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The logical predicate kinds a field condition can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Is,
    IsNot,
    #[serde(rename = "GT")]
    Gt,
    #[serde(rename = "GTE")]
    Gte,
    #[serde(rename = "LT")]
    Lt,
    #[serde(rename = "LTE")]
    Lte,
    In,
    NotIn,
    Contains,
    StartsWith,
    EndsWith,
    IsNull,
    IsNotNull,
}

impl Operator {
    pub const ALL: [Operator; 13] = [
        Operator::Is,
        Operator::IsNot,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::In,
        Operator::NotIn,
        Operator::Contains,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::IsNull,
        Operator::IsNotNull,
    ];

    /// Name used by the JSON filter form.
    pub fn name(&self) -> &'static str {
        match self {
            Operator::Is => "Is",
            Operator::IsNot => "IsNot",
            Operator::Gt => "GT",
            Operator::Gte => "GTE",
            Operator::Lt => "LT",
            Operator::Lte => "LTE",
            Operator::In => "In",
            Operator::NotIn => "NotIn",
            Operator::Contains => "Contains",
            Operator::StartsWith => "StartsWith",
            Operator::EndsWith => "EndsWith",
            Operator::IsNull => "IsNull",
            Operator::IsNotNull => "IsNotNull",
        }
    }

    /// `IsNull` and `IsNotNull` never look at the value they are paired with.
    pub fn is_null_test(&self) -> bool {
        matches!(self, Operator::IsNull | Operator::IsNotNull)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operator {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| FilterParseError::UnknownOperator(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for op in Operator::ALL {
            assert_eq!(op.name().parse::<Operator>().unwrap(), op);
        }
    }

    #[test]
    fn test_unknown_operator() {
        let err = "Between".parse::<Operator>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown filter operator: Between");
    }

    #[test]
    fn test_serde_names_match() {
        let json = serde_json::to_string(&Operator::Gte).unwrap();
        assert_eq!(json, "\"GTE\"");
        let op: Operator = serde_json::from_str("\"NotIn\"").unwrap();
        assert_eq!(op, Operator::NotIn);
    }
}
