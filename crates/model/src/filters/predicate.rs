use crate::{core::value::Value, filters::{operator::Operator, ordered}};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One field's set of operator/value pairs. Pairs combine with AND.
///
/// Setting an operator that is already present replaces its value without
/// moving it, so iteration follows first-insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    entries: Vec<(Operator, Value)>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, op: Operator, value: impl Into<Value>) -> Self {
        self.set(op, value);
        self
    }

    pub fn set(&mut self, op: Operator, value: impl Into<Value>) {
        ordered::upsert(&mut self.entries, op, value.into());
    }

    pub fn is(self, value: impl Into<Value>) -> Self {
        self.with(Operator::Is, value)
    }

    pub fn is_not(self, value: impl Into<Value>) -> Self {
        self.with(Operator::IsNot, value)
    }

    pub fn gt(self, value: impl Into<Value>) -> Self {
        self.with(Operator::Gt, value)
    }

    pub fn gte(self, value: impl Into<Value>) -> Self {
        self.with(Operator::Gte, value)
    }

    pub fn lt(self, value: impl Into<Value>) -> Self {
        self.with(Operator::Lt, value)
    }

    pub fn lte(self, value: impl Into<Value>) -> Self {
        self.with(Operator::Lte, value)
    }

    pub fn in_list<T: Into<Value>>(self, values: Vec<T>) -> Self {
        self.with(Operator::In, values)
    }

    pub fn not_in<T: Into<Value>>(self, values: Vec<T>) -> Self {
        self.with(Operator::NotIn, values)
    }

    pub fn contains(self, value: impl Into<Value>) -> Self {
        self.with(Operator::Contains, value)
    }

    pub fn starts_with(self, value: impl Into<Value>) -> Self {
        self.with(Operator::StartsWith, value)
    }

    pub fn ends_with(self, value: impl Into<Value>) -> Self {
        self.with(Operator::EndsWith, value)
    }

    pub fn is_null(self) -> Self {
        self.with(Operator::IsNull, true)
    }

    pub fn is_not_null(self) -> Self {
        self.with(Operator::IsNotNull, true)
    }

    pub fn get(&self, op: Operator) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| *k == op).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Operator, &Value)> {
        self.entries.iter().map(|(op, value)| (*op, value))
    }

    /// Pairs that produce a condition: null tests always, every other
    /// operator only when its value is not null.
    pub fn effective(&self) -> impl Iterator<Item = (Operator, &Value)> {
        self.iter()
            .filter(|(op, value)| op.is_null_test() || !value.is_null())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(Operator, Value)> for Predicate {
    fn from_iter<I: IntoIterator<Item = (Operator, Value)>>(iter: I) -> Self {
        let mut predicate = Predicate::new();
        for (op, value) in iter {
            predicate.set(op, value);
        }
        predicate
    }
}

impl Serialize for Predicate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ordered::serialize(&self.entries, serializer)
    }
}

impl<'de> Deserialize<'de> for Predicate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = ordered::deserialize(deserializer)?;
        Ok(Predicate { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_replaces_in_place() {
        let predicate = Predicate::new().gte(18).lte(65).gte(21);
        let ops: Vec<_> = predicate.iter().collect();
        assert_eq!(
            ops,
            vec![
                (Operator::Gte, &Value::Int(21)),
                (Operator::Lte, &Value::Int(65))
            ]
        );
    }

    #[test]
    fn test_effective_skips_null_values_but_not_null_tests() {
        let predicate = Predicate::new()
            .is(Value::Null)
            .with(Operator::IsNull, Value::Null)
            .with(Operator::IsNotNull, "anything")
            .contains("x");

        let ops: Vec<_> = predicate.effective().map(|(op, _)| op).collect();
        assert_eq!(
            ops,
            vec![Operator::IsNull, Operator::IsNotNull, Operator::Contains]
        );
    }

    #[test]
    fn test_json_preserves_order() {
        let predicate: Predicate =
            serde_json::from_value(json!({"LTE": 65, "GTE": 18})).unwrap();
        let ops: Vec<_> = predicate.iter().map(|(op, _)| op).collect();
        assert_eq!(ops, vec![Operator::Lte, Operator::Gte]);
        assert_eq!(
            serde_json::to_string(&predicate).unwrap(),
            r#"{"LTE":65,"GTE":18}"#
        );
    }

    #[test]
    fn test_unknown_operator_is_rejected() {
        let result = serde_json::from_value::<Predicate>(json!({"Like": "a"}));
        assert!(result.is_err());
    }
}
