//! ORM backend: lowers filters into a nested `where` object such as
//! `{"age": {"gte": 18}, "OR": [{"role": {"equals": "admin"}}]}`.

use crate::{
    backend::FilterBackend,
    error::FilterError,
    operator::{Mapping, OperatorTable, Transform},
    where_clause::{WhereLowering, lower_where},
};
use model::{
    core::value::Value,
    filters::{Operator, Order, QueryFilters, Select, Where},
};
use serde::{Serialize, Serializer, ser::SerializeMap};
use serde_json::{Map, Value as Json};

pub const AND_KEY: &str = "AND";
pub const OR_KEY: &str = "OR";

pub struct ObjectOperators;

impl OperatorTable for ObjectOperators {
    type Op = &'static str;

    fn mapping(operator: Operator) -> Mapping<&'static str> {
        let key = match operator {
            Operator::Is => "equals",
            Operator::IsNot => "not",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::In => "in",
            Operator::NotIn => "notIn",
            Operator::Contains => "contains",
            Operator::StartsWith => "startsWith",
            Operator::EndsWith => "endsWith",
            Operator::IsNull | Operator::IsNotNull => return Mapping::Structural,
        };
        Mapping::Direct(key, Transform::Identity)
    }
}

/// The operator object of a single field, e.g. `{"gte": 18, "lte": 65}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldFilter {
    ops: Vec<(&'static str, Json)>,
}

impl FieldFilter {
    pub fn get(&self, key: &str) -> Option<&Json> {
        self.ops.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    fn to_json(&self) -> Json {
        Json::Object(
            self.ops
                .iter()
                .map(|(key, value)| (key.to_string(), value.clone()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Entry {
    Field(String, FieldFilter),
    And(Vec<ObjectWhere>),
    Or(Vec<ObjectWhere>),
}

impl Entry {
    fn key(&self) -> &str {
        match self {
            Entry::Field(name, _) => name,
            Entry::And(_) => AND_KEY,
            Entry::Or(_) => OR_KEY,
        }
    }
}

/// A compiled `where` object. Keys keep the order in which their clauses
/// appeared; an empty object matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectWhere {
    entries: Vec<Entry>,
}

impl ObjectWhere {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&FieldFilter> {
        self.entries.iter().find_map(|entry| match entry {
            Entry::Field(field, filter) if field == name => Some(filter),
            _ => None,
        })
    }

    /// Members of the `OR` group, if any.
    pub fn any_of(&self) -> Option<&[ObjectWhere]> {
        self.entries.iter().find_map(|entry| match entry {
            Entry::Or(members) => Some(members.as_slice()),
            _ => None,
        })
    }

    pub fn to_json(&self) -> Json {
        let mut map = Map::new();
        for entry in &self.entries {
            let value = match entry {
                Entry::Field(_, filter) => filter.to_json(),
                Entry::And(members) | Entry::Or(members) => {
                    Json::Array(members.iter().map(ObjectWhere::to_json).collect())
                }
            };
            map.insert(entry.key().to_string(), value);
        }
        Json::Object(map)
    }

    fn single(entry: Entry) -> Self {
        ObjectWhere {
            entries: vec![entry],
        }
    }

    /// Folds `other` into `self` key by key. Operators of the same field
    /// share one object. Returns `false`, leaving `self` partially merged,
    /// when a key or operator would be overwritten.
    fn merge(&mut self, other: &ObjectWhere) -> bool {
        for entry in &other.entries {
            match self
                .entries
                .iter_mut()
                .find(|current| current.key() == entry.key())
            {
                None => self.entries.push(entry.clone()),
                Some(Entry::Field(_, current)) => {
                    let Entry::Field(_, incoming) = entry else {
                        return false;
                    };
                    for (key, value) in &incoming.ops {
                        if current.get(key).is_some() {
                            return false;
                        }
                        current.ops.push((*key, value.clone()));
                    }
                }
                Some(_) => return false,
            }
        }
        true
    }
}

impl Serialize for FieldFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.ops.len()))?;
        for (key, value) in &self.ops {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Serialize for ObjectWhere {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            match entry {
                Entry::Field(name, filter) => map.serialize_entry(name, filter)?,
                Entry::And(members) | Entry::Or(members) => {
                    map.serialize_entry(entry.key(), members)?
                }
            }
        }
        map.end()
    }
}

struct ObjectLowering;

impl WhereLowering for ObjectLowering {
    type Condition = ObjectWhere;
    type Field = String;

    fn always_true(&self) -> ObjectWhere {
        ObjectWhere::default()
    }

    fn resolve(&self, field: &str) -> Result<String, FilterError> {
        Ok(field.to_string())
    }

    fn leaf(&self, field: &String, operator: Operator, value: &Value) -> Option<ObjectWhere> {
        let (key, value) = match ObjectOperators::mapping(operator) {
            Mapping::Direct(key, transform) => (key, transform.apply_value(value).to_json()),
            Mapping::Structural if operator == Operator::IsNull => ("equals", Json::Null),
            Mapping::Structural => ("not", Json::Null),
        };
        let filter = FieldFilter {
            ops: vec![(key, value)],
        };
        Some(ObjectWhere::single(Entry::Field(field.clone(), filter)))
    }

    fn and(&self, conditions: Vec<ObjectWhere>) -> ObjectWhere {
        let mut merged = ObjectWhere::default();
        if conditions.iter().all(|condition| merged.merge(condition)) {
            merged
        } else {
            ObjectWhere::single(Entry::And(conditions))
        }
    }

    fn or(&self, conditions: Vec<ObjectWhere>) -> ObjectWhere {
        ObjectWhere::single(Entry::Or(conditions))
    }
}

/// Compiles a where tree into an ORM `where` object. An absent or empty
/// tree compiles to `{}`.
pub fn compile_where(where_clause: Option<&Where>) -> Result<ObjectWhere, FilterError> {
    lower_where(&ObjectLowering, where_clause)
}

/// Compiled `orderBy` argument. Currently always `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ObjectOrderBy(Map<String, Json>);

/// Compiled `select` argument. Currently always `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ObjectSelect(Map<String, Json>);

impl ObjectOrderBy {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl ObjectSelect {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub fn compile_order(_order: &Order) -> ObjectOrderBy {
    ObjectOrderBy::default()
}

pub fn compile_select(_select: &Select) -> ObjectSelect {
    ObjectSelect::default()
}

/// Arguments for an ORM `findMany`-style call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObjectFilters {
    #[serde(rename = "where")]
    pub where_clause: ObjectWhere,
    pub select: ObjectSelect,
    #[serde(rename = "orderBy")]
    pub order_by: ObjectOrderBy,
}

pub fn compile_filters(filters: &QueryFilters) -> Result<ObjectFilters, FilterError> {
    Ok(ObjectFilters {
        where_clause: compile_where(filters.where_clause.as_ref())?,
        select: filters
            .select
            .as_ref()
            .map(compile_select)
            .unwrap_or_default(),
        order_by: filters
            .order
            .as_ref()
            .map(compile_order)
            .unwrap_or_default(),
    })
}

pub struct ObjectBackend;

impl FilterBackend for ObjectBackend {
    type Where = ObjectWhere;
    type Order = ObjectOrderBy;
    type Select = ObjectSelect;

    fn compile_where(&self, where_clause: Option<&Where>) -> Result<ObjectWhere, FilterError> {
        compile_where(where_clause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::filters::Predicate;
    use serde_json::json;

    fn compile(w: &Where) -> Json {
        compile_where(Some(w)).unwrap().to_json()
    }

    #[test]
    fn test_field_operators_share_one_object() {
        let w = Where::new()
            .field("age", Predicate::new().gte(18).lte(65))
            .field("status", Predicate::new().in_list(vec!["active", "pending"]));

        assert_eq!(
            compile(&w),
            json!({
                "age": {"gte": 18, "lte": 65},
                "status": {"in": ["active", "pending"]}
            })
        );
    }

    #[test]
    fn test_null_tests() {
        let w = Where::new()
            .field("deleted_at", Predicate::new().is_null())
            .field("email", Predicate::new().is_not_null());

        assert_eq!(
            compile(&w),
            json!({"deleted_at": {"equals": null}, "email": {"not": null}})
        );
    }

    #[test]
    fn test_or_is_kept_for_single_group() {
        let w = Where::new().one_of(vec![
            Where::new().field("role", Predicate::new().is("admin")),
        ]);
        assert_eq!(compile(&w), json!({"OR": [{"role": {"equals": "admin"}}]}));
    }

    #[test]
    fn test_nested_groups() {
        let w = Where::new()
            .field("active", Predicate::new().is(true))
            .one_of(vec![
                Where::new()
                    .field("name", Predicate::new().starts_with("A"))
                    .one_of(vec![Where::new().field("age", Predicate::new().lt(30))]),
                Where::new().field("name", Predicate::new().ends_with("z")),
            ]);

        assert_eq!(
            compile(&w),
            json!({
                "active": {"equals": true},
                "OR": [
                    {"name": {"startsWith": "A"}, "OR": [{"age": {"lt": 30}}]},
                    {"name": {"endsWith": "z"}}
                ]
            })
        );
    }

    #[test]
    fn test_colliding_keys_fall_back_to_and() {
        let a = ObjectLowering
            .leaf(&"x".to_string(), Operator::Gt, &Value::Int(1))
            .unwrap();
        let b = ObjectLowering
            .leaf(&"x".to_string(), Operator::Gt, &Value::Int(2))
            .unwrap();

        let merged = ObjectLowering.and(vec![a, b]);
        assert_eq!(
            merged.to_json(),
            json!({"AND": [{"x": {"gt": 1}}, {"x": {"gt": 2}}]})
        );
    }

    #[test]
    fn test_compile_filters_envelope() {
        let filters = QueryFilters::new()
            .with_where(Where::new().field("name", Predicate::new().contains("john")))
            .with_order(Order::new().desc("name"));

        let compiled = compile_filters(&filters).unwrap();
        assert_eq!(
            serde_json::to_value(&compiled).unwrap(),
            json!({
                "where": {"name": {"contains": "john"}},
                "select": {},
                "orderBy": {}
            })
        );
    }
}
