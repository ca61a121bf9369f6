//! REST backend: lowers filters into PostgREST predicates and applies them
//! through a chained [`FilterBuilder`].
//!
//! Values are written in their plain text form. Reserved characters
//! (commas, parentheses, dots) inside values are not quoted.

use crate::{
    backend::FilterBackend,
    error::FilterError,
    operator::{Mapping, OperatorTable, Transform},
    where_clause::{WhereLowering, lower_where},
};
use model::{
    core::value::Value,
    filters::{Clause, Operator, Order, QueryFilters, Select, Where},
};
use std::fmt;
use tracing::debug;

pub struct RestOperators;

impl OperatorTable for RestOperators {
    type Op = &'static str;

    fn mapping(operator: Operator) -> Mapping<&'static str> {
        match operator {
            Operator::Is => Mapping::Direct("eq", Transform::Identity),
            Operator::IsNot => Mapping::Direct("neq", Transform::Identity),
            Operator::Gt => Mapping::Direct("gt", Transform::Identity),
            Operator::Gte => Mapping::Direct("gte", Transform::Identity),
            Operator::Lt => Mapping::Direct("lt", Transform::Identity),
            Operator::Lte => Mapping::Direct("lte", Transform::Identity),
            Operator::In => Mapping::Direct("in", Transform::Identity),
            Operator::Contains => Mapping::Direct("ilike", Transform::Contains),
            Operator::StartsWith => Mapping::Direct("ilike", Transform::StartsWith),
            Operator::EndsWith => Mapping::Direct("ilike", Transform::EndsWith),
            Operator::NotIn | Operator::IsNull | Operator::IsNotNull => Mapping::Structural,
        }
    }
}

/// A single `column.[not.]operator.value` predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestCondition {
    pub column: String,
    pub negated: bool,
    pub operator: &'static str,
    pub value: String,
}

impl RestCondition {
    fn new(column: &str, negated: bool, operator: &'static str, value: String) -> Self {
        RestCondition {
            column: column.to_string(),
            negated,
            operator,
            value,
        }
    }

    /// The `[not.]operator.value` part sent as a query parameter value.
    pub fn filter_value(&self) -> String {
        if self.negated {
            format!("not.{}.{}", self.operator, self.value)
        } else {
            format!("{}.{}", self.operator, self.value)
        }
    }

    /// Applies this condition through the builder's generic entry points.
    pub fn apply<B: FilterBuilder>(&self, builder: B) -> B {
        if self.negated {
            builder.not(&self.column, self.operator, &self.value)
        } else {
            builder.filter(&self.column, self.operator, &self.value)
        }
    }
}

impl fmt::Display for RestCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.column, self.filter_value())
    }
}

/// A boolean expression in PostgREST's logical-operator grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestFilterExpr {
    /// A single leaf condition
    Leaf(RestCondition),

    /// An AND of 0+ sub‐expressions; empty matches everything.
    And(Vec<RestFilterExpr>),

    /// An OR of 1+ sub‐expressions
    Or(Vec<RestFilterExpr>),
}

impl RestFilterExpr {
    pub fn is_empty(&self) -> bool {
        matches!(self, RestFilterExpr::And(children) if children.is_empty())
    }

    /// Renders this expression as a member of a logical operator list:
    /// `col.op.v`, `and(a,b)` or `or(a,b)`. Single-child groups are
    /// unwrapped and an empty conjunction renders as an empty string.
    pub fn to_rest(&self) -> String {
        match self {
            RestFilterExpr::Leaf(condition) => condition.to_string(),
            RestFilterExpr::And(children) if children.is_empty() => String::new(),
            RestFilterExpr::And(children) | RestFilterExpr::Or(children)
                if children.len() == 1 =>
            {
                children[0].to_rest()
            }
            RestFilterExpr::And(children) => format!("and({})", join(children)),
            RestFilterExpr::Or(children) => format!("or({})", join(children)),
        }
    }
}

fn join(children: &[RestFilterExpr]) -> String {
    children
        .iter()
        .map(RestFilterExpr::to_rest)
        .collect::<Vec<_>>()
        .join(",")
}

impl fmt::Display for RestFilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rest())
    }
}

/// `(a,b,c)`; a scalar becomes a one-item list.
fn list_literal(value: &Value) -> String {
    let items = value
        .to_items()
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>();
    format!("({})", items.join(","))
}

/// Builds the leaf condition for one operator. A scalar given to `In` or
/// `NotIn` is treated as a one-item list.
pub fn condition(column: &str, operator: Operator, value: &Value) -> RestCondition {
    match RestOperators::mapping(operator) {
        Mapping::Direct("in", _) => RestCondition::new(column, false, "in", list_literal(value)),
        Mapping::Direct(op, transform) => {
            RestCondition::new(column, false, op, transform.apply(&value.to_string()))
        }
        Mapping::Structural => match operator {
            Operator::IsNull => RestCondition::new(column, false, "is", "null".into()),
            Operator::IsNotNull => RestCondition::new(column, true, "is", "null".into()),
            _ => RestCondition::new(column, true, "in", list_literal(value)),
        },
    }
}

struct RestLowering;

impl WhereLowering for RestLowering {
    type Condition = RestFilterExpr;
    type Field = String;

    fn always_true(&self) -> RestFilterExpr {
        RestFilterExpr::And(Vec::new())
    }

    fn resolve(&self, field: &str) -> Result<String, FilterError> {
        Ok(field.to_string())
    }

    fn leaf(&self, field: &String, operator: Operator, value: &Value) -> Option<RestFilterExpr> {
        Some(RestFilterExpr::Leaf(condition(field, operator, value)))
    }

    /// Nested conjunctions are flattened into one `and(..)` list.
    fn and(&self, conditions: Vec<RestFilterExpr>) -> RestFilterExpr {
        let mut flat = Vec::with_capacity(conditions.len());
        for condition in conditions {
            match condition {
                RestFilterExpr::And(children) => flat.extend(children),
                other => flat.push(other),
            }
        }
        RestFilterExpr::And(flat)
    }

    /// A member that matches everything makes the whole group match
    /// everything.
    fn or(&self, conditions: Vec<RestFilterExpr>) -> RestFilterExpr {
        if conditions.is_empty() || conditions.iter().any(RestFilterExpr::is_empty) {
            return self.always_true();
        }
        RestFilterExpr::Or(conditions)
    }
}

/// Compiles a where tree into a single expression tree.
pub fn compile_where(where_clause: Option<&Where>) -> Result<RestFilterExpr, FilterError> {
    lower_where(&RestLowering, where_clause)
}

/// The argument of an `or(...)` call for one group: each member rendered and
/// comma-joined. `None` when some member matches everything, since the
/// group then filters nothing.
pub fn or_filter(groups: &[Where]) -> Result<Option<String>, FilterError> {
    match RestLowering.or(
        groups
            .iter()
            .map(|group| compile_where(Some(group)))
            .collect::<Result<Vec<_>, _>>()?,
    ) {
        RestFilterExpr::Or(members) => Ok(Some(join(&members))),
        _ => Ok(None),
    }
}

/// A chained query builder exposing PostgREST's filter entry points.
pub trait FilterBuilder: Sized {
    /// `column=operator.value`
    fn filter(self, column: &str, operator: &str, value: &str) -> Self;

    /// `column=not.operator.value`
    fn not(self, column: &str, operator: &str, value: &str) -> Self;

    /// `or=(filters)`
    fn or(self, filters: &str) -> Self;

    fn eq(self, column: &str, value: &str) -> Self {
        self.filter(column, "eq", value)
    }

    fn neq(self, column: &str, value: &str) -> Self {
        self.filter(column, "neq", value)
    }

    fn gt(self, column: &str, value: &str) -> Self {
        self.filter(column, "gt", value)
    }

    fn gte(self, column: &str, value: &str) -> Self {
        self.filter(column, "gte", value)
    }

    fn lt(self, column: &str, value: &str) -> Self {
        self.filter(column, "lt", value)
    }

    fn lte(self, column: &str, value: &str) -> Self {
        self.filter(column, "lte", value)
    }

    fn in_list(self, column: &str, values: &[&str]) -> Self {
        self.filter(column, "in", &format!("({})", values.join(",")))
    }

    fn ilike(self, column: &str, pattern: &str) -> Self {
        self.filter(column, "ilike", pattern)
    }

    fn is_null(self, column: &str) -> Self {
        self.filter(column, "is", "null")
    }

    fn select_columns(self, _columns: &str) -> Self {
        self
    }

    fn order_by(self, _column: &str, _ascending: bool) -> Self {
        self
    }

    fn limit(self, _count: usize) -> Self {
        self
    }
}

/// Applies a where tree to `builder`.
///
/// Every top-level field condition goes through [`FilterBuilder::filter`] or
/// [`FilterBuilder::not`] in field order; the `OneOf` group goes through a
/// single [`FilterBuilder::or`] call. Nothing is called for an empty tree.
pub fn apply_where<B: FilterBuilder>(
    mut builder: B,
    where_clause: Option<&Where>,
) -> Result<B, FilterError> {
    let Some(where_clause) = where_clause else {
        return Ok(builder);
    };

    for clause in where_clause.clauses() {
        match clause {
            Clause::Field {
                name,
                predicate: Some(predicate),
            } => {
                for (op, value) in predicate.effective() {
                    let condition = condition(name, op, value);
                    debug!(filter = %condition, "Applying REST filter");
                    builder = condition.apply(builder);
                }
            }
            Clause::Field { predicate: None, .. } => {}
            Clause::OneOf(groups) => {
                if let Some(filters) = or_filter(groups)? {
                    debug!(%filters, "Applying REST or-filter");
                    builder = builder.or(&filters);
                }
            }
        }
    }

    Ok(builder)
}

/// Sort directives are not forwarded yet; the builder is returned untouched.
pub fn apply_order<B: FilterBuilder>(builder: B, _order: &Order) -> B {
    builder
}

/// Projection is not forwarded yet; the builder is returned untouched.
pub fn apply_select<B: FilterBuilder>(builder: B, _select: &Select) -> B {
    builder
}

/// Applies where, then select, then order.
pub fn apply_filters<B: FilterBuilder>(builder: B, filters: &QueryFilters) -> Result<B, FilterError> {
    let mut builder = apply_where(builder, filters.where_clause.as_ref())?;
    if let Some(select) = &filters.select {
        builder = apply_select(builder, select);
    }
    if let Some(order) = &filters.order {
        builder = apply_order(builder, order);
    }
    Ok(builder)
}

/// Records PostgREST query parameters in call order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestQuery {
    params: Vec<(String, String)>,
}

impl RestQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// `key=value&...` without percent-encoding; HTTP clients encode the
    /// pairs from [`RestQuery::params`] themselves.
    pub fn to_query_string(&self) -> String {
        self.params
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }

    fn push(mut self, key: &str, value: String) -> Self {
        self.params.push((key.to_string(), value));
        self
    }
}

impl FilterBuilder for RestQuery {
    fn filter(self, column: &str, operator: &str, value: &str) -> Self {
        self.push(column, format!("{operator}.{value}"))
    }

    fn not(self, column: &str, operator: &str, value: &str) -> Self {
        self.push(column, format!("not.{operator}.{value}"))
    }

    fn or(self, filters: &str) -> Self {
        self.push("or", format!("({filters})"))
    }

    fn select_columns(self, columns: &str) -> Self {
        self.push("select", columns.to_string())
    }

    fn order_by(self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.push("order", format!("{column}.{direction}"))
    }

    fn limit(self, count: usize) -> Self {
        self.push("limit", count.to_string())
    }
}

/// [`FilterBackend`] producing a single [`RestFilterExpr`]; use
/// [`apply_where`] to attach conditions to a builder instead.
pub struct RestBackend;

impl FilterBackend for RestBackend {
    type Where = RestFilterExpr;
    type Order = ();
    type Select = ();

    fn compile_where(&self, where_clause: Option<&Where>) -> Result<RestFilterExpr, FilterError> {
        compile_where(where_clause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::filters::Predicate;

    #[test]
    fn test_leaf_rendering() {
        let render = |op, value: Value| condition("f", op, &value).to_string();

        assert_eq!(render(Operator::Is, 3.into()), "f.eq.3");
        assert_eq!(render(Operator::IsNot, "x".into()), "f.neq.x");
        assert_eq!(render(Operator::In, vec!["a", "b"].into()), "f.in.(a,b)");
        assert_eq!(render(Operator::NotIn, vec![1, 2].into()), "f.not.in.(1,2)");
        assert_eq!(render(Operator::NotIn, 1.into()), "f.not.in.(1)");
        assert_eq!(render(Operator::StartsWith, "ad".into()), "f.ilike.ad%");
        assert_eq!(render(Operator::IsNull, true.into()), "f.is.null");
        assert_eq!(render(Operator::IsNotNull, Value::Null), "f.not.is.null");
    }

    #[test]
    fn test_top_level_fields_use_filter_and_not() {
        let w = Where::new()
            .field("age", Predicate::new().gte(18).lte(65))
            .field("email", Predicate::new().is_not_null())
            .field("status", Predicate::new().not_in(vec!["banned"]));

        let query = apply_where(RestQuery::new(), Some(&w)).unwrap();
        assert_eq!(
            query.to_query_string(),
            "age=gte.18&age=lte.65&email=not.is.null&status=not.in.(banned)"
        );
    }

    #[test]
    fn test_empty_where_makes_no_calls() {
        let w = Where::new().one_of(vec![Where::new(), Where::new()]);
        assert!(apply_where(RestQuery::new(), Some(&w)).unwrap().is_empty());
        assert!(apply_where(RestQuery::new(), None).unwrap().is_empty());
    }

    #[test]
    fn test_nested_or_inside_group() {
        let w = Where::new().one_of(vec![
            Where::new()
                .field("a", Predicate::new().is(1))
                .one_of(vec![
                    Where::new().field("b", Predicate::new().is(2)),
                    Where::new().field("c", Predicate::new().is(3)),
                ]),
            Where::new().field("d", Predicate::new().is(4)),
        ]);

        assert_eq!(
            or_filter(w.groups().unwrap()).unwrap().unwrap(),
            "and(a.eq.1,or(b.eq.2,c.eq.3)),d.eq.4"
        );
    }

    #[test]
    fn test_empty_member_drops_the_whole_group() {
        let w = Where::new().one_of(vec![
            Where::new(),
            Where::new().field("role", Predicate::new().is("admin")),
        ]);

        assert_eq!(or_filter(w.groups().unwrap()).unwrap(), None);
        assert!(compile_where(Some(&w)).unwrap().is_empty());
    }

    #[test]
    fn test_nested_and_is_flattened() {
        let nested = RestLowering.and(vec![
            RestLowering.and(vec![
                RestFilterExpr::Leaf(condition("b", Operator::Lt, &3.into())),
                RestFilterExpr::Leaf(condition("b", Operator::Gt, &1.into())),
            ]),
            RestLowering.always_true(),
            RestFilterExpr::Leaf(condition("a", Operator::Is, &2.into())),
        ]);

        assert_eq!(nested.to_rest(), "and(b.lt.3,b.gt.1,a.eq.2)");
    }

    #[test]
    fn test_order_and_select_leave_builder_untouched() {
        let filters = QueryFilters::new()
            .with_order(Order::new().asc("name"))
            .with_select(Select::new());
        let query = apply_filters(RestQuery::new(), &filters).unwrap();
        assert!(query.is_empty());
    }

    #[test]
    fn test_query_builder_helpers() {
        let query = RestQuery::new()
            .eq("id", "1")
            .in_list("tag", &["a", "b"])
            .select_columns("*")
            .limit(1);
        assert_eq!(
            query.to_query_string(),
            "id=eq.1&tag=in.(a,b)&select=*&limit=1"
        );
    }
}
