//! SQL backend: lowers filters into planner [`Expr`] trees.

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
use planner::query::ast::{
    expr::{BinaryOperator, Expr, Ident},
    select::OrderByExpr,
};
use std::collections::HashMap;

/// Native operators of the query builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlOp {
    Compare(BinaryOperator),
    In,
    NotIn,
}

pub struct SqlOperators;

impl OperatorTable for SqlOperators {
    type Op = SqlOp;

    fn mapping(operator: Operator) -> Mapping<SqlOp> {
        use BinaryOperator::*;

        let compare = |op, transform| Mapping::Direct(SqlOp::Compare(op), transform);
        match operator {
            Operator::Is => compare(Eq, Transform::Identity),
            Operator::IsNot => compare(NotEq, Transform::Identity),
            Operator::Gt => compare(Gt, Transform::Identity),
            Operator::Gte => compare(GtEq, Transform::Identity),
            Operator::Lt => compare(Lt, Transform::Identity),
            Operator::Lte => compare(LtEq, Transform::Identity),
            Operator::In => Mapping::Direct(SqlOp::In, Transform::Identity),
            Operator::NotIn => Mapping::Direct(SqlOp::NotIn, Transform::Identity),
            Operator::Contains => compare(ILike, Transform::Contains),
            Operator::StartsWith => compare(ILike, Transform::StartsWith),
            Operator::EndsWith => compare(ILike, Transform::EndsWith),
            Operator::IsNull | Operator::IsNotNull => Mapping::Structural,
        }
    }
}

/// Maps a logical field name to the column expression it filters on.
pub trait ColumnResolver {
    fn resolve(&self, field: &str) -> Result<Expr, FilterError>;
}

impl<F> ColumnResolver for F
where
    F: Fn(&str) -> Result<Expr, FilterError>,
{
    fn resolve(&self, field: &str) -> Result<Expr, FilterError> {
        self(field)
    }
}

/// Uses the field name as an unqualified column name.
pub fn column(field: &str) -> Result<Expr, FilterError> {
    Ok(planner::query::ident(field))
}

/// A declared field to column mapping. Fields that are not declared are
/// rejected with [`FilterError::UnknownField`].
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    qualifier: Option<String>,
    columns: HashMap<String, String>,
}

impl ColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Qualifies every resolved column, e.g. with a table alias.
    pub fn qualified(mut self, qualifier: &str) -> Self {
        self.qualifier = Some(qualifier.to_string());
        self
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        ColumnMap {
            qualifier: None,
            columns: pairs
                .into_iter()
                .map(|(field, column)| (field.into(), column.into()))
                .collect(),
        }
    }

    pub fn with(mut self, field: &str, column: &str) -> Self {
        self.columns.insert(field.to_string(), column.to_string());
        self
    }

    pub fn contains(&self, field: &str) -> bool {
        self.columns.contains_key(field)
    }

    pub fn column_name(&self, field: &str) -> Option<&str> {
        self.columns.get(field).map(String::as_str)
    }

    /// The field declared for `column`, if any.
    pub fn field_name(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(_, name)| name.as_str() == column)
            .map(|(field, _)| field.as_str())
    }
}

impl ColumnResolver for ColumnMap {
    fn resolve(&self, field: &str) -> Result<Expr, FilterError> {
        let name = self
            .columns
            .get(field)
            .ok_or_else(|| FilterError::UnknownField(field.to_string()))?;
        Ok(Expr::Identifier(Ident {
            qualifier: self.qualifier.clone(),
            name: name.clone(),
        }))
    }
}

struct SqlLowering<'a, R: ?Sized> {
    resolver: &'a R,
}

impl<R: ColumnResolver + ?Sized> WhereLowering for SqlLowering<'_, R> {
    type Condition = Expr;
    type Field = Expr;

    fn always_true(&self) -> Expr {
        Expr::Literal("TRUE".to_string())
    }

    fn resolve(&self, field: &str) -> Result<Expr, FilterError> {
        self.resolver.resolve(field)
    }

    fn leaf(&self, column: &Expr, operator: Operator, value: &Value) -> Option<Expr> {
        let condition = match SqlOperators::mapping(operator) {
            Mapping::Structural => column.clone().is_null(operator == Operator::IsNotNull),
            Mapping::Direct(SqlOp::In, _) => column.clone().in_list(list_items(value), false),
            Mapping::Direct(SqlOp::NotIn, _) => column.clone().in_list(list_items(value), true),
            Mapping::Direct(SqlOp::Compare(op), transform) => Expr::binary(
                column.clone(),
                op,
                Expr::Value(transform.apply_value(value)),
            ),
        };
        Some(condition)
    }

    fn and(&self, conditions: Vec<Expr>) -> Expr {
        conditions
            .into_iter()
            .reduce(Expr::and)
            .unwrap_or_else(|| self.always_true())
    }

    fn or(&self, conditions: Vec<Expr>) -> Expr {
        conditions
            .into_iter()
            .reduce(Expr::or)
            .unwrap_or_else(|| Expr::Literal("FALSE".to_string()))
    }
}

/// A scalar is treated as a single-item list.
fn list_items(value: &Value) -> Vec<Expr> {
    value.to_items().into_iter().map(Expr::Value).collect()
}

/// Compiles a where tree into a boolean expression. An absent or empty tree
/// compiles to `TRUE`.
pub fn compile_where<R: ColumnResolver + ?Sized>(
    where_clause: Option<&Where>,
    resolver: &R,
) -> Result<Expr, FilterError> {
    lower_where(&SqlLowering { resolver }, where_clause)
}

/// No sort directives are emitted yet; the statement keeps its natural order.
pub fn compile_order<R: ColumnResolver + ?Sized>(
    _order: &Order,
    _resolver: &R,
) -> Result<Vec<OrderByExpr>, FilterError> {
    Ok(Vec::new())
}

/// No projection is emitted yet; an empty column list selects `*`.
pub fn compile_select<R: ColumnResolver + ?Sized>(
    _select: &Select,
    _resolver: &R,
) -> Result<Vec<Expr>, FilterError> {
    Ok(Vec::new())
}

/// The SQL pieces of a whole [`QueryFilters`] envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFilters {
    pub where_clause: Expr,
    pub order_by: Vec<OrderByExpr>,
    pub columns: Vec<Expr>,
}

pub fn compile_filters<R: ColumnResolver + ?Sized>(
    filters: &QueryFilters,
    resolver: &R,
) -> Result<SqlFilters, FilterError> {
    let where_clause = compile_where(filters.where_clause.as_ref(), resolver)?;
    let order_by = match &filters.order {
        Some(order) => compile_order(order, resolver)?,
        None => Vec::new(),
    };
    let columns = match &filters.select {
        Some(select) => compile_select(select, resolver)?,
        None => Vec::new(),
    };

    Ok(SqlFilters {
        where_clause,
        order_by,
        columns,
    })
}

/// [`FilterBackend`] over a column resolver.
pub struct SqlBackend<R> {
    resolver: R,
}

impl<R: ColumnResolver> SqlBackend<R> {
    pub fn new(resolver: R) -> Self {
        SqlBackend { resolver }
    }
}

impl<R: ColumnResolver> FilterBackend for SqlBackend<R> {
    type Where = Expr;
    type Order = Vec<OrderByExpr>;
    type Select = Vec<Expr>;

    fn compile_where(&self, where_clause: Option<&Where>) -> Result<Expr, FilterError> {
        compile_where(where_clause, &self.resolver)
    }
}
