//! Typestate builder for [`Select`]: projection, then table, then the
//! optional clauses.

use crate::query::ast::{
    common::{OrderDir, TableRef},
    expr::Expr,
    select::{FromClause, OrderByExpr, Select},
};

#[derive(Debug, Default, Clone)]
pub struct InitialState;

#[derive(Debug, Default, Clone)]
pub struct SelectState;

#[derive(Debug, Default, Clone)]
pub struct FromState;

#[derive(Debug, Clone)]
pub struct SelectBuilder<State> {
    ast: Select,
    #[allow(dead_code)]
    state: State,
}

impl<S> SelectBuilder<S> {
    fn advance<N>(self, state: N) -> SelectBuilder<N> {
        SelectBuilder {
            ast: self.ast,
            state,
        }
    }
}

impl Default for SelectBuilder<InitialState> {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectBuilder<InitialState> {
    pub fn new() -> Self {
        Self {
            ast: Select::default(),
            state: InitialState,
        }
    }

    /// An empty projection selects `*`.
    pub fn select(mut self, columns: Vec<Expr>) -> SelectBuilder<SelectState> {
        self.ast.columns = columns;
        self.advance(SelectState)
    }
}

impl SelectBuilder<SelectState> {
    pub fn from(mut self, table: TableRef, alias: Option<&str>) -> SelectBuilder<FromState> {
        self.ast.from = Some(FromClause {
            table,
            alias: alias.map(String::from),
        });
        self.advance(FromState)
    }
}

impl SelectBuilder<FromState> {
    pub fn where_clause(mut self, condition: Expr) -> Self {
        self.ast.where_clause = Some(condition);
        self
    }

    pub fn order_by(mut self, expr: Expr, direction: Option<OrderDir>) -> Self {
        self.ast.order_by.push(OrderByExpr { expr, direction });
        self
    }

    /// Appends compiled sort directives in order.
    pub fn order_by_all(mut self, order_by: Vec<OrderByExpr>) -> Self {
        self.ast.order_by.extend(order_by);
        self
    }

    pub fn limit(mut self, limit: Expr) -> Self {
        self.ast.limit = Some(limit);
        self
    }

    pub fn build(self) -> Select {
        self.ast
    }
}
