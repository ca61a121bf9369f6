//! Defines the AST for an UPDATE statement.

use crate::query::ast::{common::TableRef, expr::Expr};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    pub table: TableRef,
    pub assignments: Vec<Assignment>,
    pub where_clause: Option<Expr>,
    /// `RETURNING` projection; `Some(vec![])` renders `RETURNING *`.
    pub returning: Option<Vec<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub value: Expr,
}
