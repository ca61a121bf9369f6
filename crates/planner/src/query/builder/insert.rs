//! Provides a fluent builder for constructing `Insert` ASTs.

use crate::query::ast::{common::TableRef, expr::Expr, insert::Insert};

#[derive(Debug, Clone)]
pub struct InsertBuilder {
    ast: Insert,
}

impl InsertBuilder {
    pub fn new(table: TableRef) -> Self {
        Self {
            ast: Insert {
                table,
                ..Default::default()
            },
        }
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.ast.columns = columns.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Adds a row of values to the insert statement.
    /// This can be called multiple times for a batch insert.
    pub fn values(mut self, values: Vec<Expr>) -> Self {
        self.ast.values.push(values);
        self
    }

    /// Adds a `RETURNING` clause; an empty list returns every column.
    pub fn returning(mut self, columns: Vec<Expr>) -> Self {
        self.ast.returning = Some(columns);
        self
    }

    pub fn build(self) -> Insert {
        self.ast
    }
}
