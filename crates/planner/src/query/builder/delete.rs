use crate::query::ast::{common::TableRef, delete::Delete, expr::Expr};

#[derive(Debug, Clone)]
pub struct DeleteBuilder {
    ast: Delete,
}

impl DeleteBuilder {
    pub fn new(table: TableRef) -> Self {
        Self {
            ast: Delete {
                table,
                ..Default::default()
            },
        }
    }

    pub fn where_clause(mut self, condition: Expr) -> Self {
        self.ast.where_clause = Some(condition);
        self
    }

    pub fn returning(mut self, columns: Vec<Expr>) -> Self {
        self.ast.returning = Some(columns);
        self
    }

    pub fn build(self) -> Delete {
        self.ast
    }
}
