use crate::query::ast::{
    common::TableRef,
    expr::Expr,
    update::{Assignment, Update},
};

#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    ast: Update,
}

impl UpdateBuilder {
    pub fn new(table: TableRef) -> Self {
        Self {
            ast: Update {
                table,
                ..Default::default()
            },
        }
    }

    pub fn set(mut self, column: &str, value: Expr) -> Self {
        self.ast.assignments.push(Assignment {
            column: column.to_string(),
            value,
        });
        self
    }

    pub fn where_clause(mut self, condition: Expr) -> Self {
        self.ast.where_clause = Some(condition);
        self
    }

    pub fn returning(mut self, columns: Vec<Expr>) -> Self {
        self.ast.returning = Some(columns);
        self
    }

    pub fn build(self) -> Update {
        self.ast
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        ident,
        query::{ast::expr::Expr, builder::update::UpdateBuilder},
        table_ref, value,
    };

    #[test]
    fn test_build_update() {
        let ast = UpdateBuilder::new(table_ref!("users"))
            .set("name", value!("Dana"))
            .where_clause(ident!("id").in_list(vec![value!(1), value!(2)], false))
            .returning(vec![])
            .build();

        assert_eq!(ast.assignments.len(), 1);
        assert_eq!(ast.assignments[0].column, "name");
        assert!(matches!(ast.where_clause, Some(Expr::InList { .. })));
    }
}
