//! Renders CRUD statements for a single table.

use filters::sql::SqlFilters;
use model::core::value::Value;
use planner::query::{
    ast::{common::TableRef, expr::Expr},
    builder::{
        delete::DeleteBuilder, insert::InsertBuilder, select::SelectBuilder,
        update::UpdateBuilder,
    },
    dialect::Dialect,
    renderer::{Render, Renderer},
};

pub struct QueryGenerator<'a> {
    dialect: &'a dyn Dialect,
}

impl<'a> QueryGenerator<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self { dialect }
    }

    pub fn select(
        &self,
        table: &TableRef,
        filters: SqlFilters,
        limit: Option<i64>,
    ) -> (String, Vec<Value>) {
        let mut builder = SelectBuilder::new()
            .select(filters.columns)
            .from(table.clone(), None)
            .where_clause(filters.where_clause)
            .order_by_all(filters.order_by);

        if let Some(limit) = limit {
            builder = builder.limit(Expr::Value(Value::Int(limit)));
        }

        self.render_ast(builder.build())
    }

    /// `INSERT ... RETURNING *` of a single row.
    pub fn insert(&self, table: &TableRef, row: Vec<(String, Value)>) -> (String, Vec<Value>) {
        let (columns, values): (Vec<String>, Vec<Expr>) = row
            .into_iter()
            .map(|(column, value)| (column, Expr::Value(value)))
            .unzip();
        let columns = columns.iter().map(String::as_str).collect::<Vec<_>>();

        let ast = InsertBuilder::new(table.clone())
            .columns(&columns)
            .values(values)
            .returning(vec![])
            .build();
        self.render_ast(ast)
    }

    /// `UPDATE ... SET ... WHERE ... RETURNING *`.
    pub fn update(
        &self,
        table: &TableRef,
        assignments: Vec<(String, Value)>,
        where_clause: Expr,
    ) -> (String, Vec<Value>) {
        let ast = assignments
            .into_iter()
            .fold(UpdateBuilder::new(table.clone()), |builder, (column, value)| {
                builder.set(&column, Expr::Value(value))
            })
            .where_clause(where_clause)
            .returning(vec![])
            .build();
        self.render_ast(ast)
    }

    pub fn delete(&self, table: &TableRef, where_clause: Expr) -> (String, Vec<Value>) {
        let ast = DeleteBuilder::new(table.clone())
            .where_clause(where_clause)
            .build();
        self.render_ast(ast)
    }

    fn render_ast<T: Render>(&self, ast: T) -> (String, Vec<Value>) {
        let mut renderer = Renderer::new(self.dialect);
        ast.render(&mut renderer);
        renderer.finish()
    }
}
