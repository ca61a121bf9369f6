use crate::query::{
    ast::delete::Delete,
    renderer::{Render, Renderer},
};

impl Render for Delete {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("DELETE FROM ");
        r.render_table_ref(&self.table);

        if let Some(where_clause) = &self.where_clause {
            r.sql.push_str(" WHERE ");
            where_clause.render(r);
        }

        r.render_returning(self.returning.as_deref());
        r.sql.push(';');
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        ident,
        query::{
            ast::delete::Delete,
            dialect::MySql,
            renderer::{Render, Renderer},
        },
        table_ref,
    };

    #[test]
    fn test_render_delete_mysql() {
        let ast = Delete {
            table: table_ref!("sessions"),
            where_clause: Some(ident!("expired").is_null(false)),
            returning: None,
        };

        let dialect = MySql;
        let mut renderer = Renderer::new(&dialect);
        ast.render(&mut renderer);
        let (sql, params) = renderer.finish();

        assert_eq!(sql, "DELETE FROM `sessions` WHERE (`expired` IS NULL);");
        assert!(params.is_empty());
    }
}
