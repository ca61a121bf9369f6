use crate::query::{
    ast::update::Update,
    renderer::{Render, Renderer},
};

impl Render for Update {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("UPDATE ");
        r.render_table_ref(&self.table);

        r.sql.push_str(" SET ");
        for (i, assignment) in self.assignments.iter().enumerate() {
            if i > 0 {
                r.sql.push_str(", ");
            }
            r.sql
                .push_str(&r.dialect.quote_identifier(&assignment.column));
            r.sql.push_str(" = ");
            assignment.value.render(r);
        }

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
    use model::core::value::Value;

    use crate::{
        ident,
        query::{
            ast::{
                expr::{BinaryOperator, Expr},
                update::{Assignment, Update},
            },
            dialect::Postgres,
            renderer::{Render, Renderer},
        },
        table_ref, value,
    };

    #[test]
    fn test_render_update_returning() {
        let ast = Update {
            table: table_ref!("public", "users"),
            assignments: vec![
                Assignment {
                    column: "name".to_string(),
                    value: value!("Carol"),
                },
                Assignment {
                    column: "age".to_string(),
                    value: value!(41),
                },
            ],
            where_clause: Some(Expr::binary(ident!("id"), BinaryOperator::Eq, value!(7))),
            returning: Some(vec![ident!("id")]),
        };

        let dialect = Postgres;
        let mut renderer = Renderer::new(&dialect);
        ast.render(&mut renderer);
        let (sql, params) = renderer.finish();

        assert_eq!(
            sql,
            r#"UPDATE "public"."users" SET "name" = $1, "age" = $2 WHERE ("id" = $3) RETURNING "id";"#
        );
        assert_eq!(
            params,
            vec![Value::String("Carol".into()), Value::Int(41), Value::Int(7)]
        );
    }
}
