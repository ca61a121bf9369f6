use crate::query::{ast::insert::Insert, renderer::Render};

impl Render for Insert {
    fn render(&self, r: &mut super::Renderer) {
        // 1. INSERT INTO table (...)
        r.sql.push_str("INSERT INTO ");
        r.render_table_ref(&self.table);
        r.sql.push_str(" (");
        let quoted_columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| r.dialect.quote_identifier(c))
            .collect();
        r.sql.push_str(&quoted_columns.join(", "));
        r.sql.push(')');

        // 2. VALUES (...)
        render_values(self, r);

        // 3. RETURNING
        r.render_returning(self.returning.as_deref());
        r.sql.push(';');
    }
}

fn render_values(insert: &Insert, r: &mut super::Renderer) {
    r.sql.push_str(" VALUES ");
    for (i, row) in insert.values.iter().enumerate() {
        if i > 0 {
            r.sql.push_str(", ");
        }
        r.sql.push('(');
        for (j, val) in row.iter().enumerate() {
            if j > 0 {
                r.sql.push_str(", ");
            }
            val.render(r);
        }
        r.sql.push(')');
    }
}

#[cfg(test)]
mod tests {
    use model::core::value::Value;

    use crate::{
        query::{
            ast::insert::Insert,
            dialect::{MySql, Postgres},
            renderer::{Render, Renderer},
        },
        table_ref, value,
    };

    fn users_insert() -> Insert {
        Insert {
            table: table_ref!("users"),
            columns: vec!["name".to_string(), "is_active".to_string()],
            values: vec![
                vec![value!("Alice"), value!(true)],
                vec![value!("Bob"), value!(false)],
            ],
            returning: None,
        }
    }

    #[test]
    fn test_render_batch_insert_postgres() {
        let dialect = Postgres;
        let mut renderer = Renderer::new(&dialect);
        users_insert().render(&mut renderer);
        let (sql, params) = renderer.finish();

        let expected_sql =
            r#"INSERT INTO "users" ("name", "is_active") VALUES ($1, $2), ($3, $4);"#;
        assert_eq!(sql, expected_sql);
        assert_eq!(
            params,
            vec![
                Value::String("Alice".to_string()),
                Value::Boolean(true),
                Value::String("Bob".to_string()),
                Value::Boolean(false)
            ]
        );
    }

    #[test]
    fn test_render_insert_returning() {
        let mut ast = users_insert();
        ast.values.truncate(1);
        ast.returning = Some(vec![]);

        let dialect = Postgres;
        let mut renderer = Renderer::new(&dialect);
        ast.render(&mut renderer);
        assert_eq!(
            renderer.finish().0,
            r#"INSERT INTO "users" ("name", "is_active") VALUES ($1, $2) RETURNING *;"#
        );
    }

    #[test]
    fn test_mysql_skips_returning() {
        let mut ast = users_insert();
        ast.returning = Some(vec![]);

        let dialect = MySql;
        let mut renderer = Renderer::new(&dialect);
        ast.render(&mut renderer);
        assert_eq!(
            renderer.finish().0,
            "INSERT INTO `users` (`name`, `is_active`) VALUES (?, ?), (?, ?);"
        );
    }
}
