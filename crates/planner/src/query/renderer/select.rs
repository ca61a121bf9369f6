use crate::query::{
    ast::{
        common::OrderDir,
        select::{FromClause, OrderByExpr, Select},
    },
    renderer::{Render, Renderer},
};

impl Render for Select {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("SELECT ");
        r.render_projection(&self.columns);

        if let Some(from) = &self.from {
            r.sql.push(' ');
            from.render(r);
        }
        if let Some(condition) = &self.where_clause {
            r.sql.push_str(" WHERE ");
            condition.render(r);
        }
        for (i, order) in self.order_by.iter().enumerate() {
            r.sql.push_str(if i == 0 { " ORDER BY " } else { ", " });
            order.render(r);
        }
        if let Some(limit) = &self.limit {
            r.sql.push_str(" LIMIT ");
            limit.render(r);
        }
    }
}

impl Render for FromClause {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("FROM ");
        r.render_table_ref(&self.table);
        if let Some(alias) = &self.alias {
            let alias = r.dialect.quote_identifier(alias);
            r.sql.push_str(" AS ");
            r.sql.push_str(&alias);
        }
    }
}

impl Render for OrderByExpr {
    fn render(&self, r: &mut Renderer) {
        self.expr.render(r);
        match self.direction {
            Some(OrderDir::Asc) => r.sql.push_str(" ASC"),
            Some(OrderDir::Desc) => r.sql.push_str(" DESC"),
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use model::core::value::Value;

    use crate::{
        ident,
        query::{
            ast::{
                common::{OrderDir, TableRef},
                expr::{BinaryOp, BinaryOperator, Expr},
                select::{FromClause, OrderByExpr, Select},
            },
            dialect::{MySql, Postgres},
            renderer::{Render, Renderer},
        },
        table_ref, value,
    };

    #[test]
    fn test_simple_select_postgres() {
        let ast = Select {
            columns: vec![ident!("id"), ident!("name")],
            from: Some(FromClause {
                table: table_ref!("users"),
                alias: None,
            }),
            where_clause: Some(Expr::BinaryOp(Box::new(BinaryOp {
                left: ident!("id"),
                op: BinaryOperator::Eq,
                right: value!(123),
            }))),
            ..Default::default()
        };

        let dialect = Postgres;
        let mut renderer = Renderer::new(&dialect);
        ast.render(&mut renderer);
        let (sql, params) = renderer.finish();

        assert_eq!(sql, r#"SELECT "id", "name" FROM "users" WHERE ("id" = $1)"#);
        assert_eq!(params, vec![Value::Int(123)]);
    }

    #[test]
    fn test_select_star_mysql() {
        let ast = Select {
            from: Some(FromClause {
                table: TableRef {
                    schema: Some("app".to_string()),
                    name: "users".to_string(),
                },
                alias: None,
            }),
            where_clause: Some(Expr::binary(
                ident!("name"),
                BinaryOperator::Eq,
                value!("abc"),
            )),
            limit: Some(value!(1)),
            ..Default::default()
        };

        let dialect = MySql;
        let mut renderer = Renderer::new(&dialect);
        ast.render(&mut renderer);
        let (sql, params) = renderer.finish();

        assert_eq!(
            sql,
            "SELECT * FROM `app`.`users` WHERE (`name` = ?) LIMIT ?"
        );
        assert_eq!(params, vec![Value::String("abc".to_string()), Value::Int(1)]);
    }

    #[test]
    fn test_select_with_alias_and_ordering() {
        let ast = Select {
            columns: vec![ident!("u", "id")],
            from: Some(FromClause {
                table: table_ref!("users"),
                alias: Some("u".to_string()),
            }),
            where_clause: Some(Expr::Literal("TRUE".to_string())),
            order_by: vec![OrderByExpr {
                expr: ident!("u", "created_at"),
                direction: Some(OrderDir::Desc),
            }],
            limit: Some(value!(10)),
        };

        let dialect = Postgres;
        let mut renderer = Renderer::new(&dialect);
        ast.render(&mut renderer);
        let (sql, params) = renderer.finish();

        let expected_sql = r#"SELECT "u"."id" FROM "users" AS "u" WHERE TRUE ORDER BY "u"."created_at" DESC LIMIT $1"#;
        assert_eq!(sql, expected_sql);
        assert_eq!(params, vec![Value::Int(10)]);
    }
}
