use crate::query::{
    ast::expr::{BinaryOp, BinaryOperator, Expr, Ident},
    renderer::{Render, Renderer},
};

impl Render for Expr {
    fn render(&self, r: &mut Renderer) {
        match self {
            Expr::Identifier(ident) => ident.render(r),
            Expr::Value(val) => r.add_param(val.clone()),
            Expr::Literal(lit) => r.sql.push_str(lit),
            Expr::BinaryOp(op) => op.render(r),
            Expr::InList {
                expr,
                list,
                negated,
            } => render_in_list(expr, list, *negated, r),
            Expr::IsNull { expr, negated } => {
                r.sql.push('(');
                expr.render(r);
                r.sql
                    .push_str(if *negated { " IS NOT NULL)" } else { " IS NULL)" });
            }
        }
    }
}

fn render_in_list(expr: &Expr, list: &[Expr], negated: bool, r: &mut Renderer) {
    // `x IN ()` is not valid SQL; nothing is in an empty set.
    if list.is_empty() {
        r.sql.push_str(if negated { "TRUE" } else { "FALSE" });
        return;
    }

    r.sql.push('(');
    expr.render(r);
    r.sql.push_str(if negated { " NOT IN (" } else { " IN (" });
    for (i, item) in list.iter().enumerate() {
        if i > 0 {
            r.sql.push_str(", ");
        }
        item.render(r);
    }
    r.sql.push_str("))");
}

impl Render for Ident {
    fn render(&self, r: &mut Renderer) {
        if let Some(qualifier) = &self.qualifier {
            r.sql.push_str(&r.dialect.quote_identifier(qualifier));
            r.sql.push('.');
        }
        r.sql.push_str(&r.dialect.quote_identifier(&self.name));
    }
}

impl Render for BinaryOp {
    fn render(&self, r: &mut Renderer) {
        r.sql.push('(');
        self.left.render(r);

        match self.op {
            BinaryOperator::Eq => r.sql.push_str(" = "),
            BinaryOperator::NotEq => r.sql.push_str(" <> "),
            BinaryOperator::Lt => r.sql.push_str(" < "),
            BinaryOperator::LtEq => r.sql.push_str(" <= "),
            BinaryOperator::Gt => r.sql.push_str(" > "),
            BinaryOperator::GtEq => r.sql.push_str(" >= "),
            BinaryOperator::ILike => {
                let keyword = r.dialect.ilike_operator();
                r.sql.push(' ');
                r.sql.push_str(keyword);
                r.sql.push(' ');
            }
            BinaryOperator::And => r.sql.push_str(" AND "),
            BinaryOperator::Or => r.sql.push_str(" OR "),
        }

        self.right.render(r);
        r.sql.push(')');
    }
}
