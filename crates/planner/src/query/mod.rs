use crate::query::ast::expr::{Expr, Ident};

pub mod ast;
pub mod builder;
pub mod dialect;
pub mod macros;
pub mod renderer;

/// An unqualified column reference.
pub fn ident(name: &str) -> Expr {
    Expr::Identifier(Ident {
        qualifier: None,
        name: name.to_string(),
    })
}
