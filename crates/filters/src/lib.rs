//! Compiles backend-neutral [`QueryFilters`](model::filters::QueryFilters)
//! into the native condition form of each supported backend:
//!
//! - [`sql`]: a planner [`Expr`](planner::query::ast::expr::Expr) tree,
//! - [`object`]: a nested ORM-style `where` object,
//! - [`rest`]: PostgREST predicate strings applied through a [`rest::FilterBuilder`].

pub mod backend;
pub mod error;
pub mod object;
pub mod operator;
pub mod rest;
pub mod sql;
pub mod where_clause;

pub use backend::FilterBackend;
pub use error::FilterError;
