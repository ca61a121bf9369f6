//! Backend-neutral description of a query: predicates, grouping, sort order
//! and projection.

use thiserror::Error;

pub mod operator;
pub mod order;
pub(crate) mod ordered;
pub mod predicate;
pub mod query;
pub mod select;
pub mod where_clause;

pub use operator::Operator;
pub use order::{Order, OrderDirection};
pub use predicate::Predicate;
pub use query::QueryFilters;
pub use select::{FieldSubset, Select, SelectField};
pub use where_clause::{Clause, ONE_OF_KEY, Where};

#[derive(Debug, Error)]
pub enum FilterParseError {
    #[error("Unknown filter operator: {0}")]
    UnknownOperator(String),

    #[error("Invalid filter JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parses a [`QueryFilters`] envelope from its JSON form.
pub fn parse_filters(source: &str) -> Result<QueryFilters, FilterParseError> {
    Ok(serde_json::from_str(source)?)
}
