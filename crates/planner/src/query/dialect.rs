//! Defines the `Dialect` trait for database-specific SQL syntax.

pub trait Dialect: Send + Sync {
    /// Wraps an identifier (like a table or column name) in the correct
    /// quotation marks for the dialect.
    ///
    /// - PostgreSQL uses double quotes: `"my_column"`
    /// - MySQL uses backticks: `` `my_column` ``
    fn quote_identifier(&self, ident: &str) -> String;

    /// Returns the placeholder for a parameterized query.
    ///
    /// - PostgreSQL uses `$1`, `$2`, etc.
    /// - MySQL uses `?`
    fn get_placeholder(&self, index: usize) -> String;

    /// Keyword for a case-insensitive pattern match.
    ///
    /// MySQL's `LIKE` already follows the column collation, so it has no
    /// separate `ILIKE`.
    fn ilike_operator(&self) -> &'static str;

    /// Whether `INSERT`/`UPDATE`/`DELETE` accept a `RETURNING` clause.
    fn supports_returning(&self) -> bool;

    /// Returns the name of the dialect (e.g., "PostgreSQL", "MySQL").
    fn name(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct Postgres;

impl Dialect for Postgres {
    fn quote_identifier(&self, ident: &str) -> String {
        format!(r#""{}""#, ident.replace('"', "\"\""))
    }

    fn get_placeholder(&self, index: usize) -> String {
        // PostgreSQL uses $1, $2, etc.
        format!("${}", index + 1)
    }

    fn ilike_operator(&self) -> &'static str {
        "ILIKE"
    }

    fn supports_returning(&self) -> bool {
        true
    }

    fn name(&self) -> String {
        "PostgreSQL".into()
    }
}

#[derive(Debug, Clone)]
pub struct MySql;

impl Dialect for MySql {
    fn quote_identifier(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }

    fn get_placeholder(&self, _index: usize) -> String {
        // MySQL uses ?
        "?".into()
    }

    fn ilike_operator(&self) -> &'static str {
        "LIKE"
    }

    fn supports_returning(&self) -> bool {
        false
    }

    fn name(&self) -> String {
        "MySQL".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier_escapes_quotes() {
        assert_eq!(Postgres.quote_identifier("user"), r#""user""#);
        assert_eq!(Postgres.quote_identifier(r#"we"ird"#), r#""we""ird""#);
        assert_eq!(MySql.quote_identifier("a`b"), "`a``b`");
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(Postgres.get_placeholder(0), "$1");
        assert_eq!(Postgres.get_placeholder(4), "$5");
        assert_eq!(MySql.get_placeholder(4), "?");
    }
}
