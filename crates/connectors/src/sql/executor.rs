use crate::{datasource::Record, error::DatasourceError};
use async_trait::async_trait;
use model::core::value::Value;
use planner::query::dialect::Dialect;

/// Runs rendered statements against a SQL database.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Runs a statement that yields rows.
    async fn query(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Record>, DatasourceError>;

    /// Runs a statement and returns the number of affected rows.
    async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<u64, DatasourceError>;

    fn dialect(&self) -> &dyn Dialect;
}
