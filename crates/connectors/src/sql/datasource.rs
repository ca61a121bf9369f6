//! [`Datasource`] over any [`SqlExecutor`].

use super::{executor::SqlExecutor, generator::QueryGenerator};
use crate::{
    datasource::{Datasource, Entity, Record, decode, encode},
    error::DatasourceError,
};
use async_trait::async_trait;
use filters::sql::{self, ColumnMap, SqlFilters};
use model::{core::value::Value, filters::QueryFilters};
use planner::query::ast::common::TableRef;
use std::{marker::PhantomData, sync::Arc};
use tracing::debug;

/// A table behind a SQL executor. Entity fields map to columns of the same
/// name unless a [`ColumnMap`] is attached, in which case only declared
/// fields may be filtered on or written.
pub struct SqlDatasource<E> {
    executor: Arc<dyn SqlExecutor>,
    table: TableRef,
    columns: Option<ColumnMap>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> SqlDatasource<E> {
    pub fn new(executor: Arc<dyn SqlExecutor>, table: &str) -> Self {
        Self {
            executor,
            table: TableRef {
                schema: None,
                name: table.to_string(),
            },
            columns: None,
            _entity: PhantomData,
        }
    }

    pub fn with_schema(mut self, schema: &str) -> Self {
        self.table.schema = Some(schema.to_string());
        self
    }

    pub fn with_columns(mut self, columns: ColumnMap) -> Self {
        self.columns = Some(columns);
        self
    }

    fn compile(&self, filters: &QueryFilters) -> Result<SqlFilters, DatasourceError> {
        let compiled = match &self.columns {
            Some(columns) => sql::compile_filters(filters, columns)?,
            None => sql::compile_filters(filters, &sql::column)?,
        };
        Ok(compiled)
    }

    /// Column/value pairs of a write payload.
    fn row<T: serde::Serialize>(&self, payload: &T) -> Result<Vec<(String, Value)>, DatasourceError> {
        encode(payload)?
            .into_iter()
            .map(|(field, value)| -> Result<(String, Value), DatasourceError> {
                let column = match &self.columns {
                    Some(columns) => columns
                        .column_name(&field)
                        .ok_or_else(|| filters::FilterError::UnknownField(field.clone()))?
                        .to_string(),
                    None => field,
                };
                Ok((column, Value::from(value)))
            })
            .collect()
    }

    fn entity(&self, record: Record) -> Result<E, DatasourceError> {
        let record = match &self.columns {
            Some(columns) => record
                .into_iter()
                .map(|(column, value)| {
                    let field = columns.field_name(&column).unwrap_or(&column).to_string();
                    (field, value)
                })
                .collect(),
            None => record,
        };
        decode(record)
    }

    fn first(&self, records: Vec<Record>) -> Result<E, DatasourceError> {
        match records.into_iter().next() {
            Some(record) => self.entity(record),
            None => Err(DatasourceError::NotFound {
                table: self.table.name.clone(),
            }),
        }
    }

    fn require_returning(&self) -> Result<(), DatasourceError> {
        let dialect = self.executor.dialect();
        if dialect.supports_returning() {
            Ok(())
        } else {
            Err(DatasourceError::ReturningUnsupported(dialect.name()))
        }
    }
}

impl<E> Clone for SqlDatasource<E> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            table: self.table.clone(),
            columns: self.columns.clone(),
            _entity: PhantomData,
        }
    }
}

#[async_trait]
impl<E: Entity> Datasource<E> for SqlDatasource<E> {
    type Transaction = Arc<dyn SqlExecutor>;

    async fn store(&self, data: &E::Insert) -> Result<E, DatasourceError> {
        self.require_returning()?;
        let row = self.row(data)?;
        let (sql, params) = QueryGenerator::new(self.executor.dialect()).insert(&self.table, row);
        debug!(table = %self.table.name, %sql, "Storing row");

        let records = self.executor.query(&sql, params).await?;
        self.first(records)
    }

    async fn lookup(&self, filters: &QueryFilters) -> Result<E, DatasourceError> {
        let compiled = self.compile(filters)?;
        let (sql, params) =
            QueryGenerator::new(self.executor.dialect()).select(&self.table, compiled, Some(1));
        debug!(table = %self.table.name, %sql, "Looking up row");

        let records = self.executor.query(&sql, params).await?;
        self.first(records)
    }

    async fn list(&self, filters: &QueryFilters) -> Result<Vec<E>, DatasourceError> {
        let compiled = self.compile(filters)?;
        let (sql, params) =
            QueryGenerator::new(self.executor.dialect()).select(&self.table, compiled, None);
        debug!(table = %self.table.name, %sql, "Listing rows");

        self.executor
            .query(&sql, params)
            .await?
            .into_iter()
            .map(|record| self.entity(record))
            .collect()
    }

    async fn modify(&self, filters: &QueryFilters, patch: &E::Patch) -> Result<E, DatasourceError> {
        self.require_returning()?;
        let assignments = self.row(patch)?;
        if assignments.is_empty() {
            return Err(DatasourceError::InvalidPayload(
                "patch sets no columns".to_string(),
            ));
        }
        let compiled = self.compile(filters)?;
        let (sql, params) = QueryGenerator::new(self.executor.dialect()).update(
            &self.table,
            assignments,
            compiled.where_clause,
        );
        debug!(table = %self.table.name, %sql, "Modifying rows");

        let records = self.executor.query(&sql, params).await?;
        self.first(records)
    }

    async fn destroy(&self, filters: &QueryFilters) -> Result<(), DatasourceError> {
        let compiled = self.compile(filters)?;
        let (sql, params) =
            QueryGenerator::new(self.executor.dialect()).delete(&self.table, compiled.where_clause);
        let affected = self.executor.execute(&sql, params).await?;
        debug!(table = %self.table.name, affected, "Destroyed rows");
        Ok(())
    }

    fn with_transaction(&self, transaction: Arc<dyn SqlExecutor>) -> Result<Self, DatasourceError> {
        Ok(Self {
            executor: transaction,
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::filters::{Predicate, Where};
    use planner::query::dialect::{Dialect, MySql, Postgres};
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::sync::Mutex;
    use tracing_test::traced_test;

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        id: i64,
        name: String,
        #[serde(rename = "createdAt", default)]
        created_at: Option<String>,
    }

    #[derive(Serialize)]
    struct NewUser {
        name: String,
    }

    #[derive(Serialize)]
    struct UserPatch {
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    }

    impl Entity for User {
        type Insert = NewUser;
        type Patch = UserPatch;
    }

    /// Records every statement and answers queries from a queue.
    struct MockExecutor {
        dialect: Box<dyn Dialect>,
        calls: Mutex<Vec<(String, Vec<Value>)>>,
        responses: Mutex<Vec<Vec<Record>>>,
    }

    impl MockExecutor {
        fn new(responses: Vec<Vec<Record>>) -> Arc<Self> {
            Self::with_dialect(Box::new(Postgres), responses)
        }

        fn with_dialect(dialect: Box<dyn Dialect>, responses: Vec<Vec<Record>>) -> Arc<Self> {
            Arc::new(Self {
                dialect,
                calls: Mutex::new(Vec::new()),
                responses: Mutex::new(responses),
            })
        }

        fn calls(&self) -> Vec<(String, Vec<Value>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SqlExecutor for MockExecutor {
        async fn query(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Record>, DatasourceError> {
            self.calls.lock().unwrap().push((sql.to_string(), params));
            let mut responses = self.responses.lock().unwrap();
            Ok(if responses.is_empty() {
                Vec::new()
            } else {
                responses.remove(0)
            })
        }

        async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<u64, DatasourceError> {
            self.calls.lock().unwrap().push((sql.to_string(), params));
            Ok(1)
        }

        fn dialect(&self) -> &dyn Dialect {
            self.dialect.as_ref()
        }
    }

    fn record(value: serde_json::Value) -> Record {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[traced_test]
    #[tokio::test]
    async fn test_store_returns_written_row() {
        let executor = MockExecutor::new(vec![vec![record(json!({"id": 1, "name": "Ann"}))]]);
        let users = SqlDatasource::<User>::new(executor.clone(), "users");

        let user = users.store(&NewUser { name: "Ann".into() }).await.unwrap();

        assert_eq!(user.id, 1);
        assert_eq!(
            executor.calls(),
            vec![(
                r#"INSERT INTO "users" ("name") VALUES ($1) RETURNING *;"#.to_string(),
                vec![Value::String("Ann".into())]
            )]
        );
    }

    #[traced_test]
    #[tokio::test]
    async fn test_lookup_compiles_filters() {
        let executor = MockExecutor::new(vec![vec![record(json!({"id": 2, "name": "Bob"}))]]);
        let users = SqlDatasource::<User>::new(executor.clone(), "users").with_schema("app");

        let filters = QueryFilters::from(
            Where::new()
                .field("name", Predicate::new().starts_with("B"))
                .one_of(vec![
                    Where::new().field("id", Predicate::new().in_list(vec![1, 2])),
                    Where::new().field("id", Predicate::new().gt(10)),
                ]),
        );
        let user = users.lookup(&filters).await.unwrap();

        assert_eq!(user.name, "Bob");
        let (sql, params) = &executor.calls()[0];
        assert_eq!(
            sql,
            r#"SELECT * FROM "app"."users" WHERE (("name" ILIKE $1) AND (("id" IN ($2, $3)) OR ("id" > $4))) LIMIT $5"#
        );
        assert_eq!(
            params,
            &vec![
                Value::String("B%".into()),
                Value::Int(1),
                Value::Int(2),
                Value::Int(10),
                Value::Int(1)
            ]
        );
    }

    #[traced_test]
    #[tokio::test]
    async fn test_lookup_without_rows_is_not_found() {
        let executor = MockExecutor::new(vec![]);
        let users = SqlDatasource::<User>::new(executor, "users");

        let err = users.lookup(&QueryFilters::new()).await.unwrap_err();
        assert!(matches!(err, DatasourceError::NotFound { table } if table == "users"));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_column_map_renames_fields_both_ways() {
        let executor = MockExecutor::new(vec![vec![record(
            json!({"user_id": 4, "full_name": "Dee", "created_at": "2024-05-01"}),
        )]]);
        let columns = ColumnMap::from_pairs([
            ("id", "user_id"),
            ("name", "full_name"),
            ("createdAt", "created_at"),
        ]);
        let users = SqlDatasource::<User>::new(executor.clone(), "users").with_columns(columns);

        let filters = QueryFilters::from(Where::new().field("id", Predicate::new().is(4)));
        let listed = users.list(&filters).await.unwrap();

        assert_eq!(
            listed,
            vec![User {
                id: 4,
                name: "Dee".into(),
                created_at: Some("2024-05-01".into())
            }]
        );
        assert_eq!(
            executor.calls()[0].0,
            r#"SELECT * FROM "users" WHERE ("user_id" = $1)"#
        );

        let unknown = QueryFilters::from(Where::new().field("password", Predicate::new().is("x")));
        let err = users.list(&unknown).await.unwrap_err();
        assert!(matches!(
            err,
            DatasourceError::Filter(filters::FilterError::UnknownField(field)) if field == "password"
        ));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_modify_and_destroy() {
        let executor = MockExecutor::new(vec![vec![record(json!({"id": 5, "name": "Eve"}))]]);
        let users = SqlDatasource::<User>::new(executor.clone(), "users");
        let by_id = QueryFilters::from(Where::new().field("id", Predicate::new().is(5)));

        let user = users
            .modify(&by_id, &UserPatch { name: Some("Eve".into()) })
            .await
            .unwrap();
        assert_eq!(user.name, "Eve");

        let err = users.modify(&by_id, &UserPatch { name: None }).await.unwrap_err();
        assert!(matches!(err, DatasourceError::InvalidPayload(_)));

        users.destroy(&by_id).await.unwrap();

        let calls = executor.calls();
        assert_eq!(
            calls[0].0,
            r#"UPDATE "users" SET "name" = $1 WHERE ("id" = $2) RETURNING *;"#
        );
        assert_eq!(calls[1].0, r#"DELETE FROM "users" WHERE ("id" = $1);"#);
        assert_eq!(calls[1].1, vec![Value::Int(5)]);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_with_transaction_swaps_executor() {
        let outer = MockExecutor::new(vec![]);
        let inner = MockExecutor::new(vec![]);
        let users = SqlDatasource::<User>::new(outer.clone(), "users");

        let scoped = users.with_transaction(inner.clone()).unwrap();
        scoped.list(&QueryFilters::new()).await.unwrap();

        assert!(outer.calls().is_empty());
        assert_eq!(inner.calls().len(), 1);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_writes_need_returning() {
        let executor = MockExecutor::with_dialect(Box::new(MySql), vec![]);
        let users = SqlDatasource::<User>::new(executor.clone(), "users");

        let err = users.store(&NewUser { name: "x".into() }).await.unwrap_err();
        assert!(matches!(err, DatasourceError::ReturningUnsupported(_)));
        assert!(executor.calls().is_empty());
    }
}
