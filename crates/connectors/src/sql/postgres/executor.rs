use super::{params::PgParamStore, row::decode_row, utils::connect_client};
use crate::{
    config::PgConfig,
    datasource::{Record, Transactor},
    error::{ConnectorError, DatasourceError},
    sql::executor::SqlExecutor,
};
use async_trait::async_trait;
use model::core::value::Value;
use planner::query::dialect::{self, Dialect};
use std::{future::Future, sync::Arc};
use tokio::{
    runtime,
    sync::{OwnedRwLockWriteGuard, RwLock},
};
use tokio_postgres::{Client, Row};
use tracing::{debug, warn};

#[derive(Clone)]
enum PgClient {
    /// The shared connection; statements take a read lock.
    Shared(Arc<RwLock<Client>>),
    /// The connection held exclusively by an open transaction.
    Transaction(Arc<OwnedRwLockWriteGuard<Client>>),
}

#[derive(Clone)]
pub struct PgExecutor {
    client: PgClient,
    dialect: dialect::Postgres,
}

impl PgExecutor {
    pub async fn connect(url: &str) -> Result<Self, ConnectorError> {
        let client = Arc::new(RwLock::new(connect_client(url).await?));
        Ok(PgExecutor {
            client: PgClient::Shared(client),
            dialect: dialect::Postgres,
        })
    }

    pub async fn from_config(config: &PgConfig) -> Result<Self, ConnectorError> {
        Self::connect(&config.url).await
    }

    /// A transactor over the same connection. `None` when this executor
    /// already runs inside a transaction.
    pub fn transactor(&self) -> Option<PgTransactor> {
        match &self.client {
            PgClient::Shared(client) => Some(PgTransactor {
                client: Arc::clone(client),
            }),
            PgClient::Transaction(_) => None,
        }
    }

    async fn rows(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Row>, tokio_postgres::Error> {
        let bindings = PgParamStore::from_values(params);
        match &self.client {
            PgClient::Shared(client) => {
                let client = client.read().await;
                client.query(sql, &bindings.as_refs()).await
            }
            PgClient::Transaction(client) => client.query(sql, &bindings.as_refs()).await,
        }
    }
}

#[async_trait]
impl SqlExecutor for PgExecutor {
    async fn query(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Record>, DatasourceError> {
        let rows = self.rows(sql, params).await?;
        debug!(rows = rows.len(), "Query returned");
        Ok(rows.iter().map(decode_row).collect::<Result<Vec<_>, _>>()?)
    }

    async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<u64, DatasourceError> {
        let bindings = PgParamStore::from_values(params);
        let affected = match &self.client {
            PgClient::Shared(client) => {
                let client = client.read().await;
                client.execute(sql, &bindings.as_refs()).await?
            }
            PgClient::Transaction(client) => client.execute(sql, &bindings.as_refs()).await?,
        };
        Ok(affected)
    }

    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }
}

/// The statement channel of one connection.
#[async_trait]
trait Session: Send + Sync + 'static {
    async fn run(&self, statement: &str) -> Result<(), tokio_postgres::Error>;
}

#[async_trait]
impl Session for Client {
    async fn run(&self, statement: &str) -> Result<(), tokio_postgres::Error> {
        self.batch_execute(statement).await
    }
}

/// A transaction between `BEGIN` and its end. Dropping it before [`end`]
/// completes, as when the caller's future is cancelled, issues `ROLLBACK` on
/// a spawned task that holds the connection lock until the rollback is done.
///
/// [`end`]: OpenTransaction::end
struct OpenTransaction<S: Session> {
    session: Option<Arc<OwnedRwLockWriteGuard<S>>>,
}

impl<S: Session> OpenTransaction<S> {
    fn new(session: Arc<OwnedRwLockWriteGuard<S>>) -> Self {
        Self {
            session: Some(session),
        }
    }

    /// Runs `COMMIT` or `ROLLBACK`. The transaction stays armed until the
    /// statement returns.
    async fn end(mut self, statement: &str) -> Result<(), tokio_postgres::Error> {
        let result = match &self.session {
            Some(session) => session.run(statement).await,
            None => Ok(()),
        };
        self.session = None;
        result
    }
}

impl<S: Session> Drop for OpenTransaction<S> {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        match runtime::Handle::try_current() {
            Ok(handle) => {
                warn!("Transaction abandoned before it ended, rolling back");
                handle.spawn(async move {
                    if let Err(rollback) = session.run("ROLLBACK").await {
                        warn!(%rollback, "Rollback of abandoned transaction failed");
                    }
                });
            }
            Err(_) => warn!("Transaction abandoned outside a runtime, connection left open"),
        }
    }
}

/// Runs work inside `BEGIN`/`COMMIT` on a dedicated connection. The
/// connection is locked for the whole transaction, so statements issued
/// through other executors of the same connection wait until it ends.
pub struct PgTransactor {
    client: Arc<RwLock<Client>>,
}

impl PgTransactor {
    pub fn new(executor: &PgExecutor) -> Option<Self> {
        executor.transactor()
    }
}

#[async_trait]
impl Transactor for PgTransactor {
    type Handle = Arc<dyn SqlExecutor>;

    async fn transact<T, F, Fut>(&self, work: F) -> Result<T, DatasourceError>
    where
        T: Send,
        F: FnOnce(Self::Handle) -> Fut + Send,
        Fut: Future<Output = Result<T, DatasourceError>> + Send,
    {
        let guard = Arc::new(Arc::clone(&self.client).write_owned().await);
        guard.batch_execute("BEGIN").await?;
        let open = OpenTransaction::new(Arc::clone(&guard));
        debug!("Transaction started");

        let handle: Arc<dyn SqlExecutor> = Arc::new(PgExecutor {
            client: PgClient::Transaction(guard),
            dialect: dialect::Postgres,
        });

        match work(handle).await {
            Ok(value) => {
                open.end("COMMIT").await?;
                debug!("Transaction committed");
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = open.end("ROLLBACK").await {
                    warn!(%rollback, "Rollback failed");
                }
                debug!(%err, "Transaction rolled back");
                Err(err)
            }
        }
    }
}
