use filters::FilterError;
use thiserror::Error;

/// Errors surfaced by datasource operations.
#[derive(Debug, Error)]
pub enum DatasourceError {
    /// The backend has no transaction support.
    #[error("{0} does not support transactions")]
    TransactionsUnsupported(&'static str),

    /// A single-row operation matched no row.
    #[error("No row found in `{table}`")]
    NotFound { table: String },

    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    /// The entity payload could not be turned into columns.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// The SQL dialect cannot hand back written rows.
    #[error("{0} does not support RETURNING")]
    ReturningUnsupported(String),

    #[error("Failed to decode record: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Postgres(#[from] tokio_postgres::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The REST endpoint answered with an error status; `message` is the
    /// response body as sent.
    #[error("REST request failed with status {status}: {message}")]
    Rest { status: u16, message: String },
}

/// Errors happening during connection setup.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Invalid connection URL: {0}")]
    InvalidUrl(String),

    #[error("TLS error: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("Postgres connection failed: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}
