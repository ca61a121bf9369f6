//! [`Datasource`] over a PostgREST-style HTTP endpoint.

use crate::{
    config::RestConfig,
    datasource::{Datasource, Entity, Record, decode},
    error::{ConnectorError, DatasourceError},
};
use async_trait::async_trait;
use filters::rest::{FilterBuilder, RestQuery, apply_filters};
use model::filters::QueryFilters;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use std::marker::PhantomData;
use tracing::{debug, warn};

/// One table exposed at `{url}/{table}`. Requests carry the API key both as
/// `apikey` and as a bearer token, and ask for written rows back.
pub struct RestDatasource<E> {
    client: Client,
    config: RestConfig,
    table: String,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> RestDatasource<E> {
    pub fn new(config: RestConfig, table: &str) -> Result<Self, ConnectorError> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, config, table))
    }

    pub fn with_client(client: Client, config: RestConfig, table: &str) -> Self {
        Self {
            client,
            config,
            table: table.to_string(),
            _entity: PhantomData,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/{}", self.config.url.trim_end_matches('/'), self.table)
    }

    fn request(&self, method: Method, query: &RestQuery) -> RequestBuilder {
        let profile = if method == Method::GET {
            "Accept-Profile"
        } else {
            "Content-Profile"
        };

        let mut request = self
            .client
            .request(method, self.endpoint())
            .query(query.params())
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .header("Prefer", "return=representation");
        if let Some(schema) = &self.config.schema {
            request = request.header(profile, schema);
        }
        request
    }

    fn filtered(
        &self,
        method: Method,
        filters: &QueryFilters,
        limit: Option<usize>,
    ) -> Result<RequestBuilder, DatasourceError> {
        let mut query = apply_filters(RestQuery::new(), filters)?;
        if let Some(count) = limit {
            query = query.limit(count);
        }
        debug!(table = %self.table, %method, query = %query.to_query_string(), "REST request");
        Ok(self.request(method, &query))
    }

    fn with_body<T: Serialize>(request: RequestBuilder, body: &T) -> RequestBuilder {
        request.json(body)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Vec<Record>, DatasourceError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await?;
            warn!(table = %self.table, status = status.as_u16(), %message, "REST request failed");
            return Err(DatasourceError::Rest {
                status: status.as_u16(),
                message,
            });
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }

        Ok(response.json::<Vec<Record>>().await?)
    }

    fn first(&self, records: Vec<Record>) -> Result<E, DatasourceError> {
        match records.into_iter().next() {
            Some(record) => decode(record),
            None => Err(DatasourceError::NotFound {
                table: self.table.clone(),
            }),
        }
    }
}

#[async_trait]
impl<E: Entity> Datasource<E> for RestDatasource<E> {
    /// No transaction handle exists for this backend.
    type Transaction = ();

    async fn store(&self, data: &E::Insert) -> Result<E, DatasourceError> {
        let request = Self::with_body(self.request(Method::POST, &RestQuery::new()), data);
        let records = self.send(request).await?;
        self.first(records)
    }

    async fn lookup(&self, filters: &QueryFilters) -> Result<E, DatasourceError> {
        let request = self.filtered(Method::GET, filters, Some(1))?;
        let records = self.send(request).await?;
        self.first(records)
    }

    async fn list(&self, filters: &QueryFilters) -> Result<Vec<E>, DatasourceError> {
        let request = self.filtered(Method::GET, filters, None)?;
        self.send(request).await?.into_iter().map(decode).collect()
    }

    async fn modify(&self, filters: &QueryFilters, patch: &E::Patch) -> Result<E, DatasourceError> {
        let request = Self::with_body(self.filtered(Method::PATCH, filters, None)?, patch);
        let records = self.send(request).await?;
        self.first(records)
    }

    async fn destroy(&self, filters: &QueryFilters) -> Result<(), DatasourceError> {
        let request = self.filtered(Method::DELETE, filters, None)?;
        let deleted = self.send(request).await?;
        debug!(table = %self.table, deleted = deleted.len(), "Destroyed rows");
        Ok(())
    }

    fn with_transaction(&self, _transaction: ()) -> Result<Self, DatasourceError> {
        Err(DatasourceError::TransactionsUnsupported("REST datasource"))
    }
}
