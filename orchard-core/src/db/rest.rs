//! PostgREST-style adapter for the hosted database
//!
//! Tables map to `{base}/{table}` with filters rendered as query
//! parameters; procedures map to `{base}/rpc/{name}`. Writes ask for
//! `return=representation` so callers get the affected rows back.

use super::{Database, DbError, DbResult, Filter, Procedures};
use crate::config::Config;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde_json::Value;

/// HTTP client for the hosted database's REST endpoint
#[derive(Debug, Clone)]
pub struct RestDatabase {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestDatabase {
    /// Create a new adapter from configuration
    pub fn new(config: &Config) -> DbResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| DbError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.baas_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    /// Attach auth and representation headers to a request
    fn prepare(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header("Prefer", "return=representation")
    }

    /// Map the HTTP response to rows or a structured error
    async fn handle_response(response: reqwest::Response) -> DbResult<Vec<Value>> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return match status {
                StatusCode::NOT_FOUND => Err(DbError::NotFound(text)),
                StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                    Err(DbError::Query(text))
                }
                StatusCode::CONFLICT => Err(DbError::Rejected(text)),
                _ => Err(DbError::Transport(format!("{}: {}", status, text))),
            };
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(vec![]);
        }

        let body: Value = response.json().await?;
        match body {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(vec![]),
            single => Ok(vec![single]),
        }
    }
}

#[async_trait]
impl Database for RestDatabase {
    async fn select(&self, table: &str, filter: Filter) -> DbResult<Vec<Value>> {
        let request = self
            .prepare(self.client.get(self.table_url(table)))
            .query(&filter.to_query_pairs());
        Self::handle_response(request.send().await?).await
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> DbResult<Vec<Value>> {
        let request = self
            .prepare(self.client.post(self.table_url(table)))
            .json(&rows);
        Self::handle_response(request.send().await?).await
    }

    async fn update(&self, table: &str, patch: Value, filter: Filter) -> DbResult<Vec<Value>> {
        let request = self
            .prepare(self.client.patch(self.table_url(table)))
            .query(&filter.to_query_pairs())
            .json(&patch);
        Self::handle_response(request.send().await?).await
    }

    async fn delete(&self, table: &str, filter: Filter) -> DbResult<()> {
        let request = self
            .prepare(self.client.delete(self.table_url(table)))
            .query(&filter.to_query_pairs());
        Self::handle_response(request.send().await?).await?;
        Ok(())
    }
}

#[async_trait]
impl Procedures for RestDatabase {
    async fn invoke(&self, procedure: &str, params: Value) -> DbResult<Value> {
        let url = format!("{}/rpc/{}", self.base_url, procedure);
        let response = self.prepare(self.client.post(url)).json(&params).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(DbError::Procedure(format!("{}: {}", status, text)));
        }

        Ok(response.json().await?)
    }
}
