//! Client for the hosted table and object-storage API.
//!
//! Tables follow PostgREST conventions under `/rest/v1`, objects live under
//! `/storage/v1/object`. Every request carries the service key both as
//! `apikey` and as a bearer token.

use crate::config::RemoteStoreConfig;
use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Clone)]
pub struct RemoteStore {
    base_url: String,
    service_key: String,
    client: Client,
}

/// Row filter, ordering and limit for a table request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    filters: Vec<(String, String)>,
    order: Option<String>,
    limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push((column.to_string(), format!("eq.{}", value.to_string())));
        self
    }

    /// Matches rows whose `column` is none of `values`. An empty list
    /// matches every row.
    pub fn not_in(mut self, column: &str, values: &[String]) -> Self {
        let filter = if values.is_empty() {
            "not.is.null".to_string()
        } else {
            let quoted: Vec<String> = values
                .iter()
                .map(|value| format!("\"{}\"", value.replace('"', "\\\"")))
                .collect();
            format!("not.in.({})", quoted.join(","))
        };
        self.filters.push((column.to_string(), filter));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.order = Some(format!("{column}.{direction}"));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = self.filters.clone();
        if let Some(order) = &self.order {
            pairs.push(("order".to_string(), order.clone()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }
}

impl RemoteStore {
    pub fn new(config: &RemoteStoreConfig, client: Client) -> Self {
        Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
            client,
        }
    }

    pub async fn select<T: DeserializeOwned>(&self, table: &str, query: &Query) -> Result<Vec<T>> {
        let mut pairs = vec![("select".to_string(), "*".to_string())];
        pairs.extend(query.to_pairs());
        let response = self
            .authorized(self.client.get(self.table_url(table)))
            .query(&pairs)
            .send()
            .await
            .with_context(|| format!("failed to select from {table}"))?;
        let response = check_status(response, table, "select").await?;
        response
            .json()
            .await
            .with_context(|| format!("failed to decode rows from {table}"))
    }

    pub async fn insert<T: Serialize>(&self, table: &str, rows: &[T]) -> Result<()> {
        let response = self
            .authorized(self.client.post(self.table_url(table)))
            .header("Prefer", "return=minimal")
            .json(rows)
            .send()
            .await
            .with_context(|| format!("failed to insert into {table}"))?;
        check_status(response, table, "insert").await?;
        Ok(())
    }

    /// Inserts `rows`, updating existing rows that collide on `on_conflict`.
    pub async fn upsert<T: Serialize>(&self, table: &str, rows: &[T], on_conflict: &str) -> Result<()> {
        let response = self
            .authorized(self.client.post(self.table_url(table)))
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(rows)
            .send()
            .await
            .with_context(|| format!("failed to upsert into {table}"))?;
        check_status(response, table, "upsert").await?;
        Ok(())
    }

    pub async fn update<T: Serialize>(&self, table: &str, query: &Query, patch: &T) -> Result<()> {
        let response = self
            .authorized(self.client.patch(self.table_url(table)))
            .query(&query.to_pairs())
            .header("Prefer", "return=minimal")
            .json(patch)
            .send()
            .await
            .with_context(|| format!("failed to update {table}"))?;
        check_status(response, table, "update").await?;
        Ok(())
    }

    pub async fn delete(&self, table: &str, query: &Query) -> Result<()> {
        let response = self
            .authorized(self.client.delete(self.table_url(table)))
            .query(&query.to_pairs())
            .send()
            .await
            .with_context(|| format!("failed to delete from {table}"))?;
        check_status(response, table, "delete").await?;
        Ok(())
    }

    pub async fn upload(&self, bucket: &str, key: &str, data: Vec<u8>, mime: &str) -> Result<()> {
        let response = self
            .authorized(self.client.post(self.object_url(bucket, key)))
            .header("Content-Type", mime)
            .header("x-upsert", "true")
            .body(data)
            .send()
            .await
            .with_context(|| format!("failed to upload {bucket}/{key}"))?;
        check_status(response, bucket, "upload").await?;
        Ok(())
    }

    /// Fetches an object. A missing object is `None`, not an error.
    pub async fn download(&self, bucket: &str, key: &str) -> Result<Option<bytes::Bytes>> {
        let response = self
            .authorized(self.client.get(self.object_url(bucket, key)))
            .send()
            .await
            .with_context(|| format!("failed to download {bucket}/{key}"))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response, bucket, "download").await?;
        Ok(Some(response.bytes().await?))
    }

    pub async fn remove(&self, bucket: &str, key: &str) -> Result<()> {
        let response = self
            .authorized(self.client.delete(self.object_url(bucket, key)))
            .send()
            .await
            .with_context(|| format!("failed to remove {bucket}/{key}"))?;
        check_status(response, bucket, "remove").await?;
        Ok(())
    }

    pub fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{key}", self.base_url)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/storage/v1/object/{bucket}/{key}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }
}

async fn check_status(response: Response, target: &str, operation: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    anyhow::bail!("{operation} on {target} failed: {status} - {body}")
}
