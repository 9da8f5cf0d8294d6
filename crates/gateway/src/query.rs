//! Table request builder.
//!
//! Mirrors the query-string dialect of the hosted table API: `select=`
//! projections, `col=eq.value` filters, `order=col.asc|desc`, and `Prefer` /
//! `Accept` headers for representation, upsert merging and single-row
//! expectations.

use std::fmt::Display;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use crate::client::SupabaseClient;
use crate::error::GatewayError;

/// `Accept` value asking for exactly one row as a bare object.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Sort direction for `order=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

impl Order {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// A request against one table, built up with filters before execution.
#[derive(Debug)]
#[must_use = "a table query does nothing until executed"]
pub struct TableQuery<'a> {
    client: &'a SupabaseClient,
    table: &'static str,
    params: Vec<(String, String)>,
}

impl<'a> TableQuery<'a> {
    pub(crate) const fn new(client: &'a SupabaseClient, table: &'static str) -> Self {
        Self {
            client,
            table,
            params: Vec::new(),
        }
    }

    /// Restrict the returned columns (supports embedded joins).
    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".to_string(), columns.to_string()));
        self
    }

    /// Equality filter on `column`.
    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.params.push((column.to_string(), format!("eq.{value}")));
        self
    }

    /// Sort by `column`.
    pub fn order(mut self, column: &str, order: Order) -> Self {
        self.params
            .push(("order".to_string(), format!("{column}.{}", order.as_str())));
        self
    }

    /// Columns identifying the row an upsert merges into.
    pub fn on_conflict(mut self, columns: &str) -> Self {
        self.params
            .push(("on_conflict".to_string(), columns.to_string()));
        self
    }

    /// Human-readable description used in logs and `NotFound` errors.
    fn describe(&self) -> String {
        let filters = self
            .params
            .iter()
            .filter(|(k, _)| k != "select")
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        if filters.is_empty() {
            self.table.to_string()
        } else {
            format!("{}?{filters}", self.table)
        }
    }

    fn url(&self) -> Result<Url, GatewayError> {
        let mut url = self.client.endpoint(&format!("rest/v1/{}", self.table))?;
        if !self.params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method) -> Result<reqwest::RequestBuilder, GatewayError> {
        Ok(self.client.http().request(method, self.url()?))
    }

    /// Fetch all matching rows.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failure, error status, or bad JSON.
    #[instrument(skip_all, fields(table = self.table))]
    pub async fn fetch<T: DeserializeOwned>(self) -> Result<Vec<T>, GatewayError> {
        let context = self.describe();
        let body = self
            .client
            .send(self.request(Method::GET)?, &context)
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch exactly one row.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::NotFound` if zero or several rows match.
    #[instrument(skip_all, fields(table = self.table))]
    pub async fn fetch_single<T: DeserializeOwned>(self) -> Result<T, GatewayError> {
        let context = self.describe();
        let request = self.request(Method::GET)?.header("Accept", SINGLE_OBJECT);
        let body = self.client.send(request, &context).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Insert one row and return it as stored.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failure or constraint violation.
    #[instrument(skip_all, fields(table = self.table))]
    pub async fn insert_returning<B, T>(self, body: &B) -> Result<T, GatewayError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let context = self.describe();
        let request = self
            .request(Method::POST)?
            .header("Prefer", "return=representation")
            .header("Accept", SINGLE_OBJECT)
            .json(body);
        let body = self.client.send(request, &context).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Insert one row without reading it back.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failure or constraint violation.
    #[instrument(skip_all, fields(table = self.table))]
    pub async fn insert<B>(self, body: &B) -> Result<(), GatewayError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let context = self.describe();
        let request = self
            .request(Method::POST)?
            .header("Prefer", "return=minimal")
            .json(body);
        self.client.send(request, &context).await?;
        Ok(())
    }

    /// Update the single matching row and return it.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::NotFound` if the filters match no row.
    #[instrument(skip_all, fields(table = self.table))]
    pub async fn update_returning<B, T>(self, body: &B) -> Result<T, GatewayError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let context = self.describe();
        let request = self
            .request(Method::PATCH)?
            .header("Prefer", "return=representation")
            .header("Accept", SINGLE_OBJECT)
            .json(body);
        let body = self.client.send(request, &context).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Update all matching rows and return how many changed.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failure or error status.
    #[instrument(skip_all, fields(table = self.table))]
    pub async fn update<B>(self, body: &B) -> Result<usize, GatewayError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let context = self.describe();
        let request = self
            .request(Method::PATCH)?
            .header("Prefer", "return=representation")
            .json(body);
        let body = self.client.send(request, &context).await?;
        let rows: Vec<serde_json::Value> = serde_json::from_str(&body)?;
        Ok(rows.len())
    }

    /// Insert, or merge into the row matching the `on_conflict` columns.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failure or error status.
    #[instrument(skip_all, fields(table = self.table))]
    pub async fn upsert<B>(self, body: &B) -> Result<(), GatewayError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let context = self.describe();
        let request = self
            .request(Method::POST)?
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(body);
        self.client.send(request, &context).await?;
        Ok(())
    }

    /// Delete all matching rows. Matching nothing is not an error.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failure or error status.
    #[instrument(skip_all, fields(table = self.table))]
    pub async fn delete(self) -> Result<(), GatewayError> {
        let context = self.describe();
        self.client
            .send(self.request(Method::DELETE)?, &context)
            .await?;
        Ok(())
    }
}
