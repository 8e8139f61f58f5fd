/// Remote collection source for the hosted PostgREST backend

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
use tracing::instrument;

use super::data::{Artist, Gallery, Genre, Painting};
use crate::error::{CatalogueError, Result};

/// Read-only access to the hosted catalogue tables.
///
/// Every query returns a full snapshot of one table; there is no paging.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn list_galleries(&self) -> Result<Vec<Gallery>>;

    /// With `with_joins`, each painting embeds its artist and gallery.
    async fn list_paintings(&self, with_joins: bool) -> Result<Vec<Painting>>;

    async fn list_artists(&self) -> Result<Vec<Artist>>;

    /// With `with_joins`, each genre embeds its painting-genre join rows.
    async fn list_genres(&self, with_joins: bool) -> Result<Vec<Genre>>;
}

/// Supabase (PostgREST) client for the catalogue tables
#[derive(Clone)]
pub struct SupabaseSource {
    client: reqwest::Client,
    base_url: String,
}

impl SupabaseSource {
    /// Build a client for the project at `url` using its anon `key`
    pub fn new(url: &str, key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let api_key = HeaderValue::from_str(key)
            .map_err(|_| CatalogueError::Config("supabase key is not a valid header value".into()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", key))
            .map_err(|_| CatalogueError::Config("supabase key is not a valid header value".into()))?;
        headers.insert("apikey", api_key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(SupabaseSource {
            client,
            base_url: url.trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    #[instrument(level = "debug", skip(self))]
    async fn select<T>(&self, table: &str, columns: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .client
            .get(self.table_url(table))
            .query(&[("select", columns)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogueError::Status {
                table: table.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let rows: Vec<T> = serde_json::from_str(&text)?;
        tracing::debug!(table, rows = rows.len(), "fetched table");
        Ok(rows)
    }
}

#[async_trait]
impl RemoteSource for SupabaseSource {
    async fn list_galleries(&self) -> Result<Vec<Gallery>> {
        self.select("galleries", "*").await
    }

    async fn list_paintings(&self, with_joins: bool) -> Result<Vec<Painting>> {
        let columns = if with_joins {
            "*,artists(*),galleries(*)"
        } else {
            "*"
        };
        self.select("paintings", columns).await
    }

    async fn list_artists(&self) -> Result<Vec<Artist>> {
        self.select("artists", "*").await
    }

    async fn list_genres(&self, with_joins: bool) -> Result<Vec<Genre>> {
        let columns = if with_joins { "*,paintinggenres(*)" } else { "*" };
        self.select("genres", columns).await
    }
}

impl std::fmt::Debug for SupabaseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseSource")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Stand-in used when no backend credentials are configured.
/// Every query fails, so only cached collections are available.
#[derive(Debug, Clone, Default)]
pub struct Unconfigured;

#[async_trait]
impl RemoteSource for Unconfigured {
    async fn list_galleries(&self) -> Result<Vec<Gallery>> {
        Err(missing())
    }

    async fn list_paintings(&self, _with_joins: bool) -> Result<Vec<Painting>> {
        Err(missing())
    }

    async fn list_artists(&self) -> Result<Vec<Artist>> {
        Err(missing())
    }

    async fn list_genres(&self, _with_joins: bool) -> Result<Vec<Genre>> {
        Err(missing())
    }
}

fn missing() -> CatalogueError {
    CatalogueError::Config("SUPABASE_URL and SUPABASE_KEY must be set to fetch from the backend".into())
}
