use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::apis::MovieSource;
use crate::config::CatalogConfig;
use crate::error::{PipelineError, Result};
use crate::types::RawRecord;

/// Blocking client for the TMDB v3 REST API
pub struct TmdbClient {
    client: Client,
    config: CatalogConfig,
}

impl TmdbClient {
    pub fn new(config: CatalogConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(CatalogConfig::from_env()?)
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn get_json(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
        let url = self.endpoint(path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.config.api_key.as_str()),
                ("language", self.config.language.as_str()),
            ])
            .query(params)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            warn!("TMDB request to {} failed with {}", path, status);
            return Err(PipelineError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json()?)
    }

    /// One page of the popular movies listing (summary records only)
    #[instrument(skip(self))]
    pub fn popular_movies(&self, page: u32) -> Result<Vec<RawRecord>> {
        let body = self.get_json("movie/popular", &[("page", page.to_string())])?;
        Ok(results(body))
    }

    #[instrument(skip(self))]
    pub fn search_movie(&self, title: &str) -> Result<Vec<RawRecord>> {
        let body = self.get_json("search/movie", &[("query", title.to_string())])?;
        Ok(results(body))
    }

    /// Full movie record with the `credits` block appended
    #[instrument(skip(self))]
    pub fn movie_details(&self, id: u64) -> Result<RawRecord> {
        self.get_json(
            &format!("movie/{id}"),
            &[("append_to_response", "credits".to_string())],
        )
    }

    /// Details for each id in turn; the first failure aborts the batch.
    pub fn movies_by_ids(&self, ids: &[u64]) -> Result<Vec<RawRecord>> {
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            records.push(self.movie_details(*id)?);
        }
        info!("Fetched {} movie records from TMDB", records.len());
        Ok(records)
    }
}

fn results(body: Value) -> Vec<RawRecord> {
    match body {
        Value::Object(mut page) => match page.remove("results") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// A fixed list of movie ids fetched through [`TmdbClient`]
pub struct TmdbSource {
    client: TmdbClient,
    ids: Vec<u64>,
}

impl TmdbSource {
    pub fn new(client: TmdbClient, ids: Vec<u64>) -> Self {
        Self { client, ids }
    }
}

impl MovieSource for TmdbSource {
    fn source_name(&self) -> &'static str {
        "tmdb"
    }

    fn fetch_records(&self) -> Result<Vec<RawRecord>> {
        self.client.movies_by_ids(&self.ids)
    }
}
