use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

use crate::constants::{
    DEFAULT_DROP_COLUMNS, DEFAULT_PLACEHOLDER_TEXT, DEFAULT_TMDB_BASE_URL, DEFAULT_TMDB_LANGUAGE,
    RELEASED_STATUS,
};
use crate::error::{PipelineError, Result};

/// Default config file looked up by the CLI when no path is given
pub const DEFAULT_CONFIG_PATH: &str = "movie_kpi.toml";

/// Policy knobs for the cleaning pipeline and the KPI engine.
///
/// Every field has a default, so a config file only needs the keys it changes.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Rows with fewer non-missing cells than this are dropped
    pub min_non_missing_fields: usize,
    /// ROI is only defined for budgets at or above this many millions
    pub roi_min_budget_musd: f64,
    /// Rating views only consider movies with at least this many votes
    pub rating_min_votes: f64,
    /// Size of every ranked view
    pub top_n: usize,
    /// Exact release status a movie must have to be kept
    pub release_status: String,
    /// Columns removed before extraction
    pub drop_columns: Vec<String>,
    /// Tagline/overview values treated as missing (case-insensitive)
    pub placeholder_text: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_non_missing_fields: 10,
            roi_min_budget_musd: 10.0,
            rating_min_votes: 10.0,
            top_n: 10,
            release_status: RELEASED_STATUS.to_string(),
            drop_columns: DEFAULT_DROP_COLUMNS.iter().map(|s| s.to_string()).collect(),
            placeholder_text: DEFAULT_PLACEHOLDER_TEXT.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: PipelineConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load `path` if given, else `movie_kpi.toml` if it exists, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_PATH);
                if fallback.exists() {
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

/// Connection settings for the movie catalog API
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub api_key: String,
    pub base_url: String,
    pub language: String,
    pub timeout_seconds: u64,
}

impl CatalogConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_TMDB_BASE_URL.to_string(),
            language: DEFAULT_TMDB_LANGUAGE.to_string(),
            timeout_seconds: 30,
        }
    }

    /// Read `TMDB_API_KEY`, `TMDB_BASE_URL` and `TMDB_LANGUAGE`, loading a
    /// `.env` file first if one is present.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let api_key = env::var("TMDB_API_KEY").map_err(|_| {
            PipelineError::Config("TMDB_API_KEY is not set in the environment".to_string())
        })?;
        if api_key.trim().is_empty() {
            return Err(PipelineError::Config("TMDB_API_KEY is empty".to_string()));
        }

        let mut config = Self::new(api_key);
        if let Some(base_url) = optional_var("TMDB_BASE_URL")? {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(language) = optional_var("TMDB_LANGUAGE")? {
            config.language = language;
        }
        Ok(config)
    }
}

fn optional_var(name: &str) -> Result<Option<String>> {
    match env::var(name) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
