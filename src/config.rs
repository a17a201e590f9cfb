use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::search::RankOrder;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub kgpath: KgpathConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub similarity: SimilarityConfig,
    /// Remote graph service; absent means the local degree index answers
    /// neighbor queries too.
    #[serde(default)]
    pub remote: Option<RemoteConfig>,
}

/// Lookup-store locations
#[derive(Debug, Clone, Deserialize)]
pub struct KgpathConfig {
    /// SQLite degree index (node, node_degree, edge tables).
    pub degree_db_path: PathBuf,
    /// SQLite literature_link table; defaults to the degree index file.
    #[serde(default)]
    pub literature_db_path: Option<PathBuf>,
}

/// Search tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Nodes with more edges than this are never expanded through.
    pub hub_threshold: u64,
    /// Neighbors fetched per expansion.
    pub fanout_limit: usize,
    /// Paths dequeued per batch, per worker.
    pub batch_factor: usize,
    /// Worker pool size; 0 = available parallelism.
    pub workers: usize,
    /// Per-direction time limit.
    pub deadline_ms: Option<u64>,
    pub rank_order: RankOrder,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            hub_threshold: 5_000,
            fanout_limit: 50,
            batch_factor: 4,
            workers: 0,
            deadline_ms: None,
            rank_order: RankOrder::default(),
        }
    }
}

/// NGD ranking configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Corpus size N in the NGD formula (articles x average annotations).
    pub ngd_normalizer: f64,
    /// Raw neighbors fetched before NGD ranking; None = all.
    pub candidate_pool: Option<usize>,
    /// Set-size LRU entries; 0 disables the cache.
    pub cache_capacity: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            ngd_normalizer: 2.2e7 * 20.0,
            candidate_pool: None,
            cache_capacity: 10_000,
        }
    }
}

/// Remote graph service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> usize {
    3
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in KGPATH_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenv::dotenv();

        let config_path = std::env::var("KGPATH_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config = Self::from_toml_str(&config_str)?;
        config.validate_paths()?;

        Ok(config)
    }

    /// Parse and validate configuration text without touching the filesystem
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str).context("Failed to parse config.toml")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.search.fanout_limit == 0 {
            anyhow::bail!("search.fanout_limit must be greater than 0");
        }

        if self.search.batch_factor == 0 {
            anyhow::bail!("search.batch_factor must be greater than 0");
        }

        if self.search.hub_threshold == 0 {
            anyhow::bail!("search.hub_threshold must be greater than 0");
        }

        if !self.similarity.ngd_normalizer.is_finite() || self.similarity.ngd_normalizer <= 1.0 {
            anyhow::bail!("similarity.ngd_normalizer must be a finite number greater than 1");
        }

        if let Some(remote) = &self.remote {
            url::Url::parse(&remote.endpoint)
                .with_context(|| format!("remote.endpoint is not a valid URL: {}", remote.endpoint))?;
            if remote.timeout_secs == 0 {
                anyhow::bail!("remote.timeout_secs must be greater than 0");
            }
        }

        Ok(())
    }

    /// Check that the lookup stores exist
    fn validate_paths(&self) -> Result<()> {
        if !self.kgpath.degree_db_path.is_file() {
            anyhow::bail!(
                "degree_db_path does not exist: {}. Set degree_db_path in config.toml to the degree index file.",
                self.kgpath.degree_db_path.display()
            );
        }

        if let Some(path) = &self.kgpath.literature_db_path {
            if !path.is_file() {
                anyhow::bail!("literature_db_path does not exist: {}", path.display());
            }
        }

        Ok(())
    }

    pub fn degree_db_path(&self) -> &Path {
        &self.kgpath.degree_db_path
    }

    pub fn literature_db_path(&self) -> &Path {
        self.kgpath
            .literature_db_path
            .as_deref()
            .unwrap_or(&self.kgpath.degree_db_path)
    }
}
