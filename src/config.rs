//! Configuration management for the ProdRank engine
//!
//! Strongly-typed configuration read from environment variables (with an
//! optional `.env` file), validated once at startup.
//!
//! # Example
//! ```no_run
//! use prodrank::Config;
//! let config = Config::from_env().expect("failed to load config");
//! println!("Data file: {}", config.data.path.display());
//! ```

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Interaction data source
    pub data: DataConfig,
    /// API server configuration
    pub api: ApiConfig,
    /// Ranking engine configuration
    pub ranking: RankingConfig,
}

/// Interaction data source
#[derive(Debug, Clone)]
pub struct DataConfig {
    /// JSON file holding the interaction records
    pub path: PathBuf,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Port to listen on
    pub port: u16,
    /// Host to bind to
    pub host: String,
    /// Request timeout
    pub request_timeout: Duration,
    /// Enable CORS
    pub cors_enabled: bool,
}

/// Ranking engine configuration
#[derive(Debug, Clone)]
pub struct RankingConfig {
    /// Personalized ranking length when the caller gives none
    pub default_top_n: usize,
    /// Global ranking length when the caller gives none
    pub global_top_k: usize,
    /// Per-user ranking length fed into the global vote
    pub vote_depth: usize,
    /// Fan the global vote out over the rayon pool
    pub parallel: bool,
    /// Users listed by the overview endpoint
    pub overview_users: usize,
    /// Largest `limit` accepted from API callers
    pub max_limit: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            default_top_n: 5,
            global_top_k: 10,
            vote_depth: 5,
            parallel: true,
            overview_users: 5,
            max_limit: 100,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Try to load .env file (ignore if not found)
        dotenvy::dotenv().ok();

        let config = Self {
            data: DataConfig::from_env()?,
            api: ApiConfig::from_env()?,
            ranking: RankingConfig::from_env()?,
        };

        config.validate()?;
        config.log_summary();

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.data.path.as_os_str().is_empty() {
            return Err(Error::InvalidConfig {
                key: "DATA_PATH",
                message: "data path cannot be empty".into(),
            });
        }

        if self.api.port == 0 {
            return Err(Error::InvalidConfig {
                key: "API_PORT",
                message: "port must be non-zero".into(),
            });
        }

        let ranking = &self.ranking;
        for (key, value) in [
            ("RANK_DEFAULT_TOP_N", ranking.default_top_n),
            ("RANK_GLOBAL_TOP_K", ranking.global_top_k),
            ("RANK_VOTE_DEPTH", ranking.vote_depth),
            ("RANK_MAX_LIMIT", ranking.max_limit),
        ] {
            if value == 0 {
                return Err(Error::InvalidConfig {
                    key,
                    message: "must be greater than zero".into(),
                });
            }
        }

        for (key, value) in [
            ("RANK_DEFAULT_TOP_N", ranking.default_top_n),
            ("RANK_GLOBAL_TOP_K", ranking.global_top_k),
        ] {
            if value > ranking.max_limit {
                return Err(Error::InvalidConfig {
                    key,
                    message: format!("{} exceeds RANK_MAX_LIMIT ({})", value, ranking.max_limit)
                        .into(),
                });
            }
        }

        Ok(())
    }

    /// Log configuration summary
    fn log_summary(&self) {
        info!("Configuration loaded:");
        info!("  Data:");
        info!("    Path: {}", self.data.path.display());
        info!("  API:");
        info!("    Listening on: {}:{}", self.api.host, self.api.port);
        info!("    Request Timeout: {:?}", self.api.request_timeout);
        info!("  Ranking:");
        info!(
            "    Top-N: {}, Global Top-K: {}, Vote Depth: {}",
            self.ranking.default_top_n, self.ranking.global_top_k, self.ranking.vote_depth
        );
        info!("    Parallel Aggregation: {}", self.ranking.parallel);
    }
}

impl DataConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            path: PathBuf::from(get_env_or("DATA_PATH", "data/ratings.json")),
        })
    }
}

impl ApiConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            port: get_env_parsed_or("API_PORT", 8080)?,
            host: get_env_or("API_HOST", "0.0.0.0"),
            request_timeout: Duration::from_secs(get_env_parsed_or(
                "API_REQUEST_TIMEOUT_SECS",
                30,
            )?),
            cors_enabled: get_env_parsed_or("API_CORS_ENABLED", true)?,
        })
    }
}

impl RankingConfig {
    fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            default_top_n: get_env_parsed_or("RANK_DEFAULT_TOP_N", defaults.default_top_n)?,
            global_top_k: get_env_parsed_or("RANK_GLOBAL_TOP_K", defaults.global_top_k)?,
            vote_depth: get_env_parsed_or("RANK_VOTE_DEPTH", defaults.vote_depth)?,
            parallel: get_env_parsed_or("RANK_PARALLEL", defaults.parallel)?,
            overview_users: get_env_parsed_or("RANK_OVERVIEW_USERS", defaults.overview_users)?,
            max_limit: get_env_parsed_or("RANK_MAX_LIMIT", defaults.max_limit)?,
        })
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Get environment variable with default
fn get_env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get and parse environment variable, falling back to `default` when unset
fn get_env_parsed_or<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value.trim().parse().map_err(|e: T::Err| Error::InvalidConfig {
            key,
            message: format!("Invalid value '{}': {}", value, e).into(),
        }),
        Err(_) => Ok(default),
    }
}
