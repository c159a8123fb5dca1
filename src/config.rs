use anyhow::{bail, Context, Result};
use std::str::FromStr;
use std::time::Duration;

use crate::services::{Network, RetryPolicy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Testnet,
    Production,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub host: String,
    pub port: u16,

    // External collaborators
    pub store_api_url: String,
    pub chain_service_url: String,
    pub request_timeout: Duration,

    // Verification
    pub explorer_network: String,
    pub verify_timeout: Duration,
    pub retry_max_attempts: u32,

    // Statistics cache
    pub stats_cache_ttl: Duration,

    // Admin surface; admin routes are closed when unset
    pub admin_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let environment = Self::parse_environment()?;

        let config = Self {
            environment,
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_var("PORT", "8080")?,

            store_api_url: std::env::var("STORE_API_URL")
                .context("STORE_API_URL required")?,
            chain_service_url: std::env::var("CHAIN_SERVICE_URL")
                .context("CHAIN_SERVICE_URL required")?,
            request_timeout: Duration::from_secs(parse_var("REQUEST_TIMEOUT_SECS", "15")?),

            explorer_network: std::env::var("EXPLORER_NETWORK")
                .unwrap_or_else(|_| "sepolia".to_string()),
            verify_timeout: Duration::from_secs(parse_var("VERIFY_TIMEOUT_SECS", "30")?),
            retry_max_attempts: parse_var("RETRY_MAX_ATTEMPTS", "3")?,

            stats_cache_ttl: Duration::from_millis(parse_var("STATS_CACHE_TTL_MS", "30000")?),

            admin_token: std::env::var("ADMIN_TOKEN").ok().filter(|t| !t.is_empty()),
        };

        config.validate()?;
        Ok(config)
    }

    fn parse_environment() -> Result<Environment> {
        let env = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        match env.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testnet" | "test" => Ok(Environment::Testnet),
            "production" | "prod" => Ok(Environment::Production),
            _ => bail!("Unknown environment: {}", env),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_max_attempts,
            ..RetryPolicy::default()
        }
    }

    /// Configured explorer network, or sepolia when the identifier is unknown.
    pub fn default_network(&self) -> Network {
        Network::parse(&self.explorer_network).unwrap_or(Network::Sepolia)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.store_api_url.starts_with("http") {
            bail!("STORE_API_URL must be HTTP(S) URL");
        }
        if !self.chain_service_url.starts_with("http") {
            bail!("CHAIN_SERVICE_URL must be HTTP(S) URL");
        }
        if self.stats_cache_ttl.is_zero() {
            bail!("STATS_CACHE_TTL_MS must be greater than zero");
        }
        if self.verify_timeout.is_zero() || self.request_timeout.is_zero() {
            bail!("Timeouts must be greater than zero");
        }
        if Network::parse(&self.explorer_network).is_none() {
            tracing::warn!(
                "Unknown EXPLORER_NETWORK '{}', explorer links fall back to sepolia",
                self.explorer_network
            );
        }
        if self.environment == Environment::Production && self.admin_token.is_none() {
            tracing::warn!("ADMIN_TOKEN not set; admin routes are disabled");
        }

        tracing::info!(
            "Configuration validated for {:?} environment",
            self.environment
        );

        Ok(())
    }
}

fn parse_var<T: FromStr>(var: &str, default: &str) -> Result<T> {
    std::env::var(var)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid {}", var))
}
