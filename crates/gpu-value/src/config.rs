//! Configuration loading and resolution.
//!
//! Precedence: explicit setter > environment variable > built-in default.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{BaselineCache, DEFAULT_TTL};
use crate::error::{ValueIndexError, ValueIndexResult};
use crate::http_client::{HttpClient, PageFetcher};
use crate::resolver::{check_fallback_price, BaselineResolver};
use crate::types::{RetailerSpec, FALLBACK_PRICE};

const RETAILERS_JSON: &str = include_str!("retailers.json");

/// Default per-request timeout for retailer probes.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub const ENV_TTL_SECS: &str = "GPU_VALUE_TTL_SECS";
pub const ENV_TIMEOUT_MS: &str = "GPU_VALUE_TIMEOUT_MS";
pub const ENV_FALLBACK_PRICE: &str = "GPU_VALUE_FALLBACK_PRICE";
pub const ENV_RETAILERS: &str = "GPU_VALUE_RETAILERS";

const ENV_KEYS: [&str; 4] = [ENV_TTL_SECS, ENV_TIMEOUT_MS, ENV_FALLBACK_PRICE, ENV_RETAILERS];

/// Everything needed to build a baseline cache.
#[derive(Debug, Clone)]
pub struct BaselineConfig {
    pub ttl: Duration,
    pub request_timeout: Duration,
    pub fallback_price: f64,
    pub retailers: Vec<RetailerSpec>,
}

impl BaselineConfig {
    /// Defaults with the built-in retailer table.
    pub fn builtin() -> ValueIndexResult<Self> {
        Ok(Self {
            ttl: DEFAULT_TTL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            fallback_price: FALLBACK_PRICE,
            retailers: builtin_retailers()?,
        })
    }

    /// Defaults overridden by `GPU_VALUE_*` environment variables.
    pub fn from_env() -> ValueIndexResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`BaselineConfig::from_env`] but reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ValueIndexResult<Self> {
        let mut config = Self::builtin()?;
        for key in ENV_KEYS {
            if let Some(raw) = lookup(key) {
                config.apply_var(key, &raw)?;
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Like [`BaselineConfig::from_env`], but a bad variable is logged and
    /// skipped instead of failing the whole configuration.
    pub fn from_env_lenient() -> ValueIndexResult<Self> {
        Self::from_lookup_lenient(|key| std::env::var(key).ok())
    }

    pub fn from_lookup_lenient(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ValueIndexResult<Self> {
        let mut config = Self::builtin()?;
        for key in ENV_KEYS {
            if let Some(raw) = lookup(key) {
                if let Err(e) = config.apply_var(key, &raw) {
                    tracing::warn!("ignoring {key}: {e}");
                }
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Apply one `GPU_VALUE_*` variable, leaving `self` untouched on error.
    fn apply_var(&mut self, key: &str, raw: &str) -> ValueIndexResult<()> {
        match key {
            ENV_TTL_SECS => self.ttl = Duration::from_secs(parse_var(key, raw)?),
            ENV_TIMEOUT_MS => {
                let timeout = Duration::from_millis(parse_var(key, raw)?);
                check_timeout(timeout)?;
                self.request_timeout = timeout;
            }
            ENV_FALLBACK_PRICE => {
                self.fallback_price = check_fallback_price(parse_var(key, raw)?)?;
            }
            ENV_RETAILERS => self.retailers = load_retailers(Path::new(raw))?,
            _ => {}
        }
        Ok(())
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retailers(mut self, retailers: Vec<RetailerSpec>) -> Self {
        self.retailers = retailers;
        self
    }

    pub fn validate(&self) -> ValueIndexResult<()> {
        check_fallback_price(self.fallback_price)?;
        check_timeout(self.request_timeout)
    }

    /// Build a resolver that fetches through `fetcher`.
    pub fn build_resolver(
        &self,
        fetcher: Arc<dyn PageFetcher>,
    ) -> ValueIndexResult<BaselineResolver> {
        self.validate()?;
        BaselineResolver::new(fetcher, self.retailers.clone())?
            .with_fallback_price(self.fallback_price)
    }

    /// Build a resolver backed by a real HTTP client.
    pub fn build_http_resolver(&self) -> ValueIndexResult<BaselineResolver> {
        let client = HttpClient::new(self.request_timeout)?;
        self.build_resolver(Arc::new(client))
    }

    /// Build an empty cache in front of a real HTTP resolver.
    pub fn build_cache(&self) -> ValueIndexResult<BaselineCache> {
        let resolver = self.build_http_resolver()?;
        Ok(BaselineCache::new(Arc::new(resolver), self.ttl))
    }
}

/// The retailer table compiled into the binary.
pub fn builtin_retailers() -> ValueIndexResult<Vec<RetailerSpec>> {
    Ok(serde_json::from_str(RETAILERS_JSON)?)
}

/// Load a retailer table from a JSON file.
pub fn load_retailers(path: &Path) -> ValueIndexResult<Vec<RetailerSpec>> {
    let raw = std::fs::read_to_string(path)?;
    let retailers: Vec<RetailerSpec> = serde_json::from_str(&raw)?;
    tracing::debug!("loaded {} retailers from {}", retailers.len(), path.display());
    Ok(retailers)
}

fn check_timeout(timeout: Duration) -> ValueIndexResult<()> {
    if timeout.is_zero() {
        return Err(ValueIndexError::InvalidConfig(
            "request timeout must be non-zero".to_string(),
        ));
    }
    Ok(())
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> ValueIndexResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| ValueIndexError::InvalidConfig(format!("{key}: cannot parse '{raw}'")))
}
