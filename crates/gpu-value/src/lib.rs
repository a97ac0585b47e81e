//! Radeon Value Index — live retail baseline discovery and GPU value targets.
//!
//! The price-discovery core runs bottom-up: [`extractor`] pulls amounts out of
//! listing markup, [`probe`] turns one retailer page into a quote, [`resolver`]
//! picks the cheapest quote across retailers (or the fallback price), and
//! [`cache`] holds the result for a fixed time-to-live.

use std::sync::{Arc, OnceLock};

pub mod cache;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod extractor;
pub mod http_client;
pub mod probe;
pub mod resolver;
pub mod types;
pub mod value;

pub use cache::{BaselineCache, DEFAULT_TTL};
pub use catalog::{Catalog, Generation};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::BaselineConfig;
pub use error::{ValueIndexError, ValueIndexResult};
pub use extractor::{extract_prices, RuleSet};
pub use http_client::{HttpClient, HttpResponse, PageFetcher};
pub use probe::{Retailer, RetailerProbe};
pub use resolver::{BaselineResolver, BaselineSource, FixedBaseline};
pub use types::*;
pub use value::{compute_targets, value_target, ValueRow};

static SHARED_CACHE: OnceLock<BaselineCache> = OnceLock::new();

/// The process-wide baseline cache, built from the environment on first use.
///
/// Building does no network I/O; the first `get()` does. A bad `GPU_VALUE_*`
/// variable is logged and skipped. If no HTTP-backed cache can be built at
/// all, the cache serves the fallback baseline.
pub fn shared_cache() -> &'static BaselineCache {
    SHARED_CACHE.get_or_init(build_shared_cache)
}

fn build_shared_cache() -> BaselineCache {
    let built = BaselineConfig::from_env_lenient().and_then(|config| config.build_cache());
    match built {
        Ok(cache) => cache,
        Err(e) => {
            tracing::warn!("baseline cache unavailable ({e}); serving the fallback baseline");
            BaselineCache::new(Arc::new(FixedBaseline::default()), DEFAULT_TTL)
        }
    }
}

/// Install `cache` as the process-wide instance.
///
/// Returns the cache back if one was already installed.
pub fn install_shared_cache(cache: BaselineCache) -> Result<(), BaselineCache> {
    SHARED_CACHE.set(cache)
}

/// Current baseline as `(price, source_url, retailer_name)`.
pub async fn get_baseline() -> (f64, Option<String>, String) {
    let snapshot = shared_cache().get().await;
    (snapshot.price, snapshot.source_url, snapshot.retailer_name)
}
