//! Baseline resolution across every configured retailer.
//!
//! Probes run concurrently and are joined before reduction. The cheapest
//! quote wins; equal prices go to the retailer listed first. When nothing
//! quotes, the fixed fallback price stands in. Resolution never fails.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;

use crate::clock::{Clock, SystemClock};
use crate::error::{ValueIndexError, ValueIndexResult};
use crate::http_client::PageFetcher;
use crate::probe::{Retailer, RetailerProbe};
use crate::types::{BaselineSnapshot, PriceQuote, ProbeOutcome, RetailerSpec, FALLBACK_PRICE};

/// Anything that can produce a fresh baseline snapshot.
///
/// The cache depends on this rather than on [`BaselineResolver`] directly.
#[async_trait]
pub trait BaselineSource: Send + Sync {
    async fn resolve(&self) -> BaselineSnapshot;
}

/// Runs every retailer probe and reduces the results to one snapshot.
pub struct BaselineResolver {
    probe: RetailerProbe,
    retailers: Vec<Retailer>,
    fallback_price: f64,
    clock: Arc<dyn Clock>,
}

impl BaselineResolver {
    /// Build a resolver over `specs`, compiling each retailer's rules.
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        specs: Vec<RetailerSpec>,
    ) -> ValueIndexResult<Self> {
        let retailers = specs
            .into_iter()
            .map(Retailer::new)
            .collect::<ValueIndexResult<Vec<_>>>()?;

        Ok(Self {
            probe: RetailerProbe::new(fetcher),
            retailers,
            fallback_price: FALLBACK_PRICE,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the fallback price; it must be finite and positive.
    pub fn with_fallback_price(mut self, price: f64) -> ValueIndexResult<Self> {
        self.fallback_price = check_fallback_price(price)?;
        Ok(self)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn retailers(&self) -> &[Retailer] {
        &self.retailers
    }

    /// Probe every retailer once; outcomes come back in configuration order.
    pub async fn probe_all(&self) -> Vec<ProbeOutcome> {
        join_all(self.retailers.iter().map(|r| self.probe.probe(r))).await
    }

    /// Run one full resolution cycle.
    pub async fn resolve_snapshot(&self) -> BaselineSnapshot {
        let outcomes = self.probe_all().await;
        let quotes: Vec<PriceQuote> = outcomes
            .into_iter()
            .filter_map(ProbeOutcome::into_quote)
            .collect();
        let resolved_at = self.clock.now();

        match select_cheapest(quotes) {
            Some(quote) => {
                tracing::info!(
                    "baseline resolved: £{:.2} from {} ({})",
                    quote.price,
                    quote.retailer_name,
                    quote.source_url
                );
                BaselineSnapshot::from_quote(quote, resolved_at)
            }
            None => {
                tracing::warn!(
                    "no retailer returned a price; using fallback baseline £{:.2}",
                    self.fallback_price
                );
                BaselineSnapshot::fallback(self.fallback_price, resolved_at)
            }
        }
    }
}

#[async_trait]
impl BaselineSource for BaselineResolver {
    async fn resolve(&self) -> BaselineSnapshot {
        self.resolve_snapshot().await
    }
}

/// A source that never touches the network and always answers with the
/// fallback price.
pub struct FixedBaseline {
    price: f64,
    clock: Arc<dyn Clock>,
}

impl FixedBaseline {
    pub fn new(price: f64) -> ValueIndexResult<Self> {
        Ok(Self {
            price: check_fallback_price(price)?,
            clock: Arc::new(SystemClock),
        })
    }
}

impl Default for FixedBaseline {
    fn default() -> Self {
        Self {
            price: FALLBACK_PRICE,
            clock: Arc::new(SystemClock),
        }
    }
}

#[async_trait]
impl BaselineSource for FixedBaseline {
    async fn resolve(&self) -> BaselineSnapshot {
        BaselineSnapshot::fallback(self.price, self.clock.now())
    }
}

/// Accept only finite, positive fallback prices.
pub fn check_fallback_price(price: f64) -> ValueIndexResult<f64> {
    if price.is_finite() && price > 0.0 {
        Ok(price)
    } else {
        Err(ValueIndexError::InvalidConfig(format!(
            "fallback price must be positive, got {price}"
        )))
    }
}

/// The cheapest quote; on a tie the earliest one in `quotes` is kept.
pub fn select_cheapest(quotes: Vec<PriceQuote>) -> Option<PriceQuote> {
    let mut best: Option<PriceQuote> = None;
    for quote in quotes {
        match &best {
            Some(b) if quote.price >= b.price => {}
            _ => best = Some(quote),
        }
    }
    best
}
