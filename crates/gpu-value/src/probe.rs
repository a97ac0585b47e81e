//! One generic probe for every retailer.
//!
//! A [`Retailer`] pairs a static [`RetailerSpec`] with its pre-compiled
//! [`RuleSet`]. Probing performs exactly one outbound request and always
//! yields a [`ProbeOutcome`]; failures are values, never errors.

use std::sync::Arc;

use crate::error::ValueIndexResult;
use crate::extractor::RuleSet;
use crate::http_client::PageFetcher;
use crate::types::{NoQuoteReason, PriceQuote, ProbeOutcome, RetailerSpec};

/// A validated retailer, ready to probe.
#[derive(Debug, Clone)]
pub struct Retailer {
    spec: RetailerSpec,
    rules: RuleSet,
    headers: Vec<(String, String)>,
}

impl Retailer {
    /// Validate a spec and compile its extraction rules.
    pub fn new(spec: RetailerSpec) -> ValueIndexResult<Self> {
        let rules = RuleSet::compile(&spec.extraction_rules)?;
        let headers = spec
            .request_headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(Self {
            spec,
            rules,
            headers,
        })
    }

    pub fn spec(&self) -> &RetailerSpec {
        &self.spec
    }

    pub fn name(&self) -> &str {
        &self.spec.retailer_name
    }

    /// Reduce the amounts found on a page to a quote.
    ///
    /// The cheapest positive amount wins. Zero amounts are placeholders
    /// ("£0.00 delivery", empty price slots), not listings.
    pub fn quote_from_page(&self, body: &str) -> ProbeOutcome {
        let cheapest = self
            .rules
            .extract(body)
            .into_iter()
            .filter(|p| *p > 0.0)
            .min_by(|a, b| a.total_cmp(b));

        match cheapest {
            Some(price) => ProbeOutcome::Quote(PriceQuote {
                price,
                source_url: self.spec.listing_url.clone(),
                retailer_name: self.spec.retailer_name.clone(),
            }),
            None => self.no_quote(NoQuoteReason::NoPrices),
        }
    }

    fn no_quote(&self, reason: NoQuoteReason) -> ProbeOutcome {
        tracing::warn!("{}: no quote ({reason})", self.spec.retailer_name);
        ProbeOutcome::NoQuote {
            retailer_name: self.spec.retailer_name.clone(),
            reason,
        }
    }
}

/// Probes retailers through a shared page fetcher.
#[derive(Clone)]
pub struct RetailerProbe {
    fetcher: Arc<dyn PageFetcher>,
}

impl RetailerProbe {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    /// Fetch the retailer's listing page and quote its cheapest price.
    pub async fn probe(&self, retailer: &Retailer) -> ProbeOutcome {
        let url = &retailer.spec.listing_url;
        tracing::debug!("probing {} at {url}", retailer.name());

        let response = match self.fetcher.fetch(url, &retailer.headers).await {
            Ok(r) => r,
            Err(e) => return retailer.no_quote(NoQuoteReason::Network(e.to_string())),
        };

        if response.status != 200 {
            return retailer.no_quote(NoQuoteReason::Status(response.status));
        }

        let outcome = retailer.quote_from_page(&response.body);
        if let Some(q) = outcome.quote() {
            tracing::debug!("{}: cheapest listing £{:.2}", q.retailer_name, q.price);
        }
        outcome
    }
}
