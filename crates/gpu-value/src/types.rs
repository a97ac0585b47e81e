//! Core data types for price discovery and value targets.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Retailer name stamped on a snapshot when no retailer produced a quote.
pub const FALLBACK_RETAILER: &str = "Fallback";

/// Baseline price used when every retailer probe comes back empty.
pub const FALLBACK_PRICE: f64 = 330.00;

/// The cheapest plausible listing found on one retailer's page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub price: f64,
    pub source_url: String,
    pub retailer_name: String,
}

/// One declarative way of locating price fragments in a listing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionRule {
    /// Elements named `tag` carrying a class token that matches the `class` regex.
    Element { tag: String, class: String },
    /// Any CSS selector; the text of every matching element is a fragment.
    Css { selector: String },
    /// Currency-shaped regex over the visible text of `scope` (or `<body>`).
    TextScan {
        pattern: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scope: Option<String>,
    },
}

/// Static description of a supported retailer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetailerSpec {
    pub retailer_name: String,
    pub listing_url: String,
    #[serde(default)]
    pub request_headers: BTreeMap<String, String>,
    pub extraction_rules: Vec<ExtractionRule>,
}

/// Why a probe produced no quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum NoQuoteReason {
    /// Connection failure, DNS failure, timeout or body read error.
    Network(String),
    /// The retailer answered with something other than 200.
    Status(u16),
    /// The page loaded but no rule yielded a usable amount.
    NoPrices,
}

impl std::fmt::Display for NoQuoteReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoQuoteReason::Network(detail) => write!(f, "network error: {detail}"),
            NoQuoteReason::Status(code) => write!(f, "unexpected HTTP status {code}"),
            NoQuoteReason::NoPrices => write!(f, "no prices found on page"),
        }
    }
}

/// Result of probing a single retailer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProbeOutcome {
    Quote(PriceQuote),
    NoQuote { retailer_name: String, reason: NoQuoteReason },
}

impl ProbeOutcome {
    /// The quote, if the probe produced one.
    pub fn quote(&self) -> Option<&PriceQuote> {
        match self {
            ProbeOutcome::Quote(q) => Some(q),
            ProbeOutcome::NoQuote { .. } => None,
        }
    }

    pub fn into_quote(self) -> Option<PriceQuote> {
        match self {
            ProbeOutcome::Quote(q) => Some(q),
            ProbeOutcome::NoQuote { .. } => None,
        }
    }

    pub fn retailer_name(&self) -> &str {
        match self {
            ProbeOutcome::Quote(q) => &q.retailer_name,
            ProbeOutcome::NoQuote { retailer_name, .. } => retailer_name,
        }
    }
}

/// The authoritative baseline price at a point in time.
///
/// Snapshots are replaced wholesale on refresh and never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineSnapshot {
    pub price: f64,
    pub source_url: Option<String>,
    pub retailer_name: String,
    pub resolved_at: DateTime<Utc>,
}

impl BaselineSnapshot {
    /// Build a snapshot from the winning quote of a resolution cycle.
    pub fn from_quote(quote: PriceQuote, resolved_at: DateTime<Utc>) -> Self {
        Self {
            price: quote.price,
            source_url: Some(quote.source_url),
            retailer_name: quote.retailer_name,
            resolved_at,
        }
    }

    /// Build the fallback snapshot used when no retailer returned a quote.
    pub fn fallback(price: f64, resolved_at: DateTime<Utc>) -> Self {
        Self {
            price,
            source_url: None,
            retailer_name: FALLBACK_RETAILER.to_string(),
            resolved_at,
        }
    }

    /// Whether this snapshot came from the fallback constant rather than a retailer.
    pub fn is_fallback(&self) -> bool {
        self.source_url.is_none() && self.retailer_name == FALLBACK_RETAILER
    }

    /// The `(price, source_url, retailer_name)` triple handed to the dashboard.
    pub fn as_tuple(&self) -> (f64, Option<&str>, &str) {
        (self.price, self.source_url.as_deref(), &self.retailer_name)
    }
}

/// A catalog card compared against the baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuEntry {
    pub name: String,
    /// Relative performance weight versus the baseline card.
    pub rwa: f64,
    /// Architecture value retention multiplier.
    pub arch: f64,
    /// Observed market price for this card.
    pub market_price: f64,
    pub url: String,
}

/// The card whose retail price anchors every value target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineGpu {
    pub name: String,
    pub url: String,
}
