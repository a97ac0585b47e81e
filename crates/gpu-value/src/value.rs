//! Value targets: the price ceiling under which a card is a good deal.

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::types::{BaselineSnapshot, GpuEntry};

/// `(baseline × rwa) × arch`.
pub fn value_target(baseline: f64, rwa: f64, arch: f64) -> f64 {
    (baseline * rwa) * arch
}

/// One row of the comparison table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRow {
    pub name: String,
    pub value_target: f64,
    pub market_price: f64,
    pub url: String,
    /// Whether the observed market price is at or under the value target.
    pub is_deal: bool,
}

impl ValueRow {
    pub fn for_entry(baseline: f64, gpu: &GpuEntry) -> Self {
        let target = value_target(baseline, gpu.rwa, gpu.arch);
        Self {
            name: gpu.name.clone(),
            value_target: target,
            market_price: gpu.market_price,
            url: gpu.url.clone(),
            is_deal: gpu.market_price <= target,
        }
    }
}

/// Compute one row per catalog entry against the snapshot's price.
pub fn compute_targets(snapshot: &BaselineSnapshot, catalog: &Catalog) -> Vec<ValueRow> {
    catalog
        .entries
        .iter()
        .map(|gpu| ValueRow::for_entry(snapshot.price, gpu))
        .collect()
}
