//! The static GPU catalog compared against the live baseline.
//!
//! The built-in catalog is embedded at compile time from `catalog.json`. All
//! cards are 16 GB Radeon parts; the baseline card itself is never listed.

use serde::{Deserialize, Serialize};

use crate::error::{ValueIndexError, ValueIndexResult};
use crate::types::{BaselineGpu, GpuEntry};

const CATALOG_JSON: &str = include_str!("catalog.json");

/// Upper bound for a plausible relative performance weight.
const MAX_RWA: f64 = 3.0;
/// Upper bound for a plausible architecture retention multiplier.
const MAX_ARCH: f64 = 1.5;

/// Radeon architecture generations, identified from the model number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generation {
    Rdna4,
    Rdna3,
    Rdna2,
}

impl Generation {
    /// Infer the generation from a card name such as `"RX 7800 XT (16GB)"`.
    pub fn from_name(name: &str) -> Option<Self> {
        if name.contains("RX 9") {
            Some(Generation::Rdna4)
        } else if name.contains("RX 7") {
            Some(Generation::Rdna3)
        } else if name.contains("RX 6") {
            Some(Generation::Rdna2)
        } else {
            None
        }
    }

    /// The architecture retention every card of this generation must carry.
    pub fn arch_retention(self) -> f64 {
        match self {
            Generation::Rdna4 => 1.00,
            Generation::Rdna3 => 0.91,
            Generation::Rdna2 => 0.73,
        }
    }
}

/// Baseline card plus the cards valued against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub baseline: BaselineGpu,
    pub entries: Vec<GpuEntry>,
}

impl Catalog {
    /// The catalog compiled into the binary.
    pub fn builtin() -> ValueIndexResult<Self> {
        Self::from_json(CATALOG_JSON)
    }

    /// Parse and validate a catalog from JSON.
    pub fn from_json(json: &str) -> ValueIndexResult<Self> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check the catalog's structural and range invariants.
    pub fn validate(&self) -> ValueIndexResult<()> {
        if self.entries.is_empty() {
            return Err(invalid("catalog has no entries".to_string()));
        }
        if !self.baseline.name.contains("16GB") {
            return Err(invalid(format!(
                "baseline {} is not a 16GB card",
                self.baseline.name
            )));
        }

        for gpu in &self.entries {
            let name = &gpu.name;
            if *name == self.baseline.name {
                return Err(invalid(format!("baseline card {name} is listed as an entry")));
            }
            if !name.contains("16GB") {
                return Err(invalid(format!("{name}: not a 16GB card")));
            }
            if !gpu.url.starts_with("https://www.amd.com/") {
                return Err(invalid(format!("{name}: reference URL is not on www.amd.com")));
            }
            if !(gpu.rwa > 0.0 && gpu.rwa <= MAX_RWA) {
                return Err(invalid(format!("{name}: RWA {} out of range", gpu.rwa)));
            }
            if !(gpu.arch > 0.0 && gpu.arch <= MAX_ARCH) {
                return Err(invalid(format!("{name}: Arch {} out of range", gpu.arch)));
            }
            if !(gpu.market_price > 0.0) {
                return Err(invalid(format!("{name}: market price must be positive")));
            }
            if let Some(generation) = Generation::from_name(name) {
                let expected = generation.arch_retention();
                if (gpu.arch - expected).abs() > 1e-9 {
                    return Err(invalid(format!(
                        "{name}: Arch {} does not match {generation:?} retention {expected}",
                        gpu.arch
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn invalid(message: String) -> ValueIndexError {
    ValueIndexError::InvalidConfig(message)
}
