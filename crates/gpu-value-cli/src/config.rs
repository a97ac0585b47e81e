//! Configuration resolution for the dashboard.

use std::path::PathBuf;
use std::time::Duration;

use gpu_value::config::load_retailers;
use gpu_value::{BaselineConfig, ValueIndexResult};

/// Values given explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub ttl_secs: Option<u64>,
    pub timeout_ms: Option<u64>,
    pub retailers: Option<PathBuf>,
}

/// Resolve the baseline configuration: flag > `GPU_VALUE_*` env > default.
pub fn resolve_config(overrides: &ConfigOverrides) -> ValueIndexResult<BaselineConfig> {
    let mut config = BaselineConfig::from_env()?;

    if let Some(secs) = overrides.ttl_secs {
        config = config.with_ttl(Duration::from_secs(secs));
    }
    if let Some(ms) = overrides.timeout_ms {
        config = config.with_request_timeout(Duration::from_millis(ms));
    }
    if let Some(path) = &overrides.retailers {
        config = config.with_retailers(load_retailers(path)?);
    }

    config.validate()?;
    Ok(config)
}
