//! Radeon Value Index dashboard — renders the live baseline and value targets.

pub mod config;
pub mod render;

pub use config::{resolve_config, ConfigOverrides};
pub use render::{format_price, render_banner, render_probes, render_table};
