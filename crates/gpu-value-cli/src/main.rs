//! Radeon Value Index dashboard — entry point.

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use gpu_value::{compute_targets, install_shared_cache, shared_cache, Catalog};
use gpu_value_cli::{render_banner, render_probes, render_table, resolve_config, ConfigOverrides};

#[derive(Parser)]
#[command(
    name = "gpu-value",
    about = "Radeon Value Index — value targets for 16GB Radeon cards against a live baseline",
    version
)]
struct Cli {
    /// Output results as JSON (machine-readable).
    #[arg(long, global = true)]
    json: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Baseline cache time-to-live in seconds.
    /// Also reads from GPU_VALUE_TTL_SECS.
    #[arg(long, global = true)]
    ttl_secs: Option<u64>,

    /// Per-retailer request timeout in milliseconds.
    /// Also reads from GPU_VALUE_TIMEOUT_MS.
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// JSON retailer table replacing the built-in one.
    /// Also reads from GPU_VALUE_RETAILERS.
    #[arg(long, global = true)]
    retailers: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the baseline and the value table (default).
    Table,

    /// Show only the resolved baseline.
    Baseline,

    /// Probe every retailer once and report what each returned.
    Probe,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   gpu-value completions bash > ~/.local/share/bash-completion/completions/gpu-value
    ///   gpu-value completions zsh > ~/.zfunc/_gpu-value
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let json = cli.json;
    let result = run(cli).await;

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        if json {
            println!(
                "{}",
                serde_json::json!({
                    "error": true,
                    "message": format!("{e:#}"),
                })
            );
        } else {
            eprintln!("  Error: {e:#}");
        }
        std::process::exit(1);
    }

    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let overrides = ConfigOverrides {
        ttl_secs: cli.ttl_secs,
        timeout_ms: cli.timeout_ms,
        retailers: cli.retailers,
    };

    match cli.command.unwrap_or(Commands::Table) {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "gpu-value", &mut std::io::stdout());
        }

        Commands::Probe => {
            let config = resolve_config(&overrides).context("failed to resolve configuration")?;
            let resolver = config.build_http_resolver()?;
            let outcomes = resolver.probe_all().await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcomes)?);
            } else {
                println!("Retailer probes:");
                print!("{}", render_probes(&outcomes));
            }
        }

        command @ (Commands::Table | Commands::Baseline) => {
            let config = resolve_config(&overrides).context("failed to resolve configuration")?;
            install_shared_cache(config.build_cache()?)
                .map_err(|_| anyhow!("baseline cache was already initialised"))?;
            let catalog = Catalog::builtin().context("built-in GPU catalog is invalid")?;

            let snapshot = shared_cache().get().await;
            tracing::info!(
                "baseline £{:.2} from {}",
                snapshot.price,
                snapshot.retailer_name
            );

            let show_table = matches!(command, Commands::Table);
            let rows = if show_table {
                compute_targets(&snapshot, &catalog)
            } else {
                Vec::new()
            };

            if cli.json {
                let fallback = snapshot.is_fallback();
                let mut out = serde_json::json!({
                    "baseline_gpu": catalog.baseline,
                    "baseline": snapshot,
                    "fallback": fallback,
                });
                if show_table {
                    out["rows"] = serde_json::to_value(&rows)?;
                }
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print!("{}", render_banner(&snapshot, &catalog.baseline));
                if show_table {
                    println!();
                    print!("{}", render_table(&rows));
                }
            }
        }
    }

    Ok(())
}
