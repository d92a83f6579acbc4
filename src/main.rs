//! Lunar Dream ETL binary entrypoint.
//! Collects dream reports, curates them per symbol and writes the corpus artifacts.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lunar_dream_etl::config::DEFAULT_CONFIG_PATH;
use lunar_dream_etl::metrics::Metrics;
use lunar_dream_etl::{AppConfig, Pipeline, PipelineError, Secrets};

#[derive(Debug, Parser)]
#[command(name = "lunar-dream-etl", version, about = "Curated dream-symbol corpus builder")]
struct Args {
    /// Sources file (.toml, .json, .yml/.yaml).
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Line-delimited output (overrides `[output].jsonl`).
    #[arg(long)]
    outl: Option<PathBuf>,

    /// Array output (overrides `[output].json`).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Write Prometheus metrics to this file at the end of the run.
    #[arg(long, env = "METRICS_TEXTFILE")]
    metrics_textfile: Option<PathBuf>,

    /// Collect and curate, but do not write the corpus.
    #[arg(long)]
    dry_run: bool,
}

/// Compact logs by default; `LOG_FORMAT=json` for structured output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("lunar_dream_etl=info,warn"));

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

fn load_config(args: &Args) -> Result<AppConfig, PipelineError> {
    let mut cfg = AppConfig::load_from(&args.config)?;
    if let Some(p) = &args.outl {
        cfg.output.jsonl = p.clone();
    }
    if let Some(p) = &args.out {
        cfg.output.json = p.clone();
    }
    cfg.validate()?;
    Ok(cfg)
}

async fn run(args: Args) -> Result<(), PipelineError> {
    let cfg = load_config(&args)?;
    let secrets = Secrets::from_env();
    tracing::debug!(?secrets, enabled = cfg.sources.enabled_count(), "config loaded");

    let metrics = match &args.metrics_textfile {
        Some(_) => match Metrics::install() {
            Ok(m) => Some(m),
            Err(e) => {
                tracing::warn!(error = ?e, "metrics disabled");
                None
            }
        },
        None => None,
    };

    let result = Pipeline::from_config(cfg, &secrets).run(args.dry_run).await;

    if let (Some(m), Some(path)) = (&metrics, &args.metrics_textfile) {
        if let Err(e) = m
            .write_textfile(path)
            .with_context(|| format!("metrics textfile {}", path.display()))
        {
            tracing::warn!(error = ?e, "could not write metrics");
        }
    }
    result.map(|_| ())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            eprintln!("lunar-dream-etl: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
