use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use faculty_match::config::Settings;
use faculty_match::evaluation::{evaluate, synthetic_cases, GroundTruthCase};
use faculty_match::models::ConfigOverlay;
use faculty_match::{MatchEngine, MatchRequest, Matcher, ModelHandle, WeightConfig};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Rank faculty for a student resume and evaluate ranking quality
#[derive(Debug, Parser)]
#[command(name = "faculty-match", version, about)]
struct Cli {
    /// Settings file; defaults to config/default.toml plus config/local.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rank the faculty of a JSON match request and print the response
    Rank {
        /// JSON file holding a resume, a faculty list and optional overrides
        #[arg(long)]
        request: PathBuf,
        /// Keep only the best N matches
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Evaluate ranking quality on labelled cases and print the report
    Evaluate {
        /// JSON file with ground-truth cases; the built-in synthetic set when omitted
        #[arg(long)]
        cases: Option<PathBuf>,
        /// Weight config (JSON or TOML) to compare against the default; repeatable
        #[arg(long = "weights")]
        weights: Vec<PathBuf>,
        /// Config overlay (JSON or TOML) with any of weights, domain_boosts,
        /// modifiers, providers and lexical_mode; repeatable
        #[arg(long = "candidate")]
        candidates: Vec<PathBuf>,
        /// Cutoff for precision, NDCG and diversity
        #[arg(long, default_value_t = 5)]
        k: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .context("failed to load configuration")?;

    init_logging(&settings.logging.level, &settings.logging.format);
    info!("Configuration loaded successfully");

    match cli.command {
        Command::Rank { request, top_k } => rank(&settings, &request, top_k).await,
        Command::Evaluate {
            cases,
            weights,
            candidates,
            k,
        } => run_evaluation(&settings, cases.as_deref(), &weights, &candidates, k).await,
    }
}

fn init_logging(level: &str, format: &str) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }
}

async fn rank(settings: &Settings, path: &Path, top_k: Option<usize>) -> Result<()> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read request {}", path.display()))?;
    let mut request: MatchRequest =
        serde_json::from_str(&contents).with_context(|| format!("invalid request {}", path.display()))?;
    if top_k.is_some() {
        request.options.top_k = top_k;
    }

    let engine = MatchEngine::from_settings(settings)?;
    let response = engine.rank(request).await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn run_evaluation(
    settings: &Settings,
    cases: Option<&Path>,
    weights: &[PathBuf],
    overlays: &[PathBuf],
    k: usize,
) -> Result<()> {
    let cases: Vec<GroundTruthCase> = match cases {
        Some(path) => {
            let contents = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read cases {}", path.display()))?;
            serde_json::from_str(&contents).with_context(|| format!("invalid cases {}", path.display()))?
        }
        None => synthetic_cases(),
    };

    let mut candidates: Vec<ConfigOverlay> = Vec::with_capacity(weights.len() + overlays.len());
    for path in weights {
        let weights: WeightConfig = load_file(path).await?;
        candidates.push(weights.into());
    }
    for path in overlays {
        candidates.push(load_file(path).await?);
    }

    let config = settings.scoring_config()?;
    let needs_model = config.providers.semantic
        || candidates
            .iter()
            .any(|c| c.providers.is_some_and(|p| p.semantic));
    let model = if needs_model {
        ModelHandle::new(settings.embedding_backend()?).get().await
    } else {
        None
    };
    let mut matcher = Matcher::new(config).with_model(model);
    if let Some(pool_size) = settings.engine_options().pool_size {
        matcher = matcher.with_pool_size(pool_size)?;
    }

    let report = tokio::task::spawn_blocking(move || evaluate(&matcher, &cases, &candidates, k)).await??;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn load_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    let value = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&contents).with_context(|| format!("invalid {}", path.display()))?,
        Some("toml") => toml::from_str(&contents).with_context(|| format!("invalid {}", path.display()))?,
        _ => bail!("{} must be .json or .toml", path.display()),
    };
    Ok(value)
}
