use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use trajectory_engine::collaborators::{InMemoryHistory, InMemoryIndex};
use trajectory_engine::config::EngineConfig;
use trajectory_engine::engine::TrajectoryEngine;
use trajectory_engine::models::ScoreResult;
use trajectory_engine::vector::VectorBuilder;

mod dataset;
mod report;

#[derive(Parser)]
#[command(name = "trajectory-engine")]
#[command(about = "Employability trajectory scoring against historical alumni outcomes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct ScoringArgs {
    /// JSON file with one scoring request or an array of them
    #[arg(long)]
    request: PathBuf,
    /// CSV file of alumni outcomes
    #[arg(long)]
    alumni: PathBuf,
    /// CSV file of past scores (subject_id, score, calculated_on)
    #[arg(long)]
    history: Option<PathBuf>,
    #[arg(long)]
    top_k: Option<usize>,
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Match against alumni of every major
    #[arg(long)]
    all_majors: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the feature vector for each request
    Vectorize {
        #[arg(long)]
        request: PathBuf,
    },
    /// Score subjects and print the results as JSON
    Score {
        #[command(flatten)]
        args: ScoringArgs,
    },
    /// Score subjects and write a markdown report
    Report {
        #[command(flatten)]
        args: ScoringArgs,
        #[arg(long)]
        label: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn load_config(args: &ScoringArgs) -> anyhow::Result<EngineConfig> {
    let mut config = EngineConfig::from_env().context("invalid TRAJECTORY_* environment")?;
    if let Some(top_k) = args.top_k {
        config.top_k = top_k;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.index_timeout = Duration::from_millis(timeout_ms);
    }
    if args.all_majors {
        config.filter_by_major = false;
    }
    Ok(config)
}

async fn score_requests(args: &ScoringArgs) -> anyhow::Result<Vec<ScoreResult>> {
    let config = load_config(args)?;
    let builder = VectorBuilder::new(config.decay_rate);
    let alumni = dataset::load_alumni(&args.alumni, &builder)?;
    let history = match &args.history {
        Some(path) => dataset::load_history(path)?,
        None => InMemoryHistory::new(),
    };
    let requests = dataset::load_requests(&args.request)?;

    tracing::info!(
        alumni = alumni.len(),
        requests = requests.len(),
        top_k = config.top_k,
        "loaded scoring inputs"
    );

    let engine = TrajectoryEngine::new(InMemoryIndex::new(alumni), config)?.with_history(history);
    let results = Arc::new(engine).predict_batch(requests).await?;
    Ok(results)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Vectorize { request } => {
            let config = EngineConfig::from_env().context("invalid TRAJECTORY_* environment")?;
            let engine = TrajectoryEngine::new(InMemoryIndex::default(), config)?;
            for request in dataset::load_requests(&request)? {
                let subject = engine.prepare(&request);
                println!(
                    "{}",
                    serde_json::json!({
                        "subject_id": subject.subject_id,
                        "vector": subject.vector,
                    })
                );
            }
        }
        Commands::Score { args } => {
            let results = score_requests(&args).await?;
            if results.is_empty() {
                println!("No scoring requests found.");
                return Ok(());
            }
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Commands::Report { args, label, out } => {
            let results = score_requests(&args).await?;
            let report = report::build_report(label.as_deref(), &results);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
