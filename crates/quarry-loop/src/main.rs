//! `quarry`: run the active-learning loop against an annotation store.
//!
//! Configuration is read from the TOML file named by `QUARRY_CONFIG`, else
//! `./quarry.toml` when present, else built-in defaults. Ctrl-C stops the run
//! after writing a learner snapshot.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use quarry_core::config::QuarryConfig;
use quarry_core::constants::CONFIG_ENV_VAR;
use quarry_core::traits::{AnnotationStore, Cancellable, CancellationToken};
use quarry_learner::{load_jsonl, HashingVectorizer, NearestCentroid, PoolBasedActiveLearner, Strategy};
use quarry_loop::tracing_setup::init_tracing;
use quarry_loop::{ActiveLearningLoop, LoopSettings, RunOutcome};
use quarry_store::{InMemoryStore, SqliteStore};

const DEFAULT_CONFIG_FILE: &str = "quarry.toml";

#[derive(Parser)]
#[command(name = "quarry", version, about = "Human-in-the-loop active learning")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Seed the learner, then query, publish, and poll until interrupted
    Run,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run => run(),
    }
}

fn load_config() -> anyhow::Result<QuarryConfig> {
    let path = match std::env::var(CONFIG_ENV_VAR) {
        Ok(path) => path,
        Err(_) if Path::new(DEFAULT_CONFIG_FILE).exists() => DEFAULT_CONFIG_FILE.to_string(),
        Err(_) => return Ok(QuarryConfig::default()),
    };
    QuarryConfig::from_file(Path::new(&path)).with_context(|| format!("loading config from {path}"))
}

fn open_store(config: &QuarryConfig) -> anyhow::Result<Arc<dyn AnnotationStore>> {
    match config.store.backend.as_str() {
        "memory" => Ok(Arc::new(InMemoryStore::new())),
        _ => {
            let path = Path::new(&config.store.db_path);
            let store = SqliteStore::open(path)
                .with_context(|| format!("opening annotation store {}", path.display()))?;
            Ok(Arc::new(store))
        }
    }
}

fn run() -> anyhow::Result<()> {
    let config = load_config()?;
    init_tracing(&config.observability);

    let token = CancellationToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || {
        tracing::info!(event = "interrupt_received", "Ctrl-C received, stopping after snapshot");
        handler_token.cancel();
    })
    .context("installing Ctrl-C handler")?;

    let store = open_store(&config)?;
    let vectorizer = HashingVectorizer::new(config.learner.feature_dimensions);
    let dataset_path = Path::new(&config.session.dataset_path);
    let dataset = Arc::new(
        load_jsonl(dataset_path, &vectorizer, None)
            .with_context(|| format!("loading dataset {}", dataset_path.display()))?,
    );

    let settings = LoopSettings::from_config(&config)?;
    let snapshot = settings.snapshot_path.clone();
    let resume = config.session.resume && snapshot.exists();
    let learner: PoolBasedActiveLearner<NearestCentroid, Strategy> = if resume {
        PoolBasedActiveLearner::load(&snapshot, dataset.clone())
            .with_context(|| format!("restoring learner from {}", snapshot.display()))?
    } else {
        PoolBasedActiveLearner::new(
            dataset.clone(),
            NearestCentroid::new(dataset.num_classes(), config.learner.temperature),
            Strategy::from_name(&config.learner.strategy, config.learner.rng_seed)?,
        )
    };

    let mut session = ActiveLearningLoop::new(store, learner, dataset, settings);
    if resume {
        session = session.resumed();
    }
    tracing::info!(
        event = "run_started",
        run_id = %session.run_id(),
        resumed = resume,
        "starting active learning run"
    );

    match session.run(&token)? {
        RunOutcome::Interrupted {
            snapshot,
            batches_completed,
        } => {
            println!(
                "Interrupted after {batches_completed} batches. Active learner saved to {}",
                snapshot.display()
            );
        }
        RunOutcome::Completed {
            snapshot,
            batches_completed,
            reason,
        } => {
            println!(
                "Finished ({}) after {batches_completed} batches. Active learner saved to {}",
                reason.as_str(),
                snapshot.display()
            );
        }
    }
    Ok(())
}
