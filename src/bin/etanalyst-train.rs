use clap::Parser;
use etanalyst::config::{self, DEFAULT_LOG_LEVEL};
use etanalyst::logging::init_tracing;
use etanalyst::training::run_training;
use std::path::PathBuf;

/// Train the candidate regressors on a trip CSV and save the best one.
#[derive(Parser)]
#[command(name = "etanalyst-train")]
#[command(version)]
#[command(about = "Train and select the ETA model")]
#[command(long_about = None)]
struct Cli {
    /// Config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Training CSV (overrides [training].dataset_path)
    #[arg(long, short = 'd')]
    data: Option<PathBuf>,

    /// Artifact output path (overrides [training].output_path)
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Split and sampling seed (overrides [training].seed)
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match config::load_from_path(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            init_tracing(DEFAULT_LOG_LEVEL);
            tracing::error!(path = %cli.config.display(), error = %e, "Failed to load config");
            return Err(e.into());
        }
    };
    init_tracing(config.log_level());

    let dataset_path = cli.data.unwrap_or_else(|| config.dataset_path());
    let output_path = cli.output.unwrap_or_else(|| config.model_output_path());
    let mut options = config.training_options();
    if let Some(seed) = cli.seed {
        options.seed = seed;
    }

    let outcome = run_training(&dataset_path, &output_path, &options)?;
    for score in &outcome.scores {
        println!(
            "{:<20} cv_r2={:.4} holdout_r2={:.4}",
            score.name, score.cv_r2, score.holdout_r2
        );
    }
    let best = outcome.winner_score();
    println!(
        "Best model: {} (cv_r2={:.4}) saved to {}",
        best.name,
        best.cv_r2,
        output_path.display()
    );
    Ok(())
}
