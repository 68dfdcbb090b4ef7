#[macro_use]
extern crate log;

use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use dotenv::dotenv;
use nightscore::{
    Dataset, NightInput, NightPool, ScoringArgs, provider_for,
    report::{MetricsReport, SweepRows},
};
use nightscore_algos::{NightAggregator, classify_norm, default_grid};
use nightscore_types::NormMetric;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "nightscore")]
pub struct NightscoreCli {
    #[clap(subcommand)]
    pub subcommand: NightscoreCommand,
}

#[derive(Args, Clone, Debug)]
pub struct DatasetArgs {
    /// JSON file with subjects, their recordings and diaries
    #[arg(env, long)]
    pub dataset: PathBuf,
    /// Write the report here as JSON instead of printing it
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum NightscoreCommand {
    ///
    /// Score every diary night and summarize per subject
    ///
    Metrics {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[command(flatten)]
        scoring: ScoringArgs,
    },
    ///
    /// Compare predictions with the diary at one decision threshold
    ///
    Validate {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[command(flatten)]
        scoring: ScoringArgs,
        #[arg(long, default_value_t = 0.5)]
        threshold: f64,
    },
    ///
    /// Sweep decision thresholds and report the most accurate one
    ///
    Sweep {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[command(flatten)]
        scoring: ScoringArgs,
        /// Comma separated, defaults to 0.1 through 1.0
        #[arg(long, value_delimiter = ',')]
        thresholds: Vec<f64>,
    },
    ///
    /// Classify a single value against the age-adjusted norms
    ///
    Norm {
        #[arg(long)]
        age: f64,
        #[arg(long)]
        metric: NormMetric,
        /// Minutes for sol and waso, percent for se, a count for awk5plus
        value: f64,
    },
    ///
    /// Print shell completions
    ///
    Completions { shell: Shell },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(error) = dotenv() {
        println!("{}", error);
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = NightscoreCli::parse();
    match cli.subcommand {
        NightscoreCommand::Metrics { dataset, scoring } => {
            let nights = load_nights(&dataset.dataset, &scoring)?;
            let pool = NightPool::new(scoring.workers());
            let scored = pool.score(nights.clone(), scoring.scoring_config()).await?;
            let subjects = NightAggregator::aggregate(&scored);
            let report = MetricsReport::new(&nights, &scored, &subjects);

            match dataset.output {
                Some(path) => write_json(&path, &report)?,
                None => {
                    for night in &report.nights {
                        println!("{}", night);
                    }
                    for subject in &report.subjects {
                        println!("\n{}", subject);
                    }
                }
            }
            Ok(())
        }
        NightscoreCommand::Validate {
            dataset,
            scoring,
            threshold,
        } => {
            sweep(&dataset, &scoring, &[threshold]).await
        }
        NightscoreCommand::Sweep {
            dataset,
            scoring,
            thresholds,
        } => {
            let thresholds = if thresholds.is_empty() {
                default_grid()
            } else {
                thresholds
            };
            sweep(&dataset, &scoring, &thresholds).await
        }
        NightscoreCommand::Norm { age, metric, value } => {
            let band = classify_norm(age, metric, value);
            println!("{metric} {value} at age {age}: {band:?} ({})", band.value());
            Ok(())
        }
        NightscoreCommand::Completions { shell } => {
            let mut command = NightscoreCli::command();
            clap_complete::generate(shell, &mut command, "nightscore", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn load_nights(path: &Path, scoring: &ScoringArgs) -> anyhow::Result<Vec<NightInput>> {
    let dataset = Dataset::load(path)?;
    let provider = provider_for(scoring.signal_source, scoring.angle_config());
    let margin = scoring.scoring_config().smoothing.search_margin;
    let nights = dataset.nights(provider.as_ref(), margin);
    info!(
        "{} nights of {} subjects, {} signal",
        nights.len(),
        dataset.subjects.len(),
        scoring.signal_source
    );
    Ok(nights)
}

async fn sweep(dataset: &DatasetArgs, scoring: &ScoringArgs, thresholds: &[f64]) -> anyhow::Result<()> {
    let nights = load_nights(&dataset.dataset, scoring)?
        .iter()
        .map(NightInput::validation_night)
        .collect();
    let report = NightPool::new(scoring.workers())
        .sweep(nights, thresholds)
        .await?;
    let rows = SweepRows::from(&report);

    match &dataset.output {
        Some(path) => write_json(path, &rows),
        None => {
            println!("{}", rows);
            Ok(())
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)?;
    info!("report written to {}", path.display());
    Ok(())
}
