//! Shuffle Matrix - reproducible dependency combinations for CI images
//!
//! The `shuffle` command picks one valid combination of dependency versions
//! for a seed and emits the image build configuration for it.
//!
//! ## Commands
//!
//! - `conf`: Emit the build configuration for a seed
//! - `params`: Show the combination selected for a seed
//! - `check`: Validate a single combination
//! - `rounds`: Show the first attempted rounds and their verdicts

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, Level};

use shuffle_core::{
    evaluate_combination, make_shuffle_conf, make_shuffle_conf_within, select, select_within,
    Combination, Configuration, MatrixFile, ShuffleRounds, Verdict,
};

#[derive(Parser)]
#[command(name = "shuffle")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Seeded dependency-matrix selection for CI images", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit the build configuration selected for a seed
    Conf {
        /// Selection seed
        #[arg(long, env = "SHUFFLE_SEED")]
        seed: u64,

        /// Matrix file (JSON). Uses the built-in matrix when omitted
        #[arg(long, env = "SHUFFLE_MATRIX")]
        matrix: Option<PathBuf>,

        /// Give up after this many rejected rounds
        #[arg(long)]
        max_rounds: Option<u64>,

        /// Write the configuration here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the combination selected for a seed
    Params {
        /// Selection seed
        #[arg(long, env = "SHUFFLE_SEED")]
        seed: u64,

        /// Matrix file (JSON). Uses the built-in matrix when omitted
        #[arg(long, env = "SHUFFLE_MATRIX")]
        matrix: Option<PathBuf>,

        /// Give up after this many rejected rounds
        #[arg(long)]
        max_rounds: Option<u64>,
    },

    /// Validate one combination read from a JSON file
    Check {
        /// Combination file (JSON object of axis name to value)
        #[arg(long)]
        combo: PathBuf,

        /// Matrix file supplying extra base-image interpreter versions
        #[arg(long, env = "SHUFFLE_MATRIX")]
        matrix: Option<PathBuf>,
    },

    /// Show the first attempted rounds for a seed and their verdicts
    Rounds {
        /// Selection seed
        #[arg(long, env = "SHUFFLE_SEED")]
        seed: u64,

        /// Number of rounds to show
        #[arg(short, long, default_value = "10")]
        count: usize,

        /// Matrix file (JSON). Uses the built-in matrix when omitted
        #[arg(long, env = "SHUFFLE_MATRIX")]
        matrix: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    shuffle_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Conf {
            seed,
            matrix,
            max_rounds,
            output,
        } => cmd_conf(seed, matrix.as_deref(), max_rounds, output.as_deref()),
        Commands::Params {
            seed,
            matrix,
            max_rounds,
        } => cmd_params(seed, matrix.as_deref(), max_rounds),
        Commands::Check { combo, matrix } => cmd_check(&combo, matrix.as_deref()),
        Commands::Rounds {
            seed,
            count,
            matrix,
        } => cmd_rounds(seed, count, matrix.as_deref()),
    }
}

/// Configuration plus its digest, as printed by `shuffle conf`.
#[derive(Debug, Serialize)]
struct ConfOutput {
    digest: String,
    configuration: Configuration,
}

/// One line of `shuffle rounds` output.
#[derive(Debug, Serialize)]
struct RoundOutput {
    round: usize,
    combination: Combination,
    #[serde(flatten)]
    verdict: Verdict,
}

fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {:?}", path))
}

fn load_matrix(path: Option<&Path>) -> Result<MatrixFile> {
    match path {
        Some(path) => MatrixFile::from_path(path)
            .with_context(|| format!("Failed to load matrix file {:?}", path)),
        None => Ok(MatrixFile::builtin()),
    }
}

fn build_conf(seed: u64, matrix: &MatrixFile, max_rounds: Option<u64>) -> Result<ConfOutput> {
    let lookup = matrix.lookup();
    let configuration = match max_rounds {
        Some(limit) => make_shuffle_conf_within(&matrix.axes, seed, &lookup, limit),
        None => make_shuffle_conf(&matrix.axes, seed, &lookup),
    }
    .with_context(|| format!("No configuration for seed {}", seed))?;
    let digest = configuration.digest()?;
    Ok(ConfOutput {
        digest,
        configuration,
    })
}

fn selected_params(seed: u64, matrix: &MatrixFile, max_rounds: Option<u64>) -> Result<Combination> {
    let lookup = matrix.lookup();
    let params = match max_rounds {
        Some(limit) => select_within(&matrix.axes, seed, &lookup, limit),
        None => select(&matrix.axes, seed, &lookup),
    };
    params.with_context(|| format!("No valid combination for seed {}", seed))
}

fn check_combo(combo: &Combination, matrix: &MatrixFile) -> Verdict {
    evaluate_combination(combo, &matrix.lookup())
}

fn attempted_rounds(seed: u64, count: usize, matrix: &MatrixFile) -> Vec<RoundOutput> {
    let lookup = matrix.lookup();
    ShuffleRounds::new(&matrix.axes, seed)
        .take(count)
        .enumerate()
        .map(|(round, combination)| {
            let verdict = evaluate_combination(&combination, &lookup);
            RoundOutput {
                round,
                combination,
                verdict,
            }
        })
        .collect()
}

fn cmd_conf(
    seed: u64,
    matrix: Option<&Path>,
    max_rounds: Option<u64>,
    output: Option<&Path>,
) -> Result<()> {
    let matrix = load_matrix(matrix)?;
    let conf = build_conf(seed, &matrix, max_rounds)?;
    let json = serde_json::to_string_pretty(&conf)?;

    if let Some(path) = output {
        std::fs::write(path, &json).with_context(|| format!("Failed to write to {:?}", path))?;
        info!(path = %path.display(), digest = %conf.digest, "Wrote configuration");
    } else {
        println!("{}", json);
    }
    Ok(())
}

fn cmd_params(seed: u64, matrix: Option<&Path>, max_rounds: Option<u64>) -> Result<()> {
    let matrix = load_matrix(matrix)?;
    let params = selected_params(seed, &matrix, max_rounds)?;
    println!("{}", serde_json::to_string_pretty(&params)?);
    Ok(())
}

fn cmd_check(combo: &Path, matrix: Option<&Path>) -> Result<()> {
    let matrix = load_matrix(matrix)?;
    let combo: Combination = read_json_file(combo)?;
    let verdict = check_combo(&combo, &matrix);
    println!("{}", serde_json::to_string_pretty(&verdict)?);

    if let Some(reason) = verdict.reason() {
        bail!("Combination rejected: {}", reason);
    }
    Ok(())
}

fn cmd_rounds(seed: u64, count: usize, matrix: Option<&Path>) -> Result<()> {
    let matrix = load_matrix(matrix)?;
    for round in attempted_rounds(seed, count, &matrix) {
        println!("{}", serde_json::to_string(&round)?);
    }
    Ok(())
}
