use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Mini disk infiltrometer data reduction.
#[derive(Parser)]
#[command(
    name = "infiltrometer-toolbox",
    version,
    about = "Sorptivity, conductivity and Horton parameters from mini disk infiltrometer runs"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Analyse every record of a CSV file and write the augmented table.
    Analyze(AnalyzeArgs),
    /// Classify a soil composition and show its van Genuchten parameters.
    Classify(ClassifyArgs),
    /// Evaluate the fitted infiltration law at a time.
    Query(QueryArgs),
}

#[derive(clap::Args)]
pub struct InputArgs {
    /// Input CSV with one row per measurement point.
    pub input: PathBuf,

    /// Path to TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the RNG seed from the config.
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Field delimiter of the input CSV.
    #[arg(short, long, default_value_t = ',')]
    pub delimiter: char,
}

#[derive(clap::Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output CSV path.
    #[arg(short, long, default_value = "output.csv")]
    pub output: PathBuf,
}

#[derive(clap::Args)]
pub struct ClassifyArgs {
    /// Sand content [%].
    #[arg(long)]
    pub sand: f64,

    /// Clay content [%].
    #[arg(long)]
    pub clay: f64,
}

#[derive(clap::Args)]
pub struct QueryArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Elapsed time [s].
    #[arg(short, long)]
    pub time: f64,

    /// Restrict the query to one point.
    #[arg(short, long)]
    pub point: Option<String>,

    /// Report dI/dt instead of I.
    #[arg(long)]
    pub rate: bool,
}
