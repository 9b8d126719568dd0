/*
 * Mini disk infiltrometer data reduction tool
 *
 * Reads a CSV of infiltrometer runs, fits the infiltration law per point
 * and writes the augmented table. See lib.rs for the library surface.
 */

mod cli;
mod logging;

use std::path::Path;
use std::process;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use cli::{AnalyzeArgs, ClassifyArgs, Cli, Command, InputArgs, QueryArgs};
use infiltrometer_toolbox::{
    analyze, classify, lookup, read_records, write_table, Analysis, AnalysisConfig, QueryRow,
};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Analyze(args) => run_analyze(&args),
        Command::Classify(args) => run_classify(&args),
        Command::Query(args) => run_query(&args),
    }
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            AnalysisConfig::load(path)
                .with_context(|| format!("failed to load config from {}", path.display()))
        }
        None => Ok(AnalysisConfig::default()),
    }
}

fn delimiter(input: &InputArgs) -> Result<u8> {
    u8::try_from(input.delimiter)
        .with_context(|| format!("delimiter {:?} is not a single byte", input.delimiter))
}

fn load_and_analyze(input: &InputArgs) -> Result<Analysis> {
    let mut config = load_config(input.config.as_deref())?;
    if input.seed.is_some() {
        config.seed = input.seed;
    }
    let records = read_records(&input.input, delimiter(input)?)
        .with_context(|| format!("failed to read {}", input.input.display()))?;
    if records.is_empty() {
        bail!("{} holds no records", input.input.display());
    }
    Ok(analyze(records, &config))
}

fn run_analyze(args: &AnalyzeArgs) -> Result<()> {
    let analysis = load_and_analyze(&args.input)?;
    write_table(&analysis, &args.output, delimiter(&args.input)?)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    let summary = analysis.summary();
    println!("Processed {} records", summary.records);
    println!("  fitted:            {}", summary.fitted);
    println!("  with sorptivity:   {}", summary.with_sorptivity);
    println!("  with conductivity: {}", summary.with_conductivity);
    println!("  with Horton:       {}", summary.with_horton);
    println!("  excluded:          {}", summary.excluded);
    println!("Output written to: {}", args.output.display());
    Ok(())
}

fn run_classify(args: &ClassifyArgs) -> Result<()> {
    let Some(texture) = classify(args.sand, args.clay) else {
        bail!(
            "sand {}% and clay {}% do not form a valid composition",
            args.sand,
            args.clay
        );
    };
    let soil = lookup(texture);
    println!("Texture: {texture}");
    println!("  alpha: {}", soil.alpha);
    println!("  n:     {}", soil.n);
    Ok(())
}

fn print_rows(rows: &[QueryRow], unit: &str) {
    for row in rows.iter().filter(|r| r.included) {
        match row.value {
            Some(v) => println!("{}\t{v} {unit}", row.point),
            None => println!("{}\tundefined", row.point),
        }
    }
}

fn run_query(args: &QueryArgs) -> Result<()> {
    let analysis = load_and_analyze(&args.input)?;
    let point = args.point.as_deref();
    if args.rate {
        print_rows(&analysis.infiltration_rate_at(args.time, point)?, "cm/s");
    } else {
        print_rows(&analysis.infiltration_at(args.time, point)?, "cm");
    }
    Ok(())
}
