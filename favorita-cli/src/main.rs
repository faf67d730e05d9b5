//! Favorita CLI — consolidate the Kaggle sales files into one daily table.
//!
//! Commands:
//! - `process` — filter, regularize and enrich, then write the table and its manifest
//! - `inspect` — print the summary stored in a run manifest

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use favorita_core::DateWindow;
use favorita_runner::{manifest_path, process, read_manifest, PipelineConfig, RunManifest};

#[derive(Parser)]
#[command(
    name = "favorita",
    about = "Favorita CLI — daily sales trajectories with store, item, oil and holiday context"
)]
struct Cli {
    /// More log output (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the consolidated table from the raw CSV files.
    Process {
        /// Path to a TOML config file. Flags below override its values.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Folder holding train.csv, stores.csv, items.csv, oil.csv,
        /// transactions.csv and holidays_events.csv.
        #[arg(long)]
        data_folder: Option<PathBuf>,

        /// Output table. A `.parquet` extension writes Parquet, anything else CSV.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Inclusive window start (YYYY-MM-DD).
        #[arg(long, conflicts_with = "no_start")]
        start: Option<String>,

        /// Exclusive window end (YYYY-MM-DD).
        #[arg(long, conflicts_with = "no_end")]
        end: Option<String>,

        /// Do not bound the window from below.
        #[arg(long, default_value_t = false)]
        no_start: bool,

        /// Do not bound the window from above.
        #[arg(long, default_value_t = false)]
        no_end: bool,
    },
    /// Print the summary of a previous run.
    Inspect {
        /// The manifest file, or the output table it sits next to.
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Process {
            config,
            data_folder,
            output,
            start,
            end,
            no_start,
            no_end,
        } => {
            let config = build_config(
                config.as_deref(),
                data_folder,
                output,
                start.as_deref(),
                end.as_deref(),
                no_start,
                no_end,
            )?;
            run_process(&config)
        }
        Commands::Inspect { path } => run_inspect(&path),
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default_level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'"))
}

fn build_config(
    config_path: Option<&Path>,
    data_folder: Option<PathBuf>,
    output: Option<PathBuf>,
    start: Option<&str>,
    end: Option<&str>,
    no_start: bool,
    no_end: bool,
) -> Result<PipelineConfig> {
    let mut config = match config_path {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(folder) = data_folder {
        config.data_folder = folder;
    }
    if let Some(path) = output {
        config.output_path = Some(path);
    }
    if let Some(s) = start {
        config.start_date = Some(parse_date(s)?);
    }
    if let Some(e) = end {
        config.end_date = Some(parse_date(e)?);
    }
    if no_start {
        config.start_date = None;
    }
    if no_end {
        config.end_date = None;
    }
    Ok(config)
}

fn run_process(config: &PipelineConfig) -> Result<()> {
    let summary = process(config)?;
    print_summary(&summary.manifest);

    let warnings = &summary.report.warnings;
    for warning in &warnings.sample {
        println!("WARNING: {warning}");
    }
    if warnings.total > warnings.sample.len() {
        println!(
            "WARNING: {} more not shown",
            warnings.total - warnings.sample.len()
        );
    }
    println!("Manifest saved to: {}", summary.manifest_path.display());
    Ok(())
}

fn run_inspect(path: &Path) -> Result<()> {
    let is_manifest = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(".manifest.json"));
    let manifest_file = if is_manifest {
        path.to_path_buf()
    } else {
        manifest_path(path)
    };
    let manifest = read_manifest(&manifest_file)?;
    print_summary(&manifest);
    Ok(())
}

fn fmt_window(window: &DateWindow) -> String {
    let side = |d: Option<NaiveDate>| d.map_or_else(|| "open".to_string(), |d| d.to_string());
    format!("[{}, {})", side(window.start), side(window.end))
}

fn print_summary(manifest: &RunManifest) {
    println!();
    println!("=== Favorita Run ===");
    println!("Output:         {}", manifest.output_path.display());
    println!("Format:         {:?}", manifest.format);
    println!("Created:        {}", manifest.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!("Window:         {}", fmt_window(&manifest.window));
    println!("Rows:           {}", manifest.rows);
    println!(
        "Trajectories:   {} ({} dropped for returns)",
        manifest.trajectories, manifest.dropped_trajectories
    );
    println!("Synthetic rows: {}", manifest.synthetic_rows);
    println!("Warnings:       {}", manifest.warnings);
    println!();
    println!("--- Joins ---");
    for join in &manifest.joins {
        let total = join.matched + join.unmatched;
        let pct = if total == 0 {
            0.0
        } else {
            join.matched as f64 / total as f64 * 100.0
        };
        println!(
            "{:<16}{:>10} matched  {:>5.1}%",
            join.name, join.matched, pct
        );
    }
    println!();
    println!("Table hash:     {}", manifest.table_hash);
}
