//! Batch entry point — load, transform, write, describe.
//!
//! `process()` is what the CLI calls. Each stage consumes the previous
//! stage's output by value, so the raw tables are gone before the sink runs.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, info_span};

use favorita_core::{run_pipeline, IntegrityError, PipelineReport};

use crate::config::{ConfigError, PipelineConfig};
use crate::data_loader::{load_raw_tables, LoadError};
use crate::export::{write_manifest, write_table, ExportError, OutputFormat, RunManifest};

/// Errors from a batch run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("load error: {0}")]
    Load(#[from] LoadError),
    #[error("data integrity error: {0}")]
    Integrity(#[from] IntegrityError),
    #[error("export error: {0}")]
    Export(#[from] ExportError),
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct ProcessSummary {
    pub output_path: PathBuf,
    pub manifest_path: PathBuf,
    pub format: OutputFormat,
    pub manifest: RunManifest,
    pub report: PipelineReport,
}

/// Run the whole batch described by `config`.
pub fn process(config: &PipelineConfig) -> Result<ProcessSummary, RunError> {
    config.validate()?;
    let window = config.window();
    let output_path = config.output_path();
    let _span = info_span!("process", data_folder = %config.data_folder.display()).entered();

    let raw = load_raw_tables(&config.data_folder)?;
    let output = run_pipeline(raw, window)?;

    let format = write_table(&output_path, &output.rows)?;
    let manifest = RunManifest::new(&output_path, format, &output.rows, &output.report);
    drop(output.rows);
    let manifest_path = write_manifest(&manifest)?;

    info!(
        output = %output_path.display(),
        rows = manifest.rows,
        hash = %manifest.table_hash,
        "run complete"
    );

    Ok(ProcessSummary {
        output_path,
        manifest_path,
        format,
        manifest,
        report: output.report,
    })
}
