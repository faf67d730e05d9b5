//! Favorita Runner — batch orchestration around `favorita-core`.
//!
//! This crate adds the file-facing layers:
//! - TOML configuration with the default window and data folder
//! - CSV loading of the six Kaggle relations, with header checks
//! - CSV or Parquet sink with atomic writes
//! - Run manifest sidecar (counts, join matches, content hash)

pub mod config;
pub mod data_loader;
pub mod export;
pub mod process;

pub use config::{ConfigError, PipelineConfig};
pub use data_loader::{load_raw_tables, LoadError};
pub use export::{
    manifest_path, read_manifest, write_table, ExportError, OutputFormat, RunManifest,
};
pub use process::{process, ProcessSummary, RunError};
