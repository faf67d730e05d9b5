//! Sink — the consolidated table as CSV or Parquet, plus a run manifest.
//!
//! The format follows the output extension: `.parquet` writes a typed Polars
//! frame, anything else writes CSV. Both paths write to `<output>.tmp` and
//! rename into place, so a failed run never leaves a half-written table.
//!
//! The manifest sidecar `<output>.manifest.json` carries a `schema_version`.
//! Unknown versions are rejected on load.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use favorita_core::domain::{EnrichedRecord, StoreInfo};
use favorita_core::enrich::JoinStat;
use favorita_core::fingerprint::table_hash;
use favorita_core::{DateWindow, PipelineReport};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Current manifest layout.
pub const SCHEMA_VERSION: u32 = 1;

/// Output columns, in order.
pub const COLUMNS: [&str; 24] = [
    "unique_id",
    "trajectory_id",
    "date",
    "store_nbr",
    "item_nbr",
    "unit_sales",
    "log_sales",
    "is_open",
    "onpromotion",
    "oil_index",
    "city",
    "state",
    "store_type",
    "cluster",
    "family",
    "class",
    "perishable",
    "transaction_count",
    "day_of_week",
    "day_of_month",
    "month",
    "national_holiday",
    "regional_holiday",
    "local_holiday",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("parquet error: {0}")]
    Parquet(String),

    #[error("manifest error: {0}")]
    Manifest(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("parquet") => Self::Parquet,
            _ => Self::Csv,
        }
    }
}

/// Write the table to `path`, creating parent directories as needed.
pub fn write_table(path: &Path, rows: &[EnrichedRecord]) -> Result<OutputFormat, ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ExportError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let format = OutputFormat::from_path(path);
    let tmp_path = with_suffix(path, ".tmp");
    let written = match format {
        OutputFormat::Csv => write_csv(&tmp_path, rows),
        OutputFormat::Parquet => rows_to_dataframe(rows).and_then(|df| write_parquet(df, &tmp_path)),
    };
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    // Atomic rename
    fs::rename(&tmp_path, path).map_err(|source| {
        let _ = fs::remove_file(&tmp_path);
        ExportError::Io {
            path: path.to_path_buf(),
            source,
        }
    })?;
    debug!(path = %path.display(), ?format, rows = rows.len(), "table written");
    Ok(format)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

// ─── CSV ────────────────────────────────────────────────────────────

fn write_csv(path: &Path, rows: &[EnrichedRecord]) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(COLUMNS)?;
    for r in rows {
        wtr.write_record(csv_record(r))?;
    }
    wtr.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// One row as text. Absent values become empty cells; booleans are `1`/`0`.
fn csv_record(r: &EnrichedRecord) -> Vec<String> {
    let u = &r.unit;
    let store = r.store.as_deref();
    let item = r.item.as_deref();
    vec![
        u.unique_id.clone(),
        u.trajectory_id.to_string(),
        u.date.format("%Y-%m-%d").to_string(),
        u.store_nbr.to_string(),
        u.item_nbr.to_string(),
        u.unit_sales.to_string(),
        opt_cell(u.log_sales),
        flag(u.is_open).to_string(),
        opt_cell(u.onpromotion.map(flag)),
        r.oil_index.to_string(),
        opt_cell(store.map(|s| s.city.as_str())),
        opt_cell(store.map(|s| s.state.as_str())),
        opt_cell(store.map(|s| s.store_type.as_str())),
        opt_cell(store.map(|s| s.cluster)),
        opt_cell(item.map(|i| i.family.as_str())),
        opt_cell(item.map(|i| i.class)),
        opt_cell(item.map(|i| i.perishable)),
        r.transaction_count.to_string(),
        r.calendar.day_of_week.to_string(),
        r.calendar.day_of_month.to_string(),
        r.calendar.month.to_string(),
        r.national_holiday.clone(),
        r.regional_holiday.clone(),
        r.local_holiday.clone(),
    ]
}

fn flag(b: bool) -> u8 {
    u8::from(b)
}

fn opt_cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

// ─── Parquet ────────────────────────────────────────────────────────

// NaiveDate's default is 1970-01-01.
fn days_since_epoch(date: NaiveDate) -> i32 {
    (date - NaiveDate::default()).num_days() as i32
}

fn store_text<'a>(
    rows: &'a [EnrichedRecord],
    field: for<'s> fn(&'s StoreInfo) -> &'s str,
) -> Vec<Option<&'a str>> {
    rows.iter().map(|r| r.store.as_deref().map(field)).collect()
}

/// Typed frame: dates as `Date`, absent values as nulls.
fn rows_to_dataframe(rows: &[EnrichedRecord]) -> Result<DataFrame, ExportError> {
    let unique_ids: Vec<&str> = rows.iter().map(|r| r.unit.unique_id.as_str()).collect();
    let trajectory_ids: Vec<&str> = rows.iter().map(|r| r.unit.trajectory_id.as_str()).collect();
    let dates: Vec<i32> = rows.iter().map(|r| days_since_epoch(r.unit.date)).collect();
    let store_nbrs: Vec<u32> = rows.iter().map(|r| r.unit.store_nbr).collect();
    let item_nbrs: Vec<u32> = rows.iter().map(|r| r.unit.item_nbr).collect();
    let unit_sales: Vec<f64> = rows.iter().map(|r| r.unit.unit_sales).collect();
    let log_sales: Vec<Option<f64>> = rows.iter().map(|r| r.unit.log_sales).collect();
    let is_open: Vec<bool> = rows.iter().map(|r| r.unit.is_open).collect();
    let onpromotion: Vec<Option<bool>> = rows.iter().map(|r| r.unit.onpromotion).collect();
    let oil: Vec<f64> = rows.iter().map(|r| r.oil_index).collect();
    let clusters: Vec<Option<u32>> = rows
        .iter()
        .map(|r| r.store.as_deref().map(|s| s.cluster))
        .collect();
    let families: Vec<Option<&str>> = rows
        .iter()
        .map(|r| r.item.as_deref().map(|i| i.family.as_str()))
        .collect();
    let classes: Vec<Option<u32>> = rows.iter().map(|r| r.item.as_deref().map(|i| i.class)).collect();
    let perishable: Vec<Option<u32>> = rows
        .iter()
        .map(|r| r.item.as_deref().map(|i| i.perishable))
        .collect();
    let transactions: Vec<f64> = rows.iter().map(|r| r.transaction_count).collect();
    let dow: Vec<u32> = rows.iter().map(|r| r.calendar.day_of_week).collect();
    let dom: Vec<u32> = rows.iter().map(|r| r.calendar.day_of_month).collect();
    let month: Vec<u32> = rows.iter().map(|r| r.calendar.month).collect();
    let national: Vec<&str> = rows.iter().map(|r| r.national_holiday.as_str()).collect();
    let regional: Vec<&str> = rows.iter().map(|r| r.regional_holiday.as_str()).collect();
    let local: Vec<&str> = rows.iter().map(|r| r.local_holiday.as_str()).collect();

    DataFrame::new(vec![
        Column::new("unique_id".into(), unique_ids),
        Column::new("trajectory_id".into(), trajectory_ids),
        Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| ExportError::Parquet(format!("date cast: {e}")))?,
        Column::new("store_nbr".into(), store_nbrs),
        Column::new("item_nbr".into(), item_nbrs),
        Column::new("unit_sales".into(), unit_sales),
        Column::new("log_sales".into(), log_sales),
        Column::new("is_open".into(), is_open),
        Column::new("onpromotion".into(), onpromotion),
        Column::new("oil_index".into(), oil),
        Column::new("city".into(), store_text(rows, |s| s.city.as_str())),
        Column::new("state".into(), store_text(rows, |s| s.state.as_str())),
        Column::new("store_type".into(), store_text(rows, |s| s.store_type.as_str())),
        Column::new("cluster".into(), clusters),
        Column::new("family".into(), families),
        Column::new("class".into(), classes),
        Column::new("perishable".into(), perishable),
        Column::new("transaction_count".into(), transactions),
        Column::new("day_of_week".into(), dow),
        Column::new("day_of_month".into(), dom),
        Column::new("month".into(), month),
        Column::new("national_holiday".into(), national),
        Column::new("regional_holiday".into(), regional),
        Column::new("local_holiday".into(), local),
    ])
    .map_err(|e| ExportError::Parquet(format!("dataframe creation: {e}")))
}

fn write_parquet(mut df: DataFrame, path: &Path) -> Result<(), ExportError> {
    let file = fs::File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .map_err(|e| ExportError::Parquet(format!("write parquet: {e}")))?;
    Ok(())
}

// ─── Manifest ───────────────────────────────────────────────────────

/// Sidecar describing one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: u32,
    pub created_at: NaiveDateTime,
    pub output_path: PathBuf,
    pub format: OutputFormat,
    pub window: DateWindow,
    pub rows: usize,
    pub trajectories: usize,
    pub synthetic_rows: usize,
    pub dropped_trajectories: usize,
    pub joins: Vec<JoinStat>,
    pub warnings: usize,
    pub table_hash: String,
}

impl RunManifest {
    pub fn new(
        output_path: &Path,
        format: OutputFormat,
        rows: &[EnrichedRecord],
        report: &PipelineReport,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            created_at: chrono::Local::now().naive_local(),
            output_path: output_path.to_path_buf(),
            format,
            window: report.window,
            rows: rows.len(),
            trajectories: report.trajectories,
            synthetic_rows: report.synthetic_rows,
            dropped_trajectories: report.filter.dropped_trajectories,
            joins: report.joins.joins.clone(),
            warnings: report.warnings.total,
            table_hash: table_hash(rows),
        }
    }
}

/// `<output>.manifest.json`
pub fn manifest_path(output: &Path) -> PathBuf {
    with_suffix(output, ".manifest.json")
}

pub fn write_manifest(manifest: &RunManifest) -> Result<PathBuf, ExportError> {
    let path = manifest_path(&manifest.output_path);
    let json = serde_json::to_string_pretty(manifest)
        .map_err(|e| ExportError::Manifest(format!("serialization: {e}")))?;
    let tmp_path = with_suffix(&path, ".tmp");
    fs::write(&tmp_path, json).map_err(|source| ExportError::Io {
        path: tmp_path.clone(),
        source,
    })?;
    fs::rename(&tmp_path, &path).map_err(|source| {
        let _ = fs::remove_file(&tmp_path);
        ExportError::Io {
            path: path.clone(),
            source,
        }
    })?;
    Ok(path)
}

/// Load a manifest, rejecting schema versions newer than this build knows.
pub fn read_manifest(path: &Path) -> Result<RunManifest, ExportError> {
    let json = fs::read_to_string(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let manifest: RunManifest = serde_json::from_str(&json)
        .map_err(|e| ExportError::Manifest(format!("{}: {e}", path.display())))?;
    if manifest.schema_version > SCHEMA_VERSION {
        return Err(ExportError::Manifest(format!(
            "unsupported schema version {} (max supported: {})",
            manifest.schema_version, SCHEMA_VERSION
        )));
    }
    Ok(manifest)
}
