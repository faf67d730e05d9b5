//! Filter → regularize → enrich, with each stage's input dropped as soon as
//! the next stage's output supersedes it.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::EnrichedRecord;
use crate::enrich::{Enricher, JoinReport};
use crate::error::{IntegrityError, WarningLog};
use crate::filter::{DateWindow, FilterStats, TrajectoryFilter};
use crate::regularize::regularize;
use crate::tables::RawTables;

/// Counts collected across all stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub window: DateWindow,
    pub filter: FilterStats,
    pub trajectories: usize,
    pub synthetic_rows: usize,
    pub joins: JoinReport,
    pub warnings: WarningLog,
}

#[derive(Debug)]
pub struct PipelineOutput {
    /// Enriched rows sorted by `unique_id`.
    pub rows: Vec<EnrichedRecord>,
    pub report: PipelineReport,
}

/// Run the whole core over already-loaded tables.
pub fn run_pipeline(raw: RawTables, window: DateWindow) -> Result<PipelineOutput, IntegrityError> {
    let (sales, sources) = raw.into_parts();

    let filtered = TrajectoryFilter::new(window).apply(sales);
    let filter_stats = filtered.stats;

    let grid = regularize(filtered.observations)?;

    let enricher = Enricher::from_sources(sources);
    let enriched = enricher.enrich(grid.rows);
    drop(enricher);

    let report = PipelineReport {
        window,
        filter: filter_stats,
        trajectories: grid.trajectories,
        synthetic_rows: grid.synthetic_rows,
        joins: enriched.report,
        warnings: grid.warnings,
    };
    info!(
        rows = enriched.rows.len(),
        trajectories = report.trajectories,
        warnings = report.warnings.total,
        "pipeline complete"
    );

    Ok(PipelineOutput {
        rows: enriched.rows,
        report,
    })
}
