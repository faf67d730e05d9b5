//! Favorita Core — sales domain types and the regularization/enrichment pipeline.
//!
//! This crate contains the in-memory transform, with no file I/O:
//! - Domain types (sales records, grid rows, auxiliary relations)
//! - Trajectory filter (date window, whole-trajectory rejection of returns)
//! - Per-trajectory daily regularizer with carry-forward
//! - Enricher: an ordered table of left joins with explicit fallbacks
//! - Content fingerprinting of the final table

pub mod domain;
pub mod enrich;
pub mod error;
pub mod filter;
pub mod fingerprint;
pub mod pipeline;
pub mod regularize;
pub mod tables;

pub use error::{ComputationWarning, IntegrityError, WarningLog};
pub use filter::{DateWindow, FilterStats, TrajectoryFilter};
pub use pipeline::{run_pipeline, PipelineOutput, PipelineReport};
pub use tables::{AuxiliarySources, RawTables};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types that cross the rayon boundary are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Observation>();
        require_sync::<domain::Observation>();
        require_send::<domain::UnitRecord>();
        require_sync::<domain::UnitRecord>();
        require_send::<domain::EnrichedRecord>();
        require_sync::<domain::EnrichedRecord>();
        require_send::<enrich::Enricher>();
        require_sync::<enrich::Enricher>();
        require_send::<RawTables>();
        require_send::<PipelineReport>();
    }
}
