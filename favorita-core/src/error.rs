//! Structured error and warning types for the core pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Fatal problems with the shape of the input data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("relation '{relation}' is missing required column '{column}'")]
    MissingColumn { relation: String, column: String },

    #[error("trajectory '{trajectory_id}' has no rows after filtering")]
    EmptyTrajectory { trajectory_id: String },
}

/// Non-fatal numeric problems. Collected into the run report and logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ComputationWarning {
    /// `ln(unit_sales)` was requested for a non-positive quantity.
    NonPositiveLog { unique_id: String, unit_sales: f64 },
}

impl fmt::Display for ComputationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveLog {
                unique_id,
                unit_sales,
            } => write!(
                f,
                "log of non-positive unit_sales {unit_sales} at {unique_id}; log_sales left empty"
            ),
        }
    }
}

/// Bounded warning collector: exact count, first few kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WarningLog {
    pub total: usize,
    pub sample: Vec<ComputationWarning>,
}

impl WarningLog {
    pub const SAMPLE_LIMIT: usize = 16;

    pub fn push(&mut self, warning: ComputationWarning) {
        self.total += 1;
        if self.sample.len() < Self::SAMPLE_LIMIT {
            self.sample.push(warning);
        }
    }

    pub fn merge(&mut self, other: WarningLog) {
        self.total += other.total;
        let room = Self::SAMPLE_LIMIT.saturating_sub(self.sample.len());
        self.sample.extend(other.sample.into_iter().take(room));
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
