//! Trajectory filter: date window plus whole-trajectory rejection of returns.
//!
//! A negative `unit_sales` marks a return or correction. Rather than patch
//! individual rows, any (store, item) trajectory that ever goes negative
//! inside the window is discarded in its entirety.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::info;

use crate::domain::{ItemNbr, Observation, SalesRecord, StoreNbr};

/// Half-open date window `[start, end)`. A missing bound is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date < e)
    }
}

/// Row and trajectory counts from one filter pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStats {
    pub input_rows: usize,
    pub in_window_rows: usize,
    pub dropped_trajectories: usize,
    pub kept_trajectories: usize,
    pub kept_rows: usize,
}

#[derive(Debug)]
pub struct FilterOutput {
    pub observations: Vec<Observation>,
    pub stats: FilterStats,
}

/// Restricts sales to a window and removes trajectories with returns.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrajectoryFilter {
    window: DateWindow,
}

impl TrajectoryFilter {
    pub fn new(window: DateWindow) -> Self {
        Self { window }
    }

    pub fn window(&self) -> DateWindow {
        self.window
    }

    /// Consume the sales relation and return the surviving observations.
    ///
    /// An empty result is not an error.
    pub fn apply(&self, mut sales: Vec<SalesRecord>) -> FilterOutput {
        let input_rows = sales.len();
        sales.retain(|r| self.window.contains(r.date));
        let in_window_rows = sales.len();

        let mut min_sales: HashMap<(StoreNbr, ItemNbr), f64> = HashMap::new();
        for r in &sales {
            min_sales
                .entry((r.store_nbr, r.item_nbr))
                .and_modify(|m| *m = m.min(r.unit_sales))
                .or_insert(r.unit_sales);
        }
        let invalid: HashSet<(StoreNbr, ItemNbr)> = min_sales
            .iter()
            .filter(|(_, m)| **m < 0.0)
            .map(|(&k, _)| k)
            .collect();

        let observations: Vec<Observation> = sales
            .into_iter()
            .filter(|r| !invalid.contains(&(r.store_nbr, r.item_nbr)))
            .map(Observation::new)
            .collect();

        let stats = FilterStats {
            input_rows,
            in_window_rows,
            dropped_trajectories: invalid.len(),
            kept_trajectories: min_sales.len() - invalid.len(),
            kept_rows: observations.len(),
        };
        info!(
            input_rows,
            in_window_rows,
            dropped_trajectories = stats.dropped_trajectories,
            kept_rows = stats.kept_rows,
            "filtered sales"
        );

        FilterOutput {
            observations,
            stats,
        }
    }
}
