//! Per-trajectory daily regularization.
//!
//! Each trajectory is expanded onto its own contiguous calendar
//! `[first observed day, last observed day]`; no day outside that span is ever
//! emitted. Missing days become synthetic rows (`is_open = false`) that carry
//! the previous row's identifiers, promotion flag and quantity.

use chrono::{Duration, NaiveDate};
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::domain::{ItemNbr, Observation, StoreNbr, TrajectoryId, UnitRecord};
use crate::error::{ComputationWarning, IntegrityError, WarningLog};

/// Regularized rows for all trajectories, in no particular order.
#[derive(Debug, Default)]
pub struct RegularizedGrid {
    pub rows: Vec<UnitRecord>,
    pub trajectories: usize,
    pub synthetic_rows: usize,
    pub warnings: WarningLog,
}

/// Regularized rows for a single trajectory, ordered by date.
#[derive(Debug)]
pub struct TrajectoryGrid {
    pub rows: Vec<UnitRecord>,
    pub synthetic_rows: usize,
    pub warnings: WarningLog,
}

/// Values carried forward into synthetic days.
#[derive(Debug, Clone, Copy)]
struct Carry {
    store_nbr: StoreNbr,
    item_nbr: ItemNbr,
    onpromotion: Option<bool>,
    unit_sales: f64,
}

impl Carry {
    fn from_observation(obs: &Observation) -> Self {
        Self {
            store_nbr: obs.record.store_nbr,
            item_nbr: obs.record.item_nbr,
            onpromotion: obs.record.onpromotion,
            unit_sales: obs.record.unit_sales,
        }
    }
}

/// Group observations by trajectory, keeping source order inside each group.
pub fn group_trajectories(observations: Vec<Observation>) -> HashMap<TrajectoryId, Vec<Observation>> {
    let mut groups: HashMap<TrajectoryId, Vec<Observation>> = HashMap::new();
    for obs in observations {
        groups.entry(obs.trajectory_id.clone()).or_default().push(obs);
    }
    groups
}

/// Regularize every trajectory. Trajectories are independent, so this runs
/// as a parallel map; callers must sort the merged rows themselves.
pub fn regularize(observations: Vec<Observation>) -> Result<RegularizedGrid, IntegrityError> {
    let groups = group_trajectories(observations);
    let trajectories = groups.len();

    let grids = groups
        .into_par_iter()
        .map(|(id, group)| regularize_trajectory(&id, group))
        .collect::<Result<Vec<_>, _>>()?;

    let mut out = RegularizedGrid {
        rows: Vec::with_capacity(grids.iter().map(|g| g.rows.len()).sum()),
        trajectories,
        ..Default::default()
    };
    for grid in grids {
        out.rows.extend(grid.rows);
        out.synthetic_rows += grid.synthetic_rows;
        out.warnings.merge(grid.warnings);
    }

    if !out.warnings.is_empty() {
        warn!(
            count = out.warnings.total,
            first = %out.warnings.sample[0],
            "non-positive unit_sales reached the log transform"
        );
    }
    info!(
        trajectories,
        rows = out.rows.len(),
        synthetic_rows = out.synthetic_rows,
        "regularized daily grid"
    );
    Ok(out)
}

/// Expand one trajectory onto a contiguous daily calendar.
///
/// When a day has several observations the last one in source order wins.
pub fn regularize_trajectory(
    trajectory_id: &TrajectoryId,
    mut group: Vec<Observation>,
) -> Result<TrajectoryGrid, IntegrityError> {
    if group.is_empty() {
        return Err(IntegrityError::EmptyTrajectory {
            trajectory_id: trajectory_id.to_string(),
        });
    }

    // Stable: equal dates keep source order, so later duplicates overwrite.
    group.sort_by_key(Observation::date);
    let first = group[0].date();
    let last = group[group.len() - 1].date();
    let mut carry = Carry::from_observation(&group[0]);

    let span = (last - first).num_days() as usize + 1;
    let mut slots: Vec<Option<Observation>> = vec![None; span];
    for obs in group {
        let idx = (obs.date() - first).num_days() as usize;
        slots[idx] = Some(obs);
    }

    let mut rows = Vec::with_capacity(span);
    let mut synthetic_rows = 0;
    let mut warnings = WarningLog::default();

    for (offset, slot) in slots.into_iter().enumerate() {
        let date = first + Duration::days(offset as i64);
        let row = match slot {
            Some(obs) => {
                carry = Carry::from_observation(&obs);
                let log_sales = log_sales(&obs.unique_id, obs.record.unit_sales, &mut warnings);
                UnitRecord {
                    unique_id: obs.unique_id,
                    trajectory_id: obs.trajectory_id,
                    date,
                    unit_sales: obs.record.unit_sales,
                    log_sales,
                    is_open: obs.is_open,
                    onpromotion: obs.record.onpromotion,
                    store_nbr: obs.record.store_nbr,
                    item_nbr: obs.record.item_nbr,
                }
            }
            None => {
                synthetic_rows += 1;
                synthetic_row(trajectory_id, date, carry, &mut warnings)
            }
        };
        rows.push(row);
    }

    Ok(TrajectoryGrid {
        rows,
        synthetic_rows,
        warnings,
    })
}

fn synthetic_row(
    trajectory_id: &TrajectoryId,
    date: NaiveDate,
    carry: Carry,
    warnings: &mut WarningLog,
) -> UnitRecord {
    let unique_id = trajectory_id.unique_id(date);
    let log_sales = log_sales(&unique_id, carry.unit_sales, warnings);
    UnitRecord {
        unique_id,
        trajectory_id: trajectory_id.clone(),
        date,
        unit_sales: carry.unit_sales,
        log_sales,
        is_open: false,
        onpromotion: carry.onpromotion,
        store_nbr: carry.store_nbr,
        item_nbr: carry.item_nbr,
    }
}

/// `ln(unit_sales)`, or `None` plus a warning when the quantity is not positive.
fn log_sales(unique_id: &str, unit_sales: f64, warnings: &mut WarningLog) -> Option<f64> {
    if unit_sales > 0.0 {
        Some(unit_sales.ln())
    } else {
        warnings.push(ComputationWarning::NonPositiveLog {
            unique_id: unique_id.to_string(),
            unit_sales,
        });
        None
    }
}
