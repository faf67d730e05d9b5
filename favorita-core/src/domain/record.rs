//! Sales rows at each stage of the pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auxiliary::{ItemInfo, StoreInfo};
use super::ids::{ItemNbr, StoreNbr, TrajectoryId};
use super::pybool;

/// Sentinel for numeric attributes with no matching source row.
pub const MISSING_NUMERIC: f64 = -1.0;

/// One row of `train.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    #[serde(default)]
    pub id: u64,
    pub date: NaiveDate,
    pub store_nbr: StoreNbr,
    pub item_nbr: ItemNbr,
    pub unit_sales: f64,
    #[serde(default, deserialize_with = "pybool::deserialize_opt")]
    pub onpromotion: Option<bool>,
}

impl SalesRecord {
    pub fn trajectory_id(&self) -> TrajectoryId {
        TrajectoryId::new(self.store_nbr, self.item_nbr)
    }
}

/// A sales record that survived filtering, tagged with its identifiers.
///
/// Every observation is an observed (open) day.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub trajectory_id: TrajectoryId,
    pub unique_id: String,
    pub record: SalesRecord,
    pub is_open: bool,
}

impl Observation {
    pub fn new(record: SalesRecord) -> Self {
        let trajectory_id = record.trajectory_id();
        let unique_id = trajectory_id.unique_id(record.date);
        Self {
            trajectory_id,
            unique_id,
            record,
            is_open: true,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.record.date
    }
}

/// One row of the regularized daily grid.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitRecord {
    pub unique_id: String,
    pub trajectory_id: TrajectoryId,
    pub date: NaiveDate,
    pub unit_sales: f64,
    /// `ln(unit_sales)`; absent when `unit_sales <= 0`.
    pub log_sales: Option<f64>,
    /// False on days synthesized by regularization.
    pub is_open: bool,
    pub onpromotion: Option<bool>,
    pub store_nbr: StoreNbr,
    pub item_nbr: ItemNbr,
}

/// Day-of-calendar features derived from a row's date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalendarFeatures {
    /// 0 = Monday .. 6 = Sunday.
    pub day_of_week: u32,
    pub day_of_month: u32,
    pub month: u32,
}

/// A grid row with every auxiliary attribute attached.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub unit: UnitRecord,
    /// Oil price as of this date, or [`MISSING_NUMERIC`].
    pub oil_index: f64,
    pub store: Option<Arc<StoreInfo>>,
    pub item: Option<Arc<ItemInfo>>,
    /// Store transactions on this date, or [`MISSING_NUMERIC`].
    pub transaction_count: f64,
    pub calendar: CalendarFeatures,
    pub national_holiday: String,
    pub regional_holiday: String,
    pub local_holiday: String,
}

impl EnrichedRecord {
    /// Wrap a grid row with every attribute at its fallback value.
    pub fn from_unit(unit: UnitRecord) -> Self {
        Self {
            unit,
            oil_index: MISSING_NUMERIC,
            store: None,
            item: None,
            transaction_count: MISSING_NUMERIC,
            calendar: CalendarFeatures::default(),
            national_holiday: String::new(),
            regional_holiday: String::new(),
            local_holiday: String::new(),
        }
    }

    pub fn unique_id(&self) -> &str {
        &self.unit.unique_id
    }

    pub fn date(&self) -> NaiveDate {
        self.unit.date
    }
}
