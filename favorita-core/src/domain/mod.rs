//! Domain types for the Favorita sales pipeline

pub mod auxiliary;
pub mod ids;
pub mod pybool;
pub mod record;

pub use auxiliary::{HolidayEvent, ItemInfo, LocaleScope, OilPrice, StoreInfo, TransactionCount};
pub use ids::{ItemNbr, StoreNbr, TrajectoryId};
pub use record::{
    CalendarFeatures, EnrichedRecord, Observation, SalesRecord, UnitRecord, MISSING_NUMERIC,
};
