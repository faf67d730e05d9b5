use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store number as it appears in the Favorita relations.
pub type StoreNbr = u32;

/// Item number as it appears in the Favorita relations.
pub type ItemNbr = u32;

/// Identifier of one (store, item) trajectory: `"{store_nbr}_{item_nbr}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrajectoryId(pub String);

impl TrajectoryId {
    pub fn new(store_nbr: StoreNbr, item_nbr: ItemNbr) -> Self {
        Self(format!("{store_nbr}_{item_nbr}"))
    }

    /// Row identifier for this trajectory on `date`: `"{trajectory_id}_{YYYY-MM-DD}"`.
    ///
    /// The ISO date suffix makes lexicographic order on unique ids
    /// trajectory-major and date-minor.
    pub fn unique_id(&self, date: NaiveDate) -> String {
        format!("{}_{}", self.0, date.format("%Y-%m-%d"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrajectoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trajectory_id_joins_store_and_item() {
        assert_eq!(TrajectoryId::new(25, 103665).as_str(), "25_103665");
    }

    #[test]
    fn unique_id_appends_iso_date() {
        let id = TrajectoryId::new(1, 96995);
        let date = NaiveDate::from_ymd_opt(2015, 3, 7).unwrap();
        assert_eq!(id.unique_id(date), "1_96995_2015-03-07");
    }

    #[test]
    fn unique_ids_sort_by_date_within_trajectory() {
        let id = TrajectoryId::new(3, 7);
        let a = id.unique_id(NaiveDate::from_ymd_opt(2015, 9, 30).unwrap());
        let b = id.unique_id(NaiveDate::from_ymd_opt(2015, 10, 1).unwrap());
        assert!(a < b);
    }
}
