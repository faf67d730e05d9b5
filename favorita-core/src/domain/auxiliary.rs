//! Auxiliary relations joined onto the sales grid.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::{ItemNbr, StoreNbr};
use super::pybool;

/// One row of `stores.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreInfo {
    pub store_nbr: StoreNbr,
    pub city: String,
    pub state: String,
    #[serde(rename = "type")]
    pub store_type: String,
    pub cluster: u32,
}

/// One row of `items.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemInfo {
    pub item_nbr: ItemNbr,
    pub family: String,
    pub class: u32,
    pub perishable: u32,
}

/// One row of `oil.csv`. The price is unknown on some trading days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OilPrice {
    pub date: NaiveDate,
    #[serde(rename = "dcoilwtico")]
    pub price: Option<f64>,
}

/// One row of `transactions.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionCount {
    pub date: NaiveDate,
    pub store_nbr: StoreNbr,
    pub transactions: f64,
}

/// Geographic reach of a holiday event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocaleScope {
    National,
    Regional,
    Local,
}

/// One row of `holidays_events.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolidayEvent {
    pub date: NaiveDate,
    /// Holiday, Transfer, Additional, Bridge, Work Day or Event.
    #[serde(rename = "type")]
    pub kind: String,
    pub locale: LocaleScope,
    pub locale_name: String,
    pub description: String,
    /// A transferred holiday is not observed on its nominal date.
    #[serde(deserialize_with = "pybool::deserialize")]
    pub transferred: bool,
}
