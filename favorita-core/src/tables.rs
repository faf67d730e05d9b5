//! In-memory form of the six Favorita relations.

use crate::domain::{HolidayEvent, ItemInfo, OilPrice, SalesRecord, StoreInfo, TransactionCount};

/// Everything the loader hands to the pipeline.
#[derive(Debug, Clone, Default)]
pub struct RawTables {
    pub sales: Vec<SalesRecord>,
    pub stores: Vec<StoreInfo>,
    pub items: Vec<ItemInfo>,
    pub oil: Vec<OilPrice>,
    pub transactions: Vec<TransactionCount>,
    pub holidays: Vec<HolidayEvent>,
}

/// The relations consumed by the enricher.
#[derive(Debug, Clone, Default)]
pub struct AuxiliarySources {
    pub stores: Vec<StoreInfo>,
    pub items: Vec<ItemInfo>,
    pub oil: Vec<OilPrice>,
    pub transactions: Vec<TransactionCount>,
    pub holidays: Vec<HolidayEvent>,
}

impl RawTables {
    /// Split off the sales relation so it can be dropped independently.
    pub fn into_parts(self) -> (Vec<SalesRecord>, AuxiliarySources) {
        let RawTables {
            sales,
            stores,
            items,
            oil,
            transactions,
            holidays,
        } = self;
        (
            sales,
            AuxiliarySources {
                stores,
                items,
                oil,
                transactions,
                holidays,
            },
        )
    }
}
