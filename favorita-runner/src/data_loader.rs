//! CSV loading for the six Favorita relations.
//!
//! Each relation is read from its Kaggle file name inside the data folder.
//! Before any row is deserialized, the header is checked for the columns the
//! joins key on, so a renamed or truncated file fails with the relation and
//! column named instead of a generic deserialization error.

use favorita_core::domain::{
    HolidayEvent, ItemInfo, OilPrice, SalesRecord, StoreInfo, TransactionCount,
};
use favorita_core::{IntegrityError, RawTables};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Errors from the loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}

/// A source file and the columns it must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    pub name: &'static str,
    pub file: &'static str,
    pub required: &'static [&'static str],
}

pub const SALES: Relation = Relation {
    name: "sales",
    file: "train.csv",
    required: &["date", "store_nbr", "item_nbr", "unit_sales"],
};

pub const STORES: Relation = Relation {
    name: "stores",
    file: "stores.csv",
    required: &["store_nbr"],
};

pub const ITEMS: Relation = Relation {
    name: "items",
    file: "items.csv",
    required: &["item_nbr"],
};

pub const OIL: Relation = Relation {
    name: "oil",
    file: "oil.csv",
    required: &["date"],
};

pub const TRANSACTIONS: Relation = Relation {
    name: "transactions",
    file: "transactions.csv",
    required: &["date", "store_nbr"],
};

pub const HOLIDAYS: Relation = Relation {
    name: "holidays",
    file: "holidays_events.csv",
    required: &["date", "locale", "locale_name", "transferred"],
};

pub const ALL_RELATIONS: [Relation; 6] = [SALES, STORES, ITEMS, OIL, TRANSACTIONS, HOLIDAYS];

impl Relation {
    pub fn path_in(&self, folder: &Path) -> PathBuf {
        folder.join(self.file)
    }
}

/// Read one relation from `folder`.
pub fn read_relation<T: DeserializeOwned>(
    folder: &Path,
    relation: &Relation,
) -> Result<Vec<T>, LoadError> {
    let path = relation.path_in(folder);
    let file = File::open(&path).map_err(|source| LoadError::Io {
        path: path.clone(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(BufReader::new(file));

    let csv_err = |source: csv::Error| LoadError::Csv {
        path: path.clone(),
        source,
    };

    let headers = reader.headers().map_err(csv_err)?.clone();
    for column in relation.required {
        if !headers.iter().any(|h| h.trim() == *column) {
            return Err(IntegrityError::MissingColumn {
                relation: relation.name.to_string(),
                column: column.to_string(),
            }
            .into());
        }
    }

    let rows = reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(csv_err)?;
    info!(relation = relation.name, rows = rows.len(), "loaded relation");
    Ok(rows)
}

/// Load all six relations from the data folder.
pub fn load_raw_tables(folder: &Path) -> Result<RawTables, LoadError> {
    Ok(RawTables {
        sales: read_relation::<SalesRecord>(folder, &SALES)?,
        stores: read_relation::<StoreInfo>(folder, &STORES)?,
        items: read_relation::<ItemInfo>(folder, &ITEMS)?,
        oil: read_relation::<OilPrice>(folder, &OIL)?,
        transactions: read_relation::<TransactionCount>(folder, &TRANSACTIONS)?,
        holidays: read_relation::<HolidayEvent>(folder, &HOLIDAYS)?,
    })
}
