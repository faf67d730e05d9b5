//! Join primitives.
//!
//! A join is a pure value: a right-side index, a key extractor over the left
//! row, a fallback, and an assignment into the row. Right-side duplicates are
//! resolved when the index is built (first row in source order wins), so a
//! join can never multiply left rows.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use crate::domain::EnrichedRecord;

/// Extracts the left-side join key. `None` means the row cannot match.
pub type KeyFn<K> = fn(&EnrichedRecord) -> Option<K>;

/// Writes a matched value (or the fallback) into the row.
pub type AssignFn<V> = fn(&mut EnrichedRecord, V);

/// One left-join step of the enricher.
pub trait Join: Send + Sync {
    /// Name used in logs and the run manifest.
    fn name(&self) -> &str;

    /// Attach this join's attribute to `row`. Returns true on a match.
    fn apply(&self, row: &mut EnrichedRecord) -> bool;
}

/// Exact-key left join backed by a hash index.
pub struct KeyedJoin<K, V> {
    name: &'static str,
    index: HashMap<K, V>,
    key: KeyFn<K>,
    fallback: V,
    assign: AssignFn<V>,
}

impl<K: Eq + Hash, V: Clone> KeyedJoin<K, V> {
    pub fn new(
        name: &'static str,
        rows: impl IntoIterator<Item = (K, V)>,
        key: KeyFn<K>,
        fallback: V,
        assign: AssignFn<V>,
    ) -> Self {
        let mut index = HashMap::new();
        for (k, v) in rows {
            index.entry(k).or_insert(v);
        }
        Self {
            name,
            index,
            key,
            fallback,
            assign,
        }
    }

    pub fn lookup(&self, row: &EnrichedRecord) -> Option<&V> {
        (self.key)(row).and_then(|k| self.index.get(&k))
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl<K, V> Join for KeyedJoin<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    fn name(&self) -> &str {
        self.name
    }

    fn apply(&self, row: &mut EnrichedRecord) -> bool {
        match self.lookup(row).cloned() {
            Some(v) => {
                (self.assign)(row, v);
                true
            }
            None => {
                (self.assign)(row, self.fallback.clone());
                false
            }
        }
    }
}

/// Left join on date against a sparse daily series, taking the latest value
/// on or before the row's date. This is the same as forward-filling the series
/// over the full calendar and then joining exactly.
///
/// The series is not cut at the date window: a price dated before the window
/// start still fills the first in-window days, which would otherwise get the
/// fallback.
pub struct AsOfJoin {
    name: &'static str,
    series: BTreeMap<NaiveDate, f64>,
    fallback: f64,
    assign: AssignFn<f64>,
}

impl AsOfJoin {
    /// `points` with an unknown value are skipped so they never mask an earlier price.
    pub fn new(
        name: &'static str,
        points: impl IntoIterator<Item = (NaiveDate, Option<f64>)>,
        fallback: f64,
        assign: AssignFn<f64>,
    ) -> Self {
        let mut series = BTreeMap::new();
        for (date, value) in points {
            if let Some(v) = value.filter(|v| v.is_finite()) {
                series.entry(date).or_insert(v);
            }
        }
        Self {
            name,
            series,
            fallback,
            assign,
        }
    }

    pub fn value_at(&self, date: NaiveDate) -> Option<f64> {
        self.series.range(..=date).next_back().map(|(_, v)| *v)
    }
}

impl Join for AsOfJoin {
    fn name(&self) -> &str {
        self.name
    }

    fn apply(&self, row: &mut EnrichedRecord) -> bool {
        match self.value_at(row.date()) {
            Some(v) => {
                (self.assign)(row, v);
                true
            }
            None => {
                (self.assign)(row, self.fallback);
                false
            }
        }
    }
}
