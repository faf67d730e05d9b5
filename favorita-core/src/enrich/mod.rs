//! Enricher: attaches auxiliary attributes to the regularized grid.
//!
//! The joins are held as an ordered table of [`Join`] values. Order matters:
//! the regional and local holiday joins key on the store's state and city,
//! so they run after the store join.

pub mod calendar;
pub mod holiday;
pub mod join;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::{CalendarFeatures, EnrichedRecord, UnitRecord, MISSING_NUMERIC};
use crate::tables::AuxiliarySources;

pub use holiday::HolidayCalendar;
pub use join::{AsOfJoin, Join, KeyedJoin};

/// Match counts for one join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinStat {
    pub name: String,
    pub matched: usize,
    pub unmatched: usize,
}

/// Match counts for every join, in application order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinReport {
    pub joins: Vec<JoinStat>,
}

impl JoinReport {
    pub fn matched(&self, name: &str) -> Option<usize> {
        self.joins.iter().find(|j| j.name == name).map(|j| j.matched)
    }
}

#[derive(Debug)]
pub struct EnrichOutput {
    /// Sorted by `unique_id` ascending.
    pub rows: Vec<EnrichedRecord>,
    pub report: JoinReport,
}

/// Ordered table of left joins.
pub struct Enricher {
    joins: Vec<Box<dyn Join>>,
}

impl Enricher {
    pub fn new(joins: Vec<Box<dyn Join>>) -> Self {
        Self { joins }
    }

    /// Build the Favorita join table, consuming each source into its index.
    pub fn from_sources(sources: AuxiliarySources) -> Self {
        let AuxiliarySources {
            stores,
            items,
            oil,
            transactions,
            holidays,
        } = sources;

        let holidays = HolidayCalendar::partition(holidays);
        debug!(
            transferred = holidays.transferred,
            national = holidays.national.len(),
            regional = holidays.regional.len(),
            local = holidays.local.len(),
            "partitioned holiday calendar"
        );

        let joins: Vec<Box<dyn Join>> = vec![
            Box::new(AsOfJoin::new(
                "oil",
                oil.into_iter().map(|o| (o.date, o.price)),
                MISSING_NUMERIC,
                |r, v| r.oil_index = v,
            )),
            Box::new(KeyedJoin::new(
                "stores",
                stores.into_iter().map(|s| (s.store_nbr, Some(Arc::new(s)))),
                |r| Some(r.unit.store_nbr),
                None,
                |r, v| r.store = v,
            )),
            Box::new(KeyedJoin::new(
                "items",
                items.into_iter().map(|i| (i.item_nbr, Some(Arc::new(i)))),
                |r| Some(r.unit.item_nbr),
                None,
                |r, v| r.item = v,
            )),
            Box::new(KeyedJoin::new(
                "transactions",
                transactions
                    .into_iter()
                    .map(|t| ((t.date, t.store_nbr), t.transactions)),
                |r| Some((r.date(), r.unit.store_nbr)),
                MISSING_NUMERIC,
                |r, v| r.transaction_count = v,
            )),
            Box::new(KeyedJoin::new(
                "national_holiday",
                holidays.national,
                |r| Some(r.date()),
                String::new(),
                |r, v| r.national_holiday = v,
            )),
            Box::new(KeyedJoin::new(
                "regional_holiday",
                holidays.regional,
                |r| r.store.as_ref().map(|s| (s.state.clone(), r.date())),
                String::new(),
                |r, v| r.regional_holiday = v,
            )),
            Box::new(KeyedJoin::new(
                "local_holiday",
                holidays.local,
                |r| r.store.as_ref().map(|s| (s.city.clone(), r.date())),
                String::new(),
                |r, v| r.local_holiday = v,
            )),
        ];
        Self::new(joins)
    }

    pub fn join_names(&self) -> Vec<&str> {
        self.joins.iter().map(|j| j.name()).collect()
    }

    /// Recompute calendar features and re-run every join in place.
    ///
    /// Pure in (rows, sources): running it again over its own output is a no-op.
    pub fn apply(&self, rows: &mut [EnrichedRecord]) -> JoinReport {
        rows.par_iter_mut()
            .for_each(|r| r.calendar = CalendarFeatures::from_date(r.date()));

        let mut report = JoinReport::default();
        for join in &self.joins {
            let matched: usize = rows
                .par_iter_mut()
                .map(|r| usize::from(join.apply(r)))
                .sum();
            let stat = JoinStat {
                name: join.name().to_string(),
                matched,
                unmatched: rows.len() - matched,
            };
            debug!(join = %stat.name, matched, unmatched = stat.unmatched, "applied join");
            report.joins.push(stat);
        }
        report
    }

    /// Enrich the grid and sort it by `unique_id`.
    pub fn enrich(&self, grid: Vec<UnitRecord>) -> EnrichOutput {
        let mut rows: Vec<EnrichedRecord> =
            grid.into_par_iter().map(EnrichedRecord::from_unit).collect();
        let report = self.apply(&mut rows);
        rows.par_sort_unstable_by(|a, b| a.unit.unique_id.cmp(&b.unit.unique_id));

        info!(
            rows = rows.len(),
            joins = report.joins.len(),
            "enriched grid"
        );
        EnrichOutput { rows, report }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        HolidayEvent, ItemInfo, LocaleScope, OilPrice, StoreInfo, TrajectoryId, TransactionCount,
    };
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2016, 3, day).unwrap()
    }

    fn unit(store: u32, item: u32, day: u32) -> UnitRecord {
        let trajectory_id = TrajectoryId::new(store, item);
        UnitRecord {
            unique_id: trajectory_id.unique_id(d(day)),
            trajectory_id,
            date: d(day),
            unit_sales: 2.0,
            log_sales: Some(2.0_f64.ln()),
            is_open: true,
            onpromotion: Some(false),
            store_nbr: store,
            item_nbr: item,
        }
    }

    fn holiday(day: u32, locale: LocaleScope, name: &str, desc: &str, transferred: bool) -> HolidayEvent {
        HolidayEvent {
            date: d(day),
            kind: "Holiday".into(),
            locale,
            locale_name: name.into(),
            description: desc.into(),
            transferred,
        }
    }

    fn sources() -> AuxiliarySources {
        AuxiliarySources {
            stores: vec![StoreInfo {
                store_nbr: 1,
                city: "Quito".into(),
                state: "Pichincha".into(),
                store_type: "D".into(),
                cluster: 13,
            }],
            items: vec![ItemInfo {
                item_nbr: 100,
                family: "GROCERY I".into(),
                class: 1093,
                perishable: 0,
            }],
            oil: vec![
                OilPrice { date: d(1), price: Some(36.8) },
                OilPrice { date: d(2), price: None },
                OilPrice { date: d(4), price: Some(35.9) },
            ],
            transactions: vec![
                TransactionCount { date: d(2), store_nbr: 1, transactions: 2100.0 },
                TransactionCount { date: d(2), store_nbr: 1, transactions: 9999.0 },
            ],
            holidays: vec![
                holiday(2, LocaleScope::National, "Ecuador", "Carnaval", false),
                holiday(2, LocaleScope::National, "Ecuador", "Carnaval dup", false),
                holiday(3, LocaleScope::Regional, "Pichincha", "Provincializacion", false),
                holiday(3, LocaleScope::Local, "Quito", "Fundacion de Quito", true),
                holiday(3, LocaleScope::Local, "Cuenca", "Fundacion de Cuenca", false),
            ],
        }
    }

    #[test]
    fn join_table_order_is_fixed() {
        let enricher = Enricher::from_sources(AuxiliarySources::default());
        assert_eq!(
            enricher.join_names(),
            vec![
                "oil",
                "stores",
                "items",
                "transactions",
                "national_holiday",
                "regional_holiday",
                "local_holiday"
            ]
        );
    }

    #[test]
    fn attaches_all_attributes_with_fallbacks() {
        let enricher = Enricher::from_sources(sources());
        let out = enricher.enrich(vec![unit(1, 100, 3), unit(1, 100, 2), unit(2, 200, 2)]);

        assert_eq!(out.rows.len(), 3);
        let ids: Vec<&str> = out.rows.iter().map(|r| r.unique_id()).collect();
        assert_eq!(ids, vec!["1_100_2016-03-02", "1_100_2016-03-03", "2_200_2016-03-02"]);

        let day2 = &out.rows[0];
        // Oil unknown on day 2, carried from day 1.
        assert_eq!(day2.oil_index, 36.8);
        assert_eq!(day2.store.as_ref().unwrap().city, "Quito");
        assert_eq!(day2.item.as_ref().unwrap().family, "GROCERY I");
        assert_eq!(day2.transaction_count, 2100.0);
        assert_eq!(day2.national_holiday, "Carnaval");
        assert_eq!(day2.regional_holiday, "");
        assert_eq!(day2.calendar.day_of_week, 2); // Wednesday

        let day3 = &out.rows[1];
        assert_eq!(day3.national_holiday, "");
        assert_eq!(day3.regional_holiday, "Provincializacion");
        // Quito's local event on day 3 was transferred.
        assert_eq!(day3.local_holiday, "");
        assert_eq!(day3.transaction_count, MISSING_NUMERIC);

        let unknown_store = &out.rows[2];
        assert!(unknown_store.store.is_none());
        assert!(unknown_store.item.is_none());
        assert_eq!(unknown_store.transaction_count, MISSING_NUMERIC);
        assert_eq!(unknown_store.national_holiday, "Carnaval");
        assert_eq!(unknown_store.regional_holiday, "");
    }

    #[test]
    fn report_counts_matches_per_join() {
        let enricher = Enricher::from_sources(sources());
        let out = enricher.enrich(vec![unit(1, 100, 2), unit(2, 200, 2)]);
        assert_eq!(out.report.matched("stores"), Some(1));
        assert_eq!(out.report.matched("oil"), Some(2));
        assert_eq!(out.report.matched("national_holiday"), Some(2));
        assert_eq!(out.report.matched("missing"), None);
    }

    #[test]
    fn reapplying_joins_is_a_no_op() {
        let enricher = Enricher::from_sources(sources());
        let out = enricher.enrich(vec![unit(1, 100, 2), unit(1, 100, 3), unit(2, 200, 4)]);
        let mut again = out.rows.clone();
        enricher.apply(&mut again);
        assert_eq!(again, out.rows);
    }

    #[test]
    fn duplicate_right_rows_never_multiply_left_rows() {
        let enricher = Enricher::from_sources(sources());
        let out = enricher.enrich(vec![unit(1, 100, 2)]);
        assert_eq!(out.rows.len(), 1);
    }
}
