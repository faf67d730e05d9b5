//! Holiday calendar split into its three locale tiers.

use chrono::NaiveDate;

use crate::domain::{HolidayEvent, LocaleScope};

/// Non-transferred holiday descriptions, keyed the way each tier is joined.
///
/// Every list keeps the source order of `holidays_events.csv`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HolidayCalendar {
    pub national: Vec<(NaiveDate, String)>,
    /// Keyed by (state, date).
    pub regional: Vec<((String, NaiveDate), String)>,
    /// Keyed by (city, date).
    pub local: Vec<((String, NaiveDate), String)>,
    pub transferred: usize,
}

impl HolidayCalendar {
    /// Drop transferred events and split the rest by locale scope.
    pub fn partition(events: Vec<HolidayEvent>) -> Self {
        let mut calendar = Self::default();
        for event in events {
            if event.transferred {
                calendar.transferred += 1;
                continue;
            }
            match event.locale {
                LocaleScope::National => calendar.national.push((event.date, event.description)),
                LocaleScope::Regional => calendar
                    .regional
                    .push(((event.locale_name, event.date), event.description)),
                LocaleScope::Local => calendar
                    .local
                    .push(((event.locale_name, event.date), event.description)),
            }
        }
        calendar
    }
}
