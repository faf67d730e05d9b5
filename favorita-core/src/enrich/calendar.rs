use chrono::{Datelike, NaiveDate};

use crate::domain::CalendarFeatures;

impl CalendarFeatures {
    /// Weekday numbering follows pandas `dayofweek`: Monday = 0 .. Sunday = 6.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            day_of_week: date.weekday().num_days_from_monday(),
            day_of_month: date.day(),
            month: date.month(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monday_is_zero() {
        // 2015-06-01 was a Monday.
        let f = CalendarFeatures::from_date(NaiveDate::from_ymd_opt(2015, 6, 1).unwrap());
        assert_eq!(f.day_of_week, 0);
        assert_eq!(f.day_of_month, 1);
        assert_eq!(f.month, 6);
    }

    #[test]
    fn sunday_is_six() {
        let f = CalendarFeatures::from_date(NaiveDate::from_ymd_opt(2016, 1, 31).unwrap());
        assert_eq!(f.day_of_week, 6);
        assert_eq!(f.day_of_month, 31);
        assert_eq!(f.month, 1);
    }
}
