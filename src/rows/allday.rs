//! Inclusive/exclusive conversion for all-day date ranges.
//!
//! The event model keeps all-day end dates inclusive; storage keeps them
//! exclusive (the day after the last day). Zero and negative spans widen to
//! one day on write, so no stored event has zero duration. Calendar dates
//! only: no time-of-day, no zone conversion.

use chrono::{Duration, NaiveDate};

/// Model range (inclusive end) to storage range (exclusive end).
pub fn to_storage_range(start: NaiveDate, end_inclusive: NaiveDate) -> (NaiveDate, NaiveDate) {
    let end_exclusive = if end_inclusive <= start {
        start + Duration::days(1)
    } else {
        end_inclusive + Duration::days(1)
    };
    (start, end_exclusive)
}

/// Storage range (exclusive end) back to model range (inclusive end).
pub fn from_storage_range(start: NaiveDate, end_exclusive: NaiveDate) -> (NaiveDate, NaiveDate) {
    (start, end_exclusive - Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_single_day_event_gets_next_day_end() {
        let (start, end) = to_storage_range(date(2015, 5, 1), date(2015, 5, 1));
        assert_eq!(start, date(2015, 5, 1));
        assert_eq!(end, date(2015, 5, 2));
    }

    #[test]
    fn test_multi_day_span_extends_by_one() {
        let (_, end) = to_storage_range(date(2015, 5, 1), date(2015, 5, 3));
        assert_eq!(end, date(2015, 5, 4));
    }

    #[test]
    fn test_inverted_range_is_forced_to_one_day() {
        let (start, end) = to_storage_range(date(2015, 5, 10), date(2015, 5, 3));
        assert_eq!(start, date(2015, 5, 10));
        assert_eq!(end, date(2015, 5, 11));
    }

    #[test]
    fn test_storage_range_reads_back_inclusive() {
        let (_, end) = from_storage_range(date(2015, 5, 1), date(2015, 5, 2));
        assert_eq!(end, date(2015, 5, 1), "single-day event ends on its start day");

        let (_, end) = from_storage_range(date(2015, 5, 1), date(2015, 5, 4));
        assert_eq!(end, date(2015, 5, 3));
    }

    #[test]
    fn test_roundtrip_over_month_boundary() {
        let (start, stored_end) = to_storage_range(date(2024, 1, 30), date(2024, 2, 2));
        let (_, end) = from_storage_range(start, stored_end);
        assert_eq!(end, date(2024, 2, 2));
    }
}
