use crate::limits::MAX_RANGE_DAYS;
use crate::model::*;

use super::EngineError;

/// `start <= date <= end`, compared as calendar dates.
pub fn is_active_on(booking: &Booking, date: Day) -> bool {
    booking.range().contains(date)
}

/// Inclusive overlap: bookings sharing a single day overlap.
pub fn ranges_overlap(a: &Booking, b: &Booking) -> bool {
    a.range().overlaps(&b.range())
}

pub(crate) fn validate_range(range: &DateRange) -> Result<(), EngineError> {
    if range.len_days() > MAX_RANGE_DAYS {
        return Err(EngineError::LimitExceeded("date range too wide"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> Day {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn booking(start: Day, end: Day) -> Booking {
        Booking::new("b", "adv", "slot", start, end, BookingStatus::Confirmed).unwrap()
    }

    #[test]
    fn active_on_both_ends() {
        let b = booking(d(2024, 1, 10), d(2024, 1, 20));
        assert!(is_active_on(&b, d(2024, 1, 10)));
        assert!(is_active_on(&b, d(2024, 1, 15)));
        assert!(is_active_on(&b, d(2024, 1, 20)));
        assert!(!is_active_on(&b, d(2024, 1, 9)));
        assert!(!is_active_on(&b, d(2024, 1, 21)));
    }

    #[test]
    fn single_day_booking() {
        let b = booking(d(2024, 2, 29), d(2024, 2, 29));
        assert!(is_active_on(&b, d(2024, 2, 29)));
        assert!(!is_active_on(&b, d(2024, 3, 1)));
    }

    #[test]
    fn overlap_is_symmetric_and_inclusive() {
        let a = booking(d(2024, 1, 1), d(2024, 1, 5));
        let b = booking(d(2024, 1, 5), d(2024, 1, 8));
        let c = booking(d(2024, 1, 6), d(2024, 1, 8));
        let inner = booking(d(2024, 1, 2), d(2024, 1, 3));
        assert!(ranges_overlap(&a, &b));
        assert!(ranges_overlap(&b, &a));
        assert!(!ranges_overlap(&a, &c));
        assert!(!ranges_overlap(&c, &a));
        assert!(ranges_overlap(&a, &inner));
        assert!(ranges_overlap(&inner, &a));
    }

    #[test]
    fn overlap_across_year_boundary() {
        let a = booking(d(2023, 12, 28), d(2024, 1, 2));
        let b = booking(d(2024, 1, 1), d(2024, 1, 1));
        assert!(ranges_overlap(&a, &b));
    }

    #[test]
    fn range_width_limit() {
        let ok = DateRange::new(d(2024, 1, 1), d(2024, 12, 31)).unwrap();
        assert!(validate_range(&ok).is_ok());
        let wide = DateRange::new(d(2020, 1, 1), d(2024, 1, 1)).unwrap();
        assert_eq!(
            validate_range(&wide),
            Err(EngineError::LimitExceeded("date range too wide"))
        );
    }
}
