//! Month calendar data: a Sunday-first grid of weeks, each day carrying the
//! occupancy of every slot. The first and last weeks include days from the
//! neighbouring months, computed exactly like in-month days.

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use crate::engine::{Engine, EngineError, OccupancyPolicy, Severity};
use crate::model::*;

fn month_bounds(year: i32, month: u32) -> Result<(Day, Day), EngineError> {
    let invalid = || EngineError::InvalidDate(format!("{year}-{month:02}"));
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let last = NaiveDate::from_ymd_opt(ny, nm, 1)
        .and_then(|d| d.pred_opt())
        .ok_or_else(invalid)?;
    Ok((first, last))
}

/// Inclusive range of the grid shown for a month: from the Sunday on or before
/// the 1st to the Saturday on or after the last day.
pub fn grid_range(year: i32, month: u32) -> Result<DateRange, EngineError> {
    let (first, last) = month_bounds(year, month)?;
    let lead = u64::from(first.weekday().num_days_from_sunday());
    let trail = u64::from(6 - last.weekday().num_days_from_sunday());
    let start = first
        .checked_sub_days(Days::new(lead))
        .ok_or(EngineError::LimitExceeded("calendar start out of range"))?;
    let end = last
        .checked_add_days(Days::new(trail))
        .ok_or(EngineError::LimitExceeded("calendar end out of range"))?;
    DateRange::new(start, end)
}

/// Weeks of the month grid, Sunday through Saturday.
pub fn month_grid(year: i32, month: u32) -> Result<Vec<[Day; 7]>, EngineError> {
    let days: Vec<Day> = grid_range(year, month)?.days().collect();
    Ok(days
        .chunks_exact(7)
        .map(|week| std::array::from_fn(|i| week[i]))
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotDay {
    #[serde(flatten)]
    pub occupancy: OccupancyResult,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCell {
    pub date: Day,
    pub in_month: bool,
    /// One entry per catalog slot, in catalog order.
    pub slots: Vec<SlotDay>,
    /// Bookings whose range covers this day, whatever their status or slot.
    pub active: Vec<BookingId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    pub weeks: Vec<Vec<DayCell>>,
}

impl MonthView {
    pub fn build<P: OccupancyPolicy>(
        engine: &Engine<'_, P>,
        bookings: &[Booking],
        year: i32,
        month: u32,
    ) -> Result<Self, EngineError> {
        let range = grid_range(year, month)?;
        engine.note_unknown(bookings);
        let reports: Vec<SpanReport> = (0..engine.catalog().len())
            .map(|idx| engine.span_report(bookings, idx, &range))
            .collect();

        let cells: Vec<DayCell> = range
            .days()
            .enumerate()
            .map(|(i, date)| DayCell {
                date,
                in_month: date.year() == year && date.month() == month,
                slots: reports
                    .iter()
                    .map(|r| SlotDay {
                        occupancy: r.days[i].clone(),
                        severity: r.days[i].severity(),
                    })
                    .collect(),
                active: engine
                    .active_on(bookings, date)
                    .into_iter()
                    .map(|b| b.id.clone())
                    .collect(),
            })
            .collect();

        Ok(Self {
            year,
            month,
            weeks: cells.chunks(7).map(<[DayCell]>::to_vec).collect(),
        })
    }

    pub fn day(&self, date: Day) -> Option<&DayCell> {
        self.weeks.iter().flatten().find(|c| c.date == date)
    }

    /// In-month days where at least one slot has no room left.
    pub fn full_days(&self) -> impl Iterator<Item = &DayCell> {
        self.weeks
            .iter()
            .flatten()
            .filter(|c| c.in_month && c.slots.iter().any(|s| s.occupancy.available == 0))
    }
}
