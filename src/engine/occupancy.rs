use tracing::warn;

use crate::model::*;
use crate::observability::UNKNOWN_SLOT_TOTAL;

use super::overlap::{is_active_on, validate_range};
use super::{Engine, EngineError, OccupancyPolicy};

// ── Day sweep ─────────────────────────────────────────────────────

/// Per-day count of ranges covering each day of `window`.
///
/// Sweep over a difference array: +1 on the first covered day, -1 on the day
/// after the last one. Ranges outside the window are ignored.
pub fn daily_counts<I>(ranges: I, window: &DateRange) -> Vec<u32>
where
    I: IntoIterator<Item = DateRange>,
{
    let len = window.len_days() as usize;
    let mut delta = vec![0i64; len + 1];
    for range in ranges {
        let Some(clip) = range.intersection(window) else {
            continue;
        };
        let first = (clip.start() - window.start()).num_days() as usize;
        let last = (clip.end() - window.start()).num_days() as usize;
        delta[first] += 1;
        delta[last + 1] -= 1;
    }

    let mut counts = Vec::with_capacity(len);
    let mut running = 0i64;
    for d in &delta[..len] {
        running += d;
        counts.push(running as u32);
    }
    counts
}

/// Days of `window` where the count already meets `capacity`, ascending.
/// With capacity 0 every day is saturated.
pub fn compute_saturated_days(counts: &[u32], capacity: u32, window: &DateRange) -> Vec<Day> {
    window
        .days()
        .zip(counts)
        .filter(|(_, count)| **count >= capacity)
        .map(|(day, _)| day)
        .collect()
}

impl<P: OccupancyPolicy> Engine<'_, P> {
    /// Bookings whose range contains `date`, any status, any slot.
    pub fn active_on<'b>(&self, bookings: &'b [Booking], date: Day) -> Vec<&'b Booking> {
        bookings.iter().filter(|b| is_active_on(b, date)).collect()
    }

    /// Occupying bookings recorded under any name that resolves to slot `idx`.
    /// Bookings with unrecognised slot names contribute nothing.
    pub(super) fn occupying_for<'b>(&self, bookings: &'b [Booking], idx: usize) -> Vec<&'b Booking> {
        bookings
            .iter()
            .filter(|b| self.policy.occupies(&b.status) && self.catalog.resolve(&b.slot_name).contains(&idx))
            .collect()
    }

    /// Warn about and count occupying bookings whose slot name resolves to
    /// nothing. Each query calls this once, before its per-slot passes.
    pub(crate) fn note_unknown(&self, bookings: &[Booking]) {
        let unknown: Vec<&str> = bookings
            .iter()
            .filter(|b| self.policy.occupies(&b.status) && !self.catalog.is_known(&b.slot_name))
            .map(|b| b.id.as_str())
            .collect();
        if unknown.is_empty() {
            return;
        }
        warn!(
            count = unknown.len(),
            ids = ?unknown,
            "bookings with unrecognised slot names excluded from occupancy"
        );
        metrics::counter!(UNKNOWN_SLOT_TOTAL).increment(unknown.len() as u64);
    }

    pub(super) fn canonical_index(&self, slot: &str) -> Result<usize, EngineError> {
        self.catalog
            .index_of(slot)
            .ok_or_else(|| EngineError::UnknownSlot(slot.to_string()))
    }

    /// Occupancy of one canonical slot on one day.
    pub fn occupancy_on(
        &self,
        bookings: &[Booking],
        canonical_slot: &str,
        date: Day,
    ) -> Result<OccupancyResult, EngineError> {
        let idx = self.canonical_index(canonical_slot)?;
        self.note_unknown(bookings);
        let slot = self.catalog.slot_at(idx);
        let occupied = self
            .occupying_for(bookings, idx)
            .into_iter()
            .filter(|b| is_active_on(b, date))
            .count() as u32;
        Ok(OccupancyResult::new(slot.name.trim(), date, occupied, slot.capacity))
    }

    /// Day-by-day occupancy of one canonical slot across `range`.
    pub fn occupancy_over(
        &self,
        bookings: &[Booking],
        canonical_slot: &str,
        range: &DateRange,
    ) -> Result<SpanReport, EngineError> {
        validate_range(range)?;
        let idx = self.canonical_index(canonical_slot)?;
        self.note_unknown(bookings);
        Ok(self.span_report(bookings, idx, range))
    }

    pub(crate) fn span_report(&self, bookings: &[Booking], idx: usize, range: &DateRange) -> SpanReport {
        let slot = self.catalog.slot_at(idx);
        let name = slot.name.trim();
        let counts = daily_counts(
            self.occupying_for(bookings, idx).iter().map(|b| b.range()),
            range,
        );
        let days = range
            .days()
            .zip(counts)
            .map(|(day, occupied)| OccupancyResult::new(name, day, occupied, slot.capacity))
            .collect();
        SpanReport {
            slot: name.to_string(),
            range: *range,
            days,
        }
    }

    /// Every slot-day in `range` holding more occupying bookings than capacity,
    /// in catalog order, then by date.
    pub fn overbooked(&self, bookings: &[Booking], range: &DateRange) -> Result<Vec<OccupancyResult>, EngineError> {
        validate_range(range)?;
        self.note_unknown(bookings);
        let mut found = Vec::new();
        for idx in 0..self.catalog.len() {
            let report = self.span_report(bookings, idx, range);
            found.extend(report.days.into_iter().filter(OccupancyResult::is_overbooked));
        }
        Ok(found)
    }
}
