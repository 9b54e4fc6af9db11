use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::engine::{EngineError, Severity};

/// Calendar day in the configured zone. Every date in the crate is one of these.
pub type Day = NaiveDate;

/// Opaque identifier owned by the record store.
pub type BookingId = String;

pub const DEFAULT_TZ: Tz = chrono_tz::Asia::Seoul;

/// Today's calendar date as seen in `tz`.
pub fn today_in(tz: Tz) -> Day {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Parse a record-store date. Plain `YYYY-MM-DD` is taken as-is; a full
/// RFC 3339 instant is moved into `tz` before its date is taken.
pub fn parse_day(raw: &str, tz: Tz) -> Result<Day, EngineError> {
    let raw = raw.trim();
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(day);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|instant| instant.with_timezone(&tz).date_naive())
        .map_err(|_| EngineError::InvalidDate(raw.to_string()))
}

/// Inclusive range `[start, end]` of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    start: Day,
    end: Day,
}

impl DateRange {
    pub fn new(start: Day, end: Day) -> Result<Self, EngineError> {
        if start > end {
            return Err(EngineError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn single(day: Day) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    pub fn start(&self) -> Day {
        self.start
    }

    pub fn end(&self) -> Day {
        self.end
    }

    /// Number of days covered, both ends counted.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, day: Day) -> bool {
        self.start <= day && day <= self.end
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn intersection(&self, other: &DateRange) -> Option<DateRange> {
        if !self.overlaps(other) {
            return None;
        }
        Some(DateRange {
            start: self.start.max(other.start),
            end: self.end.min(other.end),
        })
    }

    pub fn days(&self) -> impl Iterator<Item = Day> + use<> {
        self.start.iter_days().take(self.len_days() as usize)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Sales-pipeline stage of a booking.
///
/// The record store uses Korean labels; English spellings are accepted as well.
/// Anything unrecognised is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BookingStatus {
    Inquiry,
    Quoted,
    Confirmed,
    Executing,
    Completed,
    Cancelled,
    Other(String),
}

impl BookingStatus {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw {
            "문의" => return BookingStatus::Inquiry,
            "견적" => return BookingStatus::Quoted,
            "부킹확정" => return BookingStatus::Confirmed,
            "집행중" => return BookingStatus::Executing,
            "집행완료" | "완료" => return BookingStatus::Completed,
            "취소" => return BookingStatus::Cancelled,
            _ => {}
        }
        match raw.to_ascii_lowercase().as_str() {
            "inquiry" => BookingStatus::Inquiry,
            "quoted" | "quoting" => BookingStatus::Quoted,
            "confirmed" => BookingStatus::Confirmed,
            "executing" | "in-flight" => BookingStatus::Executing,
            "completed" => BookingStatus::Completed,
            "cancelled" | "canceled" => BookingStatus::Cancelled,
            _ => BookingStatus::Other(raw.to_string()),
        }
    }

    /// Label as written back to the record store.
    pub fn label(&self) -> &str {
        match self {
            BookingStatus::Inquiry => "문의",
            BookingStatus::Quoted => "견적",
            BookingStatus::Confirmed => "부킹확정",
            BookingStatus::Executing => "집행중",
            BookingStatus::Completed => "집행완료",
            BookingStatus::Cancelled => "취소",
            BookingStatus::Other(label) => label,
        }
    }
}

impl From<String> for BookingStatus {
    fn from(raw: String) -> Self {
        BookingStatus::parse(&raw)
    }
}

impl From<BookingStatus> for String {
    fn from(status: BookingStatus) -> Self {
        status.label().to_string()
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A booking exactly as the record store hands it over: dates still strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    pub id: BookingId,
    #[serde(default)]
    pub advertiser_id: String,
    pub slot_name: String,
    pub start_date: String,
    pub end_date: String,
    pub status: BookingStatus,
}

impl BookingRecord {
    /// Validate into a `Booking`, reading instants as dates in `tz`.
    pub fn into_booking(self, tz: Tz) -> Result<Booking, EngineError> {
        let start = parse_day(&self.start_date, tz)?;
        let end = parse_day(&self.end_date, tz)?;
        Ok(Booking {
            id: self.id,
            advertiser_id: self.advertiser_id,
            slot_name: self.slot_name,
            range: DateRange::new(start, end)?,
            status: self.status,
        })
    }
}

/// A validated booking. `start <= end` holds for every value of this type.
///
/// Not `Deserialize`: reading dates needs a zone, so records come in through
/// `BookingRecord::into_booking` or `Snapshot`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "BookingRecord")]
pub struct Booking {
    pub id: BookingId,
    pub advertiser_id: String,
    pub slot_name: String,
    range: DateRange,
    pub status: BookingStatus,
}

impl Booking {
    pub fn new(
        id: impl Into<BookingId>,
        advertiser_id: impl Into<String>,
        slot_name: impl Into<String>,
        start: Day,
        end: Day,
        status: BookingStatus,
    ) -> Result<Self, EngineError> {
        Ok(Self {
            id: id.into(),
            advertiser_id: advertiser_id.into(),
            slot_name: slot_name.into(),
            range: DateRange::new(start, end)?,
            status,
        })
    }

    pub fn from_draft(id: impl Into<BookingId>, draft: BookingDraft, status: BookingStatus) -> Self {
        Self {
            id: id.into(),
            advertiser_id: draft.advertiser_id,
            slot_name: draft.slot_name,
            range: draft.range,
            status,
        }
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn start_date(&self) -> Day {
        self.range.start
    }

    pub fn end_date(&self) -> Day {
        self.range.end
    }
}

impl From<Booking> for BookingRecord {
    fn from(booking: Booking) -> Self {
        BookingRecord {
            id: booking.id,
            advertiser_id: booking.advertiser_id,
            slot_name: booking.slot_name,
            start_date: booking.range.start.format("%Y-%m-%d").to_string(),
            end_date: booking.range.end.format("%Y-%m-%d").to_string(),
            status: booking.status,
        }
    }
}

/// A proposed booking, assumed space-occupying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingDraft {
    pub advertiser_id: String,
    pub slot_name: String,
    pub range: DateRange,
}

impl BookingDraft {
    pub fn new(
        advertiser_id: impl Into<String>,
        slot_name: impl Into<String>,
        start: Day,
        end: Day,
    ) -> Result<Self, EngineError> {
        Ok(Self {
            advertiser_id: advertiser_id.into(),
            slot_name: slot_name.into(),
            range: DateRange::new(start, end)?,
        })
    }
}

// ── Query result types ───────────────────────────────────────────

/// Occupancy of one canonical slot on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancyResult {
    pub slot: String,
    pub date: Day,
    pub occupied: u32,
    pub capacity: u32,
    pub available: u32,
    pub occupancy_rate: f64,
}

impl OccupancyResult {
    /// Capacity 0 is always full: `available = 0`, rate 1.0.
    pub fn new(slot: impl Into<String>, date: Day, occupied: u32, capacity: u32) -> Self {
        let occupancy_rate = if capacity == 0 {
            1.0
        } else {
            f64::from(occupied) / f64::from(capacity)
        };
        Self {
            slot: slot.into(),
            date,
            occupied,
            capacity,
            available: capacity.saturating_sub(occupied),
            occupancy_rate,
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::classify(self.occupancy_rate)
    }

    pub fn is_overbooked(&self) -> bool {
        self.occupied > self.capacity
    }
}

/// Day-by-day occupancy of one slot across a range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanReport {
    pub slot: String,
    pub range: DateRange,
    pub days: Vec<OccupancyResult>,
}

impl SpanReport {
    /// Busiest day; the earliest one on ties.
    pub fn peak(&self) -> Option<&OccupancyResult> {
        self.days
            .iter()
            .reduce(|best, day| if day.occupied > best.occupied { day } else { best })
    }

    pub fn mean_rate(&self) -> f64 {
        if self.days.is_empty() {
            return 0.0;
        }
        self.days.iter().map(|d| d.occupancy_rate).sum::<f64>() / self.days.len() as f64
    }

    pub fn overbooked_days(&self) -> impl Iterator<Item = &OccupancyResult> {
        self.days.iter().filter(|d| d.is_overbooked())
    }

    /// Days with no capacity left.
    pub fn full_days(&self) -> impl Iterator<Item = &OccupancyResult> {
        self.days.iter().filter(|d| d.available == 0)
    }
}
