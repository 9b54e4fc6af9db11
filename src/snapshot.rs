use chrono_tz::Tz;
use tracing::warn;

use crate::engine::EngineError;
use crate::model::{Booking, BookingId, BookingRecord};

/// A record the store returned that could not enter the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRecord {
    pub id: BookingId,
    pub error: EngineError,
}

/// Validated bookings from one record-store listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub bookings: Vec<Booking>,
    pub rejected: Vec<RejectedRecord>,
}

impl Snapshot {
    /// Validate raw records. Bad dates and reversed ranges are set aside with
    /// their error; the rest of the listing is still usable.
    pub fn from_records(records: Vec<BookingRecord>, tz: Tz) -> Self {
        let mut snapshot = Snapshot::default();
        for record in records {
            let id = record.id.clone();
            match record.into_booking(tz) {
                Ok(booking) => snapshot.bookings.push(booking),
                Err(error) => {
                    warn!(id = %id, "rejected booking record: {error}");
                    snapshot.rejected.push(RejectedRecord { id, error });
                }
            }
        }
        snapshot
    }

    /// Parse a JSON array of records as listed by the store.
    pub fn from_json(json: &str, tz: Tz) -> Result<Self, serde_json::Error> {
        let records: Vec<BookingRecord> = serde_json::from_str(json)?;
        Ok(Self::from_records(records, tz))
    }
}
