use serde::Serialize;
use tracing::debug;

use crate::model::*;
use crate::observability::{rejection_label, CAPACITY_CHECKS_TOTAL};

use super::occupancy::{compute_saturated_days, daily_counts};
use super::overlap::validate_range;
use super::{Engine, EngineError, OccupancyPolicy};

/// Headroom left on one canonical slot if the draft were accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotHeadroom {
    pub slot: String,
    pub capacity: u32,
    /// Highest daily occupancy across the draft's span, the draft included.
    pub peak_after: u32,
}

/// Successful capacity check: one entry per canonical slot the draft touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Accepted {
    pub slots: Vec<SlotHeadroom>,
}

impl<P: OccupancyPolicy> Engine<'_, P> {
    /// Would `draft` fit on every day of its range, on every slot its name
    /// resolves to?
    ///
    /// Advisory only: the answer holds for the snapshot passed in. A store that
    /// accepts concurrent writers must re-run the check atomically with the
    /// insert (see `BookingLedger`), otherwise two callers can both pass and
    /// overbook the slot together.
    pub fn can_accept(&self, bookings: &[Booking], draft: &BookingDraft) -> Result<Accepted, EngineError> {
        let result = self.check_draft(bookings, draft);
        let outcome = match &result {
            Ok(_) => "accepted",
            Err(e) => rejection_label(e),
        };
        metrics::counter!(CAPACITY_CHECKS_TOTAL, "outcome" => outcome).increment(1);
        debug!(
            slot = %draft.slot_name,
            range = %draft.range,
            outcome,
            "capacity check"
        );
        result
    }

    fn check_draft(&self, bookings: &[Booking], draft: &BookingDraft) -> Result<Accepted, EngineError> {
        validate_range(&draft.range)?;
        let targets = self.catalog.resolve(&draft.slot_name);
        if targets.is_empty() {
            return Err(EngineError::UnknownSlot(draft.slot_name.clone()));
        }
        self.note_unknown(bookings);

        let mut slots = Vec::with_capacity(targets.len());
        for &idx in targets {
            let slot = self.catalog.slot_at(idx);
            let name = slot.name.trim();
            if slot.capacity == 0 {
                return Err(EngineError::CapacityZero(name.to_string()));
            }

            let overlapping: Vec<&Booking> = self
                .occupying_for(bookings, idx)
                .into_iter()
                .filter(|b| b.range().overlaps(&draft.range))
                .collect();
            let counts = daily_counts(overlapping.iter().map(|b| b.range()), &draft.range);
            let saturated = compute_saturated_days(&counts, slot.capacity, &draft.range);

            if !saturated.is_empty() {
                let conflicting = overlapping
                    .into_iter()
                    .filter(|b| covers_any(&b.range(), &saturated))
                    .cloned()
                    .collect();
                return Err(EngineError::CapacityExceeded {
                    slot: name.to_string(),
                    capacity: slot.capacity,
                    dates: saturated,
                    conflicting,
                });
            }

            slots.push(SlotHeadroom {
                slot: name.to_string(),
                capacity: slot.capacity,
                peak_after: counts.iter().copied().max().unwrap_or(0) + 1,
            });
        }
        Ok(Accepted { slots })
    }
}

/// Does `range` contain any of the ascending `days`?
fn covers_any(range: &DateRange, days: &[Day]) -> bool {
    let i = days.partition_point(|d| *d < range.start());
    i < days.len() && days[i] <= range.end()
}
