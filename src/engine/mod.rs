mod acceptance;
mod error;
mod occupancy;
mod overlap;
mod severity;
#[cfg(test)]
mod tests;

pub use acceptance::{Accepted, SlotHeadroom};
pub use error::EngineError;
pub use occupancy::{compute_saturated_days, daily_counts};
pub use overlap::{is_active_on, ranges_overlap};
pub use severity::{Severity, SEVERITY_BANDS};

use std::collections::BTreeSet;

use crate::catalog::SlotCatalog;
use crate::model::BookingStatus;

/// Decides which pipeline statuses consume slot capacity.
pub trait OccupancyPolicy {
    fn occupies(&self, status: &BookingStatus) -> bool;
}

impl<F> OccupancyPolicy for F
where
    F: Fn(&BookingStatus) -> bool,
{
    fn occupies(&self, status: &BookingStatus) -> bool {
        self(status)
    }
}

/// Explicit set of occupying statuses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSet(BTreeSet<BookingStatus>);

impl StatusSet {
    pub fn new<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = BookingStatus>,
    {
        Self(statuses.into_iter().collect())
    }

    /// Booking confirmed (부킹확정) and executing (집행중).
    pub fn confirmed_and_executing() -> Self {
        Self::new([BookingStatus::Confirmed, BookingStatus::Executing])
    }

    pub fn contains(&self, status: &BookingStatus) -> bool {
        self.0.contains(status)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BookingStatus> {
        self.0.iter()
    }
}

impl OccupancyPolicy for StatusSet {
    fn occupies(&self, status: &BookingStatus) -> bool {
        self.contains(status)
    }
}

/// Query surface over one catalog and one occupancy policy.
///
/// Holds no state of its own: every method is a pure function of the booking
/// snapshot passed in, so the same engine may serve any number of threads.
pub struct Engine<'a, P> {
    catalog: &'a SlotCatalog,
    policy: P,
}

impl<'a, P: OccupancyPolicy> Engine<'a, P> {
    pub fn new(catalog: &'a SlotCatalog, policy: P) -> Self {
        Self { catalog, policy }
    }

    pub fn catalog(&self) -> &'a SlotCatalog {
        self.catalog
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Canonical slots a recorded name counts against.
    pub fn normalize(&self, raw: &str) -> BTreeSet<&'a str> {
        self.catalog.normalize(raw)
    }
}
