use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};
use ulid::Ulid;

use crate::catalog::SlotCatalog;
use crate::config::Config;
use crate::engine::{Engine, EngineError, OccupancyPolicy, StatusSet};
use crate::model::*;
use crate::observability::{LEDGER_WRITES_TOTAL, OVERBOOKINGS_TOTAL};

/// Outcome of `BookingLedger::load`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub inserted: usize,
    pub replaced: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LedgerError {
    Engine(EngineError),
    NotFound(BookingId),
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::Engine(e) => write!(f, "{e}"),
            LedgerError::NotFound(id) => write!(f, "booking not found: {id}"),
        }
    }
}

impl std::error::Error for LedgerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LedgerError::Engine(e) => Some(e),
            LedgerError::NotFound(_) => None,
        }
    }
}

impl From<EngineError> for LedgerError {
    fn from(e: EngineError) -> Self {
        LedgerError::Engine(e)
    }
}

/// In-memory booking store whose write path re-checks capacity atomically.
///
/// `Engine::can_accept` only judges the snapshot it is given. Here every write
/// that can add occupancy takes the commit lock, re-reads the live records and
/// the current catalog, runs the check and applies the write before releasing
/// it, so concurrent writers cannot overbook a slot.
pub struct BookingLedger {
    catalog: RwLock<Arc<SlotCatalog>>,
    policy: StatusSet,
    records: DashMap<BookingId, Booking>,
    commit: Mutex<()>,
}

impl BookingLedger {
    pub fn new(catalog: SlotCatalog, policy: StatusSet) -> Self {
        Self {
            catalog: RwLock::new(Arc::new(catalog)),
            policy,
            records: DashMap::new(),
            commit: Mutex::new(()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.catalog.clone(), config.occupying.clone())
    }

    pub async fn catalog(&self) -> Arc<SlotCatalog> {
        self.catalog.read().await.clone()
    }

    /// Swap in an edited catalog. Existing records are kept as they are; run
    /// `reconcile` afterwards to find days a capacity cut left overbooked.
    pub async fn replace_catalog(&self, catalog: SlotCatalog) {
        let _guard = self.commit.lock().await;
        *self.catalog.write().await = Arc::new(catalog);
        info!("slot catalog replaced");
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<Booking> {
        self.records.get(id).map(|e| e.value().clone())
    }

    /// All records ordered by start date, then id.
    pub fn snapshot(&self) -> Vec<Booking> {
        let mut all: Vec<Booking> = self.records.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.start_date().cmp(&b.start_date()).then_with(|| a.id.cmp(&b.id)));
        all
    }

    /// Import records that already exist in the upstream store, unchecked.
    /// A record whose id is already held replaces the old one.
    pub async fn load(&self, bookings: Vec<Booking>) -> LoadReport {
        let _guard = self.commit.lock().await;
        let mut report = LoadReport::default();
        for booking in bookings {
            match self.records.insert(booking.id.clone(), booking) {
                Some(old) => {
                    warn!(id = %old.id, "load replaced an existing booking");
                    report.replaced += 1;
                }
                None => report.inserted += 1,
            }
        }
        if report.replaced > 0 {
            metrics::counter!(LEDGER_WRITES_TOTAL, "op" => "load_replace").increment(report.replaced as u64);
        }
        info!(inserted = report.inserted, replaced = report.replaced, "bookings loaded");
        report
    }

    /// Record a new booking. Occupying statuses must pass the capacity check
    /// against the live records; any status needs a recognised slot name.
    pub async fn book(&self, draft: BookingDraft, status: BookingStatus) -> Result<Booking, LedgerError> {
        let _guard = self.commit.lock().await;
        let catalog = self.catalog().await;

        if self.policy.occupies(&status) {
            let engine = Engine::new(&catalog, self.policy.clone());
            engine.can_accept(&self.snapshot(), &draft)?;
        } else if !catalog.is_known(&draft.slot_name) {
            return Err(EngineError::UnknownSlot(draft.slot_name).into());
        }

        let booking = Booking::from_draft(Ulid::new().to_string(), draft, status);
        self.records.insert(booking.id.clone(), booking.clone());
        metrics::counter!(LEDGER_WRITES_TOTAL, "op" => "book").increment(1);
        info!(
            id = %booking.id,
            slot = %booking.slot_name,
            range = %booking.range(),
            status = %booking.status,
            "booking recorded"
        );
        Ok(booking)
    }

    /// Move a booking to another pipeline stage. Promotion into an occupying
    /// status is checked against every other record.
    pub async fn set_status(&self, id: &str, status: BookingStatus) -> Result<Booking, LedgerError> {
        let _guard = self.commit.lock().await;
        let current = self.get(id).ok_or_else(|| LedgerError::NotFound(id.to_string()))?;

        if !self.policy.occupies(&current.status) && self.policy.occupies(&status) {
            let catalog = self.catalog().await;
            let engine = Engine::new(&catalog, self.policy.clone());
            let others: Vec<Booking> = self.snapshot().into_iter().filter(|b| b.id != id).collect();
            let draft = BookingDraft {
                advertiser_id: current.advertiser_id.clone(),
                slot_name: current.slot_name.clone(),
                range: current.range(),
            };
            engine.can_accept(&others, &draft)?;
        }

        let mut updated = current;
        let previous = std::mem::replace(&mut updated.status, status);
        self.records.insert(updated.id.clone(), updated.clone());
        metrics::counter!(LEDGER_WRITES_TOTAL, "op" => "set_status").increment(1);
        info!(id = %updated.id, from = %previous, to = %updated.status, "booking status changed");
        Ok(updated)
    }

    pub async fn cancel(&self, id: &str) -> Result<Booking, LedgerError> {
        self.set_status(id, BookingStatus::Cancelled).await
    }

    /// Delete a record outright.
    pub async fn remove(&self, id: &str) -> Result<Booking, LedgerError> {
        let _guard = self.commit.lock().await;
        let (_, removed) = self
            .records
            .remove(id)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        metrics::counter!(LEDGER_WRITES_TOTAL, "op" => "remove").increment(1);
        info!(id = %removed.id, "booking removed");
        Ok(removed)
    }

    /// Slot-days in `range` holding more occupying bookings than capacity.
    pub async fn reconcile(&self, range: &DateRange) -> Result<Vec<OccupancyResult>, LedgerError> {
        let catalog = self.catalog().await;
        let engine = Engine::new(&catalog, self.policy.clone());
        let found = engine.overbooked(&self.snapshot(), range)?;
        for day in &found {
            warn!(
                slot = %day.slot,
                date = %day.date,
                occupied = day.occupied,
                capacity = day.capacity,
                "slot overbooked"
            );
        }
        metrics::counter!(OVERBOOKINGS_TOTAL).increment(found.len() as u64);
        Ok(found)
    }
}
