use crate::engine::EngineError;

// ── Engine ──────────────────────────────────────────────────────

/// Counter: capacity checks run. Labels: outcome.
pub const CAPACITY_CHECKS_TOTAL: &str = "slotbook_capacity_checks_total";

/// Counter: occupying bookings skipped because their slot name is unknown.
/// Incremented once per booking per query.
pub const UNKNOWN_SLOT_TOTAL: &str = "slotbook_unknown_slot_total";

// ── Ledger ──────────────────────────────────────────────────────

/// Counter: ledger writes. Labels: op, status.
pub const LEDGER_WRITES_TOTAL: &str = "slotbook_ledger_writes_total";

/// Counter: overbooked slot-days found by reconciliation.
pub const OVERBOOKINGS_TOTAL: &str = "slotbook_overbookings_total";

/// Map an engine rejection to a short label for metrics.
pub fn rejection_label(err: &EngineError) -> &'static str {
    match err {
        EngineError::UnknownSlot(_) => "unknown_slot",
        EngineError::InvalidRange { .. } => "invalid_range",
        EngineError::InvalidDate(_) => "invalid_date",
        EngineError::CapacityExceeded { .. } => "capacity_exceeded",
        EngineError::CapacityZero(_) => "capacity_zero",
        EngineError::LimitExceeded(_) => "limit_exceeded",
    }
}
