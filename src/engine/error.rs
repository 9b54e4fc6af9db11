use crate::model::{Booking, Day};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    UnknownSlot(String),
    InvalidRange {
        start: Day,
        end: Day,
    },
    InvalidDate(String),
    /// Every saturated day in the requested span, and every occupying booking
    /// active on at least one of them.
    CapacityExceeded {
        slot: String,
        capacity: u32,
        dates: Vec<Day>,
        conflicting: Vec<Booking>,
    },
    CapacityZero(String),
    LimitExceeded(&'static str),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::UnknownSlot(name) => write!(f, "unknown slot: {name}"),
            EngineError::InvalidRange { start, end } => {
                write!(f, "invalid range: start {start} is after end {end}")
            }
            EngineError::InvalidDate(raw) => write!(f, "invalid date: {raw}"),
            EngineError::CapacityExceeded {
                slot,
                capacity,
                dates,
                conflicting,
            } => {
                let first = dates.first().map_or_else(String::new, |d| d.to_string());
                write!(
                    f,
                    "capacity {capacity} of '{slot}' exceeded on {first} ({} day(s), {} conflicting booking(s))",
                    dates.len(),
                    conflicting.len()
                )
            }
            EngineError::CapacityZero(slot) => {
                write!(f, "slot '{slot}' has capacity 0 and accepts no bookings")
            }
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
