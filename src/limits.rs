/// Longest range (in days, inclusive) accepted for a draft or a span query.
pub const MAX_RANGE_DAYS: i64 = 3 * 366;

/// Upper bound on canonical slots in one catalog.
pub const MAX_SLOTS: usize = 512;

/// Upper bound on canonical names, aliases and expansion labels.
pub const MAX_NAME_LEN: usize = 128;

/// Only catalog document versions up to this one are understood.
pub const CATALOG_VERSION: u32 = 1;
