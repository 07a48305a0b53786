//! Constants used throughout the LST core crate.
//!
//! Bucketing thresholds and pagination defaults live here so the values are
//! named once and referenced everywhere they apply.

/// Page size used when a caller does not specify a limit.
pub const DEFAULT_PAGE_LIMIT: usize = 25;

/// Hard upper bound on a single page of results.
pub const MAX_PAGE_LIMIT: usize = 100;

/// Ranges up to this many days are charted with one point per calendar day.
pub const DAY_BUCKET_MAX_DAYS: u32 = 90;

/// Ranges up to this many days are charted with one point per ISO week.
pub const WEEK_BUCKET_MAX_DAYS: u32 = 365;

/// How far back an all-time series starts when the facility has no
/// specimens yet.
pub const ALL_TIME_FALLBACK_DAYS: i64 = 30;
