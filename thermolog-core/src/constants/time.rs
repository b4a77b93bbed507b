//! Time-Related Constants

// ===== TIME UNIT CONVERSIONS =====

/// Milliseconds per second.
pub const MS_PER_SECOND: u64 = 1000;

// ===== SCHEDULER LIMITS =====

/// Shortest tick any periodic task may be configured with (milliseconds).
///
/// Intervals derived from the buffer size (e.g. `1 / resistances_to_keep`)
/// land well below one millisecond and get silently clamped by timers.
/// Configuration is rejected below this floor instead.
pub const MIN_TICK_MS: u64 = 10;

/// Default sampling tick (milliseconds), roughly 30 Hz.
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 33;

/// Default aggregation tick (milliseconds).
pub const DEFAULT_AGGREGATE_INTERVAL_MS: u64 = 2_000;

/// Default delivery and flush tick (milliseconds).
pub const DEFAULT_DELIVERY_INTERVAL_MS: u64 = 20_000;
