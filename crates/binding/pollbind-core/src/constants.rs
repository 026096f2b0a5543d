// Engine-related constants

/// Prepended to every write so a target never receives empty content.
pub const RENDER_MARKER: &str = "<!-- rendered by pollbind -->";

/// Default polling rate (evaluations per second).
pub const DEFAULT_POLL_RATE_HZ: f64 = 12.0;

/// Default polling period in milliseconds (1000 / 12).
pub const DEFAULT_POLL_PERIOD_MS: f64 = 1000.0 / DEFAULT_POLL_RATE_HZ;
