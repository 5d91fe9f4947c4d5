// Constants module for cosmic-notch
// Centralizes magic numbers of the host shell; arbitration timings live in
// cosmic-notch-config

// ============================================================================
// Logging Constants
// ============================================================================

/// Filter used when `RUST_LOG` is unset
pub(crate) const DEFAULT_LOG_FILTER: &str = "warn,cosmic_notch=info,cosmic_notch_util=info";

// ============================================================================
// Anchor Constants
// ============================================================================

/// Environment variable overriding the anchor region as `x,y,width`
pub(crate) const MONITOR_ENV: &str = "COSMIC_NOTCH_MONITOR";

/// Width of the anchor region when no monitor is configured
pub(crate) const DEFAULT_MONITOR_WIDTH: f32 = 1920.0;

// ============================================================================
// Channel and Buffer Constants
// ============================================================================

/// Buffer size for the message channel feeding the controller
pub(crate) const CHANNEL_BUFFER_SIZE: usize = 100;

/// Longest accepted input line from the event source (64KB)
pub(crate) const MAX_LINE_LENGTH: usize = 64 * 1024;

// ============================================================================
// Display Text Constants
// ============================================================================

/// Maximum length of titles before truncation in view summaries
pub(crate) const SUMMARY_MAX_LENGTH: usize = 40;
