//! Output formatting utilities
//!
//! Formatters for human-readable and JSON output, listing tables, and the
//! progress spinner shown while pages load.

mod formatter;
mod listing;
mod progress;

pub use formatter::Formatter;
pub use listing::{EntryKind, ListingOutput, listing_table, summary_line};
pub use progress::Spinner;

/// Output configuration derived from CLI flags
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Use JSON output format
    pub json: bool,
    /// Disable colored output
    pub no_color: bool,
    /// Disable progress spinner
    pub no_progress: bool,
    /// Suppress non-error output
    pub quiet: bool,
}
