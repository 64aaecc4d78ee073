//! Renderers that turn a [`Diff`](crate::diff::Diff) into bytes.
//!
//! - [`unified`] writes context-windowed unified-diff hunks.
//! - [`merge`] writes merged text with conflict markers.

pub mod merge;
pub mod unified;

pub use merge::{output_merge, ConflictRegion, MergeSummary, MergeWriter};
pub use unified::{diff_label, output_unified, write_index_header, Revision, UnifiedWriter};

/// Line terminator for synthesized lines when none can be detected.
pub const DEFAULT_EOL: &str = if cfg!(windows) { "\r\n" } else { "\n" };
