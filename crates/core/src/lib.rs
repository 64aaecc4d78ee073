//! memdiff core library.
//!
//! In-memory line diff and three/four-way merge: tokenization of byte
//! buffers into zero-copy line tokens, optional whitespace and line-ending
//! normalization, Myers alignment over a pluggable token source, and two
//! renderers (unified diff hunks and merged text with conflict markers).

pub mod adapter;
pub mod config;
pub mod diff;
pub mod encoding;
pub mod engine;
pub mod errors;
pub mod normalize;
pub mod output;
pub mod source;

// Re-exports for convenience.
pub use config::{DiffOptions, EngineConfig, IgnoreSpace, MergeOptions, UnifiedOptions};
pub use diff::{Diff, DiffOutput, DiffRange, RangeKind, Span};
pub use encoding::OutputEncoding;
pub use engine::{DiffEngine, MergeOutcome};
pub use errors::{ConfigError, DiffError};
pub use output::{output_merge, output_unified, MergeSummary};
