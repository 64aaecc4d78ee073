//! Entry points tying tokenization, alignment and rendering together.
//!
//! The free functions align buffers and return a [`Diff`]; [`DiffEngine`]
//! carries a validated [`EngineConfig`] and renders straight to bytes.
//! Every call builds its own [`MemTokenSource`], so all scratch state is
//! released when the call returns.

use std::io::Write;

use tracing::info;

use crate::adapter::MemTokenSource;
use crate::config::{DiffOptions, EngineConfig};
use crate::diff::{self, Diff};
use crate::errors::DiffError;
use crate::output::{output_merge, output_unified, MergeSummary};

/// Two-way diff of `original` against `modified`.
pub fn diff(original: &[u8], modified: &[u8], options: &DiffOptions) -> Diff {
    let mut source = MemTokenSource::two_way(original, modified, *options);
    diff::diff2(&mut source)
}

/// Three-way diff of `modified` and `latest` against their common
/// `original`.
pub fn diff3(original: &[u8], modified: &[u8], latest: &[u8], options: &DiffOptions) -> Diff {
    let mut source = MemTokenSource::three_way(original, modified, latest, *options);
    diff::diff3(&mut source)
}

/// Three-way diff that also consults `ancestor`, the common ancestor of
/// `original` and `modified`.
pub fn diff4(
    original: &[u8],
    modified: &[u8],
    latest: &[u8],
    ancestor: &[u8],
    options: &DiffOptions,
) -> Diff {
    let mut source =
        MemTokenSource::four_way(original, modified, latest, ancestor, *options);
    diff::diff4(&mut source)
}

/// Merged text together with what the merge pass found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub content: Vec<u8>,
    pub summary: MergeSummary,
}

impl MergeOutcome {
    pub fn has_conflicts(&self) -> bool {
        self.summary.has_conflicts()
    }
}

/// Diff and merge with a fixed, validated configuration.
#[derive(Debug, Clone)]
pub struct DiffEngine {
    config: EngineConfig,
}

impl DiffEngine {
    /// Create an engine, rejecting an invalid configuration up front.
    pub fn new(config: EngineConfig) -> Result<Self, DiffError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Unified diff of `original` against `modified` as bytes. Empty when
    /// the inputs compare equal.
    pub fn unified(
        &self,
        original: &[u8],
        modified: &[u8],
        original_header: &str,
        modified_header: &str,
    ) -> Result<Vec<u8>, DiffError> {
        let mut out = Vec::new();
        self.write_unified(&mut out, original, modified, original_header, modified_header)?;
        Ok(out)
    }

    /// Like [`unified`](Self::unified), writing to `sink`. Returns whether
    /// the inputs differ.
    pub fn write_unified<W: Write + ?Sized>(
        &self,
        sink: &mut W,
        original: &[u8],
        modified: &[u8],
        original_header: &str,
        modified_header: &str,
    ) -> Result<bool, DiffError> {
        info!(
            original_bytes = original.len(),
            modified_bytes = modified.len(),
            context_size = self.config.unified.context_size,
            "computing unified diff"
        );

        let diff = diff(original, modified, &self.config.diff);
        output_unified(
            sink,
            &diff,
            original_header,
            modified_header,
            &self.config.unified,
            original,
            modified,
        )?;
        Ok(diff.contains_diffs())
    }

    /// Merge the changes from `original` to `latest` into `modified`.
    pub fn merge(
        &self,
        original: &[u8],
        modified: &[u8],
        latest: &[u8],
    ) -> Result<MergeOutcome, DiffError> {
        info!(
            original_bytes = original.len(),
            modified_bytes = modified.len(),
            latest_bytes = latest.len(),
            "performing three-way merge"
        );
        let diff = diff3(original, modified, latest, &self.config.diff);
        self.render_merge(&diff, original, modified, latest)
    }

    /// [`merge`](Self::merge), using `ancestor` to settle conflicts where
    /// `modified` still carries the ancestor's text.
    pub fn merge_with_ancestor(
        &self,
        original: &[u8],
        modified: &[u8],
        latest: &[u8],
        ancestor: &[u8],
    ) -> Result<MergeOutcome, DiffError> {
        info!(
            original_bytes = original.len(),
            modified_bytes = modified.len(),
            latest_bytes = latest.len(),
            ancestor_bytes = ancestor.len(),
            "performing four-way merge"
        );
        let diff = diff4(original, modified, latest, ancestor, &self.config.diff);
        self.render_merge(&diff, original, modified, latest)
    }

    fn render_merge(
        &self,
        diff: &Diff,
        original: &[u8],
        modified: &[u8],
        latest: &[u8],
    ) -> Result<MergeOutcome, DiffError> {
        let mut content = Vec::with_capacity(modified.len().max(latest.len()));
        let summary = output_merge(
            &mut content,
            diff,
            original,
            modified,
            latest,
            &self.config.merge,
        )?;

        info!(
            conflicts = summary.conflicts.len(),
            lines = summary.lines_written,
            "merge complete"
        );
        Ok(MergeOutcome { content, summary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IgnoreSpace;
    use crate::diff::RangeKind;

    #[test]
    fn test_diff_identical_is_all_common() {
        let text = b"one\ntwo\r\nthree";
        let d = diff(text, text, &DiffOptions::default());
        assert!(!d.contains_diffs());
        assert!(d.ranges().iter().all(|r| r.kind == RangeKind::Common));
        assert_eq!(d.ranges().iter().map(|r| r.original.len).sum::<usize>(), 3);
    }

    #[test]
    fn test_diff_respects_whitespace_options() {
        let options = DiffOptions {
            ignore_space: IgnoreSpace::Change,
            ..DiffOptions::default()
        };
        assert!(!diff(b"a  b\n", b"a b\n", &options).contains_diffs());
        assert!(diff(b"a  b\n", b"a b\n", &DiffOptions::default()).contains_diffs());
    }

    #[test]
    fn test_engine_rejects_invalid_config() {
        let mut config = EngineConfig::default();
        config.merge.markers.modified = Some(String::new());
        assert!(matches!(DiffEngine::new(config), Err(DiffError::Config(_))));
    }

    #[test]
    fn test_engine_unified_and_merge() {
        let engine = DiffEngine::new(EngineConfig::default()).unwrap();

        let out = engine.unified(b"a\nb\nc\n", b"a\nx\nc\n", "a.txt", "b.txt").unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "--- a.txt\n+++ b.txt\n@@ -1,3 +1,3 @@\n a\n-b\n+x\n c\n"
        );
        assert!(engine.unified(b"same\n", b"same\n", "a", "b").unwrap().is_empty());

        let outcome = engine.merge(b"1\n2\n3\n", b"1\n2\n3\n", b"1\nZ\n3\n").unwrap();
        assert_eq!(outcome.content, b"1\nZ\n3\n");
        assert!(!outcome.has_conflicts());
    }

    #[test]
    fn test_engine_merge_with_ancestor() {
        let engine = DiffEngine::new(EngineConfig::default()).unwrap();
        let outcome = engine
            .merge_with_ancestor(b"a\ny\nc\n", b"a\nx\nc\n", b"a\nz\nc\n", b"a\nx\nc\n")
            .unwrap();
        assert_eq!(outcome.content, b"a\nz\nc\n");
        assert!(!outcome.has_conflicts());

        let outcome = engine
            .merge(b"a\ny\nc\n", b"a\nx\nc\n", b"a\nz\nc\n")
            .unwrap();
        assert!(outcome.has_conflicts());
    }
}
