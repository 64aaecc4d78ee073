//! Unified-diff rendering.
//!
//! [`UnifiedWriter`] consumes the ranges of a two-way [`Diff`] and builds one
//! hunk at a time. A hunk grows while consecutive changes are no more than
//! twice the context size apart; otherwise it is flushed with its trailing
//! context and a new one starts.

use std::fmt;
use std::io::Write;

use tracing::trace;

use super::DEFAULT_EOL;
use crate::config::UnifiedOptions;
use crate::diff::{Diff, DiffOutput, DiffRange};
use crate::encoding::OutputEncoding;
use crate::errors::DiffError;
use crate::source::SourceTokens;

const ORIGINAL: usize = 0;
const MODIFIED: usize = 1;

/// Width of the separator line under an `Index:` header.
const INDEX_RULE_WIDTH: usize = 67;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Context,
    Delete,
    Insert,
}

impl LineKind {
    fn prefix(self) -> &'static str {
        match self {
            Self::Context => " ",
            Self::Delete => "-",
            Self::Insert => "+",
        }
    }
}

/// Which revision a header label refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Revision {
    Number(u64),
    WorkingCopy,
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "revision {n}"),
            Self::WorkingCopy => write!(f, "working copy"),
        }
    }
}

/// Header label in the conventional `path<TAB>(revision N)` form.
pub fn diff_label(path: &str, revision: Revision) -> String {
    format!("{path}\t({revision})")
}

/// Write an `Index: <path>` line followed by a rule of `=` characters.
pub fn write_index_header<W: Write + ?Sized>(
    sink: &mut W,
    encoding: OutputEncoding,
    path: &str,
) -> Result<(), DiffError> {
    let header = format!(
        "Index: {path}{DEFAULT_EOL}{}{DEFAULT_EOL}",
        "=".repeat(INDEX_RULE_WIDTH)
    );
    sink.write_all(&encoding.encode(&header)?)?;
    Ok(())
}

/// Hunk assembler for one unified-diff pass.
pub struct UnifiedWriter<'a, 's, W: Write + ?Sized> {
    sink: &'s mut W,
    sources: [SourceTokens<'a>; 2],
    context_size: usize,
    encoding: OutputEncoding,

    /// Encoded line prefixes, indexed like [`LineKind`].
    prefixes: [Vec<u8>; 3],
    no_eol_notice: Vec<u8>,

    hunk: Vec<u8>,
    hunk_start: [usize; 2],
    hunk_length: [usize; 2],
    hunks_written: usize,
}

impl<'a, 's, W: Write + ?Sized> UnifiedWriter<'a, 's, W> {
    pub fn new(
        sink: &'s mut W,
        original: &'a [u8],
        modified: &'a [u8],
        options: &UnifiedOptions,
    ) -> Result<Self, DiffError> {
        options.validate()?;
        let encoding = options.header_encoding;

        let prefixes = [
            encoding.encode(LineKind::Context.prefix())?.into_owned(),
            encoding.encode(LineKind::Delete.prefix())?.into_owned(),
            encoding.encode(LineKind::Insert.prefix())?.into_owned(),
        ];
        let notice = format!("{DEFAULT_EOL}\\ No newline at end of file{DEFAULT_EOL}");
        let no_eol_notice = encoding.encode(&notice)?.into_owned();

        Ok(Self {
            sink,
            sources: [SourceTokens::new(original), SourceTokens::new(modified)],
            context_size: options.context_size,
            encoding,
            prefixes,
            no_eol_notice,
            hunk: Vec::new(),
            hunk_start: [0; 2],
            hunk_length: [0; 2],
            hunks_written: 0,
        })
    }

    /// Write the `---` / `+++` file header.
    pub fn write_file_header(
        &mut self,
        original_header: &str,
        modified_header: &str,
    ) -> Result<(), DiffError> {
        let header =
            format!("--- {original_header}{DEFAULT_EOL}+++ {modified_header}{DEFAULT_EOL}");
        self.sink.write_all(&self.encoding.encode(&header)?)?;
        Ok(())
    }

    /// Flush the last hunk. Returns the number of hunks written.
    pub fn finish(mut self) -> Result<usize, DiffError> {
        self.flush_hunk()?;
        Ok(self.hunks_written)
    }

    /// First original token not yet part of any hunk.
    fn next_token(&self) -> usize {
        self.sources[ORIGINAL].next_token()
    }

    /// Append tokens `[first, past_last)` of one side to the current hunk.
    /// Context never re-emits original tokens already written.
    fn token_range(&mut self, side: usize, kind: LineKind, first: usize, past_last: usize) {
        let source = &self.sources[side];
        let past_last = past_last.min(source.len());
        let first = if side == ORIGINAL {
            first.max(source.next_token())
        } else {
            first
        };

        if first >= past_last {
            return;
        }

        let prefix = &self.prefixes[kind as usize];
        for token in &source.tokens()[first..past_last] {
            self.hunk.extend_from_slice(prefix);
            self.hunk.extend_from_slice(token);
        }
        match kind {
            LineKind::Context => {
                self.hunk_length[ORIGINAL] += past_last - first;
                self.hunk_length[MODIFIED] += past_last - first;
            }
            LineKind::Delete => self.hunk_length[ORIGINAL] += past_last - first,
            LineKind::Insert => self.hunk_length[MODIFIED] += past_last - first,
        }

        if past_last == source.len() && source.ends_without_eol() {
            self.hunk.extend_from_slice(&self.no_eol_notice);
        }

        if side == ORIGINAL {
            self.sources[ORIGINAL].seek(past_last);
        }
    }

    fn flush_hunk(&mut self) -> Result<(), DiffError> {
        if self.hunk.is_empty() {
            return Ok(());
        }

        let target = self.hunk_start[ORIGINAL] + self.hunk_length[ORIGINAL] + self.context_size;
        self.token_range(ORIGINAL, LineKind::Context, self.next_token(), target);

        let header = format!(
            "@@ -{} +{} @@{DEFAULT_EOL}",
            HunkSide(self.hunk_start[ORIGINAL], self.hunk_length[ORIGINAL]),
            HunkSide(self.hunk_start[MODIFIED], self.hunk_length[MODIFIED]),
        );
        trace!(
            original_start = self.hunk_start[ORIGINAL],
            original_len = self.hunk_length[ORIGINAL],
            modified_start = self.hunk_start[MODIFIED],
            modified_len = self.hunk_length[MODIFIED],
            "flushing hunk"
        );

        self.sink.write_all(&self.encoding.encode(&header)?)?;
        self.sink.write_all(&self.hunk)?;

        self.hunk_length = [0; 2];
        self.hunk.clear();
        self.hunks_written += 1;
        Ok(())
    }
}

/// One side of a hunk header: a 1-based start (left 0-based for an empty
/// side) and a length that is omitted when it is 1.
struct HunkSide(usize, usize);

impl fmt::Display for HunkSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let HunkSide(start, len) = *self;
        let start = if len > 0 { start + 1 } else { start };
        if len == 1 {
            write!(f, "{start}")
        } else {
            write!(f, "{start},{len}")
        }
    }
}

impl<W: Write + ?Sized> DiffOutput for UnifiedWriter<'_, '_, W> {
    fn output_diff_modified(&mut self, range: &DiffRange) -> Result<(), DiffError> {
        let (original, modified) = (range.original, range.modified);
        let lead = original
            .start
            .saturating_sub(self.context_size)
            .max(self.next_token());

        if self.next_token() + self.context_size < lead {
            self.flush_hunk()?;
        }

        // An open hunk takes every common line since the previous change.
        let context_start = if self.hunk_length == [0, 0] {
            self.hunk_start[ORIGINAL] = lead;
            self.hunk_start[MODIFIED] = modified
                .start
                .saturating_sub(original.start.saturating_sub(lead));
            lead
        } else {
            self.next_token()
        };

        self.token_range(ORIGINAL, LineKind::Context, context_start, original.start);
        self.token_range(ORIGINAL, LineKind::Delete, original.start, original.end());
        self.token_range(MODIFIED, LineKind::Insert, modified.start, modified.end());
        Ok(())
    }
}

/// Render `diff` of `original` against `modified` as a unified diff.
///
/// Writes nothing, not even the file header, when the diff has no changes.
pub fn output_unified<W: Write + ?Sized>(
    sink: &mut W,
    diff: &Diff,
    original_header: &str,
    modified_header: &str,
    options: &UnifiedOptions,
    original: &[u8],
    modified: &[u8],
) -> Result<(), DiffError> {
    let mut writer = UnifiedWriter::new(sink, original, modified, options)?;
    if !diff.contains_diffs() {
        return Ok(());
    }

    writer.write_file_header(original_header, modified_header)?;
    diff.output(&mut writer)?;
    writer.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MemTokenSource;
    use crate::config::DiffOptions;
    use crate::diff::diff2;

    fn unified_with(original: &str, modified: &str, options: &UnifiedOptions) -> String {
        let mut src = MemTokenSource::two_way(
            original.as_bytes(),
            modified.as_bytes(),
            DiffOptions::default(),
        );
        let diff = diff2(&mut src);
        let mut out = Vec::new();
        output_unified(
            &mut out,
            &diff,
            "orig",
            "mod",
            options,
            original.as_bytes(),
            modified.as_bytes(),
        )
        .unwrap();
        String::from_utf8(out).unwrap()
    }

    fn unified(original: &str, modified: &str, context_size: usize) -> String {
        let options = UnifiedOptions {
            context_size,
            ..UnifiedOptions::default()
        };
        unified_with(original, modified, &options)
    }

    fn numbered(lines: impl IntoIterator<Item = usize>) -> String {
        lines.into_iter().map(|i| format!("l{i}\n")).collect()
    }

    #[test]
    fn test_single_change_without_context() {
        assert_eq!(
            unified("a\nb\nc\n", "a\nx\nc\n", 0),
            "--- orig\n+++ mod\n@@ -2 +2 @@\n-b\n+x\n"
        );
    }

    #[test]
    fn test_single_change_with_default_context() {
        assert_eq!(
            unified("a\nb\nc\n", "a\nx\nc\n", 3),
            "--- orig\n+++ mod\n@@ -1,3 +1,3 @@\n a\n-b\n+x\n c\n"
        );
    }

    #[test]
    fn test_identical_inputs_write_nothing() {
        assert_eq!(unified("a\nb\n", "a\nb\n", 3), "");
        assert_eq!(unified("", "", 3), "");
    }

    #[test]
    fn test_insert_into_empty_file() {
        assert_eq!(
            unified("", "a\nb\n", 3),
            "--- orig\n+++ mod\n@@ -0,0 +1,2 @@\n+a\n+b\n"
        );
    }

    #[test]
    fn test_delete_everything() {
        assert_eq!(
            unified("a\n", "", 3),
            "--- orig\n+++ mod\n@@ -1 +0,0 @@\n-a\n"
        );
    }

    #[test]
    fn test_missing_newline_notice() {
        assert_eq!(
            unified("a\n", "a", 3),
            "--- orig\n+++ mod\n@@ -1 +1 @@\n-a\n+a\n\\ No newline at end of file\n"
        );
        assert_eq!(
            unified("x\nold", "x\nnew", 3),
            "--- orig\n+++ mod\n@@ -1,2 +1,2 @@\n x\n-old\n\\ No newline at end of file\n\
             +new\n\\ No newline at end of file\n"
        );
        assert!(!unified("a\nb\n", "a\nc\n", 3).contains("No newline"));
    }

    #[test]
    fn test_distant_changes_split_into_hunks() {
        let original = numbered(1..=20);
        let modified = original.replace("l2\n", "L2\n").replace("l18\n", "L18\n");
        let out = unified(&original, &modified, 3);

        assert_eq!(out.matches("@@ -").count(), 2);
        assert!(out.contains("@@ -1,5 +1,5 @@\n l1\n-l2\n+L2\n l3\n l4\n l5\n"));
        assert!(out.contains("@@ -15,6 +15,6 @@\n l15\n l16\n l17\n-l18\n+L18\n l19\n l20\n"));
    }

    #[test]
    fn test_nearby_changes_share_a_hunk() {
        let original = numbered(1..=12);
        let modified = original.replace("l2\n", "L2\n").replace("l8\n", "L8\n");
        let out = unified(&original, &modified, 3);

        assert_eq!(
            out,
            "--- orig\n+++ mod\n@@ -1,11 +1,11 @@\n l1\n-l2\n+L2\n l3\n l4\n l5\n l6\n l7\n\
             -l8\n+L8\n l9\n l10\n l11\n"
        );
    }

    #[test]
    fn test_every_gap_up_to_twice_the_context_is_kept() {
        for context_size in 1..=3 {
            for gap in 1..=2 * context_size {
                let original = numbered(1..=gap + 6);
                let second = gap + 3;
                let modified = original
                    .replace("l2\n", "L2\n")
                    .replace(&format!("l{second}\n"), &format!("L{second}\n"));
                let out = unified(&original, &modified, context_size);

                let len = (gap + 3 + context_size).min(gap + 6);
                assert_eq!(
                    out.matches("@@ -").count(),
                    1,
                    "context {context_size}, gap {gap}:\n{out}"
                );
                assert!(
                    out.contains(&format!("@@ -1,{len} +1,{len} @@\n")),
                    "context {context_size}, gap {gap}:\n{out}"
                );
                for line in 3..second {
                    assert!(
                        out.contains(&format!("\n l{line}\n")),
                        "context {context_size}, gap {gap}, missing l{line}:\n{out}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_flush_boundary() {
        let original = numbered(1..=10);

        // Two common lines between changes with context 1: one hunk.
        let modified = original.replace("l2\n", "L2\n").replace("l5\n", "L5\n");
        assert_eq!(
            unified(&original, &modified, 1),
            "--- orig\n+++ mod\n@@ -1,6 +1,6 @@\n l1\n-l2\n+L2\n l3\n l4\n-l5\n+L5\n l6\n"
        );

        // One more common line: two hunks.
        let modified = original.replace("l2\n", "L2\n").replace("l6\n", "L6\n");
        assert_eq!(
            unified(&original, &modified, 1),
            "--- orig\n+++ mod\n@@ -1,3 +1,3 @@\n l1\n-l2\n+L2\n l3\n\
             @@ -5,3 +5,3 @@\n l5\n-l6\n+L6\n l7\n"
        );
    }

    #[test]
    fn test_hunk_start_follows_insertions() {
        let original = numbered(1..=10);
        let modified = format!("new\n{original}");
        let modified = modified.replace("l9\n", "L9\n");
        let out = unified(&original, &modified, 1);

        assert!(out.contains("@@ -1 +1,2 @@\n+new\n l1\n"));
        assert!(out.contains("@@ -8,3 +9,3 @@\n l8\n-l9\n+L9\n l10\n"));
    }

    #[test]
    fn test_header_encoding_failure() {
        let mut src = MemTokenSource::two_way(b"a\n", b"b\n", DiffOptions::default());
        let diff = diff2(&mut src);
        let options = UnifiedOptions {
            header_encoding: OutputEncoding::Ascii,
            ..UnifiedOptions::default()
        };
        let mut out = Vec::new();
        let err = output_unified(&mut out, &diff, "café", "b", &options, b"a\n", b"b\n")
            .unwrap_err();
        assert!(matches!(err, DiffError::Encoding { .. }));
        assert!(out.is_empty());
    }

    #[test]
    fn test_invalid_options_rejected() {
        let options = UnifiedOptions {
            context_size: usize::MAX,
            ..UnifiedOptions::default()
        };
        let mut out = Vec::new();
        let err = output_unified(&mut out, &Diff::default(), "a", "b", &options, b"", b"")
            .unwrap_err();
        assert!(matches!(err, DiffError::Config(_)));
    }

    #[test]
    fn test_index_header_and_labels() {
        let mut out = Vec::new();
        write_index_header(&mut out, OutputEncoding::Utf8, "src/lib.rs").unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Index: src/lib.rs"));
        assert_eq!(lines.next(), Some("=".repeat(67).as_str()));

        assert_eq!(
            diff_label("src/lib.rs", Revision::Number(42)),
            "src/lib.rs\t(revision 42)"
        );
        assert_eq!(
            diff_label("src/lib.rs", Revision::WorkingCopy),
            "src/lib.rs\t(working copy)"
        );
    }
}
