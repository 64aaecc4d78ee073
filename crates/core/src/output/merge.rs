//! Merged-text rendering with conflict markers.
//!
//! Everything that is not a conflict is taken from the modified source,
//! except ranges only the latest source changed. Conflicts are framed by
//! the four markers; with conflict resolution enabled, the narrowed sub-diff
//! of a conflict is rendered in its place instead.

use std::io::Write;

use tracing::trace;

use super::DEFAULT_EOL;
use crate::config::MergeOptions;
use crate::diff::{Diff, DiffOutput, DiffRange, Span};
use crate::errors::DiffError;
use crate::source::SourceTokens;

const ORIGINAL: usize = 0;
const MODIFIED: usize = 1;
const LATEST: usize = 2;

/// A single conflict region within merged output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictRegion {
    /// Line number (1-indexed) of the opening marker.
    pub start_line: usize,
    /// Line number (1-indexed) of the closing marker.
    pub end_line: usize,
}

/// What a merge pass wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Conflict regions in output order.
    pub conflicts: Vec<ConflictRegion>,
    /// Lines written, markers included.
    pub lines_written: usize,
}

impl MergeSummary {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
enum Marker {
    Modified,
    Original,
    Separator,
    Latest,
}

/// Single-pass merge emitter.
pub struct MergeWriter<'a, 's, W: Write + ?Sized> {
    sink: &'s mut W,
    sources: [SourceTokens<'a>; 3],
    /// Encoded markers with their line terminator, indexed like [`Marker`].
    markers: [Vec<u8>; 4],
    show_original: bool,
    resolve_conflicts: bool,
    /// Set while rendering a resolved sub-diff.
    in_resolved: bool,
    summary: MergeSummary,
}

impl<'a, 's, W: Write + ?Sized> MergeWriter<'a, 's, W> {
    pub fn new(
        sink: &'s mut W,
        original: &'a [u8],
        modified: &'a [u8],
        latest: &'a [u8],
        options: &MergeOptions,
    ) -> Result<Self, DiffError> {
        options.validate()?;

        let sources = [
            SourceTokens::new(original),
            SourceTokens::new(modified),
            SourceTokens::new(latest),
        ];

        let eol = match sources[MODIFIED].first_eol() {
            Some(eol) => eol.to_vec(),
            None => options.marker_encoding.encode(DEFAULT_EOL)?.into_owned(),
        };
        let encode_marker = |text: &str| -> Result<Vec<u8>, DiffError> {
            let mut marker = options.marker_encoding.encode(text)?.into_owned();
            marker.extend_from_slice(&eol);
            Ok(marker)
        };
        let markers = [
            encode_marker(options.markers.modified())?,
            encode_marker(options.markers.original())?,
            encode_marker(options.markers.separator())?,
            encode_marker(options.markers.latest())?,
        ];

        Ok(Self {
            sink,
            sources,
            markers,
            show_original: options.show_original_in_conflict,
            resolve_conflicts: options.resolve_conflicts,
            in_resolved: false,
            summary: MergeSummary::default(),
        })
    }

    pub fn finish(self) -> MergeSummary {
        self.summary
    }

    fn tokens(&mut self, side: usize, span: Span) -> Result<(), DiffError> {
        let tokens = &self.sources[side].tokens()[span.start..span.end()];
        for token in tokens {
            self.sink.write_all(token)?;
        }
        self.summary.lines_written += tokens.len();
        Ok(())
    }

    fn marker(&mut self, marker: Marker) -> Result<(), DiffError> {
        self.sink.write_all(&self.markers[marker as usize])?;
        self.summary.lines_written += 1;
        Ok(())
    }
}

impl<W: Write + ?Sized> DiffOutput for MergeWriter<'_, '_, W> {
    fn output_common(&mut self, range: &DiffRange) -> Result<(), DiffError> {
        self.tokens(MODIFIED, range.modified)
    }

    fn output_diff_modified(&mut self, range: &DiffRange) -> Result<(), DiffError> {
        self.tokens(MODIFIED, range.modified)
    }

    fn output_diff_latest(&mut self, range: &DiffRange) -> Result<(), DiffError> {
        self.tokens(LATEST, range.latest)
    }

    fn output_diff_common(&mut self, range: &DiffRange) -> Result<(), DiffError> {
        self.tokens(MODIFIED, range.modified)
    }

    fn output_conflict(
        &mut self,
        range: &DiffRange,
        resolved: Option<&Diff>,
    ) -> Result<(), DiffError> {
        if let (true, false, Some(sub)) = (self.resolve_conflicts, self.in_resolved, resolved) {
            self.in_resolved = true;
            let result = sub.output(&mut *self);
            self.in_resolved = false;
            return result;
        }

        let start_line = self.summary.lines_written + 1;

        self.marker(Marker::Modified)?;
        self.tokens(MODIFIED, range.modified)?;

        if self.show_original && !self.in_resolved {
            self.marker(Marker::Original)?;
            self.tokens(ORIGINAL, range.original)?;
        }

        self.marker(Marker::Separator)?;
        self.tokens(LATEST, range.latest)?;
        self.marker(Marker::Latest)?;

        let region = ConflictRegion {
            start_line,
            end_line: self.summary.lines_written,
        };
        trace!(
            start_line = region.start_line,
            end_line = region.end_line,
            nested = self.in_resolved,
            "rendered conflict"
        );
        self.summary.conflicts.push(region);
        Ok(())
    }
}

/// Render the three-way `diff` as merged text.
pub fn output_merge<W: Write + ?Sized>(
    sink: &mut W,
    diff: &Diff,
    original: &[u8],
    modified: &[u8],
    latest: &[u8],
    options: &MergeOptions,
) -> Result<MergeSummary, DiffError> {
    let mut writer = MergeWriter::new(sink, original, modified, latest, options)?;
    diff.output(&mut writer)?;
    Ok(writer.finish())
}
