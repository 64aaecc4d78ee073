//! Alignment results and the callbacks that consume them.
//!
//! A [`Diff`] is an ordered list of [`DiffRange`]s covering every source
//! exactly once. Output writers implement [`DiffOutput`] and are driven by
//! [`Diff::output`], one callback per range.

pub mod align;
pub mod lcs;

pub use align::{diff2, diff3, diff4};

use crate::errors::DiffError;

/// Half-open token interval `[start, start + len)` in one source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub len: usize,
}

impl Span {
    pub fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// Span from `start` up to (not including) `end`.
    pub fn between(start: usize, end: usize) -> Self {
        Self {
            start,
            len: end.saturating_sub(start),
        }
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// What happened in a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeKind {
    /// All sources agree.
    Common,
    /// Only the modified source differs from the original.
    DiffModified,
    /// Only the latest source differs from the original.
    DiffLatest,
    /// Modified and latest made the same change.
    DiffCommon,
    /// Modified and latest changed the original differently.
    Conflict,
}

/// One tagged interval of the alignment.
///
/// In a two-way diff the `latest` span is always empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRange {
    pub kind: RangeKind,
    pub original: Span,
    pub modified: Span,
    pub latest: Span,
    /// For conflicts: the modified-vs-latest sub-diff. Its own conflicts
    /// never carry a further resolution.
    pub resolved: Option<Diff>,
}

impl DiffRange {
    pub fn new(kind: RangeKind, original: Span, modified: Span, latest: Span) -> Self {
        Self {
            kind,
            original,
            modified,
            latest,
            resolved: None,
        }
    }
}

/// The full alignment of 2, 3 or 4 sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    ranges: Vec<DiffRange>,
}

impl Diff {
    pub fn from_ranges(ranges: Vec<DiffRange>) -> Self {
        Self { ranges }
    }

    pub fn ranges(&self) -> &[DiffRange] {
        &self.ranges
    }

    pub fn into_ranges(self) -> Vec<DiffRange> {
        self.ranges
    }

    /// True if any range is something other than [`RangeKind::Common`].
    pub fn contains_diffs(&self) -> bool {
        self.ranges.iter().any(|r| r.kind != RangeKind::Common)
    }

    pub fn contains_conflicts(&self) -> bool {
        self.ranges.iter().any(|r| r.kind == RangeKind::Conflict)
    }

    pub fn conflict_count(&self) -> usize {
        self.ranges
            .iter()
            .filter(|r| r.kind == RangeKind::Conflict)
            .count()
    }

    /// Drive `out` with one callback per range, in order. The first error
    /// aborts the pass.
    pub fn output<O: DiffOutput + ?Sized>(&self, out: &mut O) -> Result<(), DiffError> {
        for range in &self.ranges {
            match range.kind {
                RangeKind::Common => out.output_common(range)?,
                RangeKind::DiffModified => out.output_diff_modified(range)?,
                RangeKind::DiffLatest => out.output_diff_latest(range)?,
                RangeKind::DiffCommon => out.output_diff_common(range)?,
                RangeKind::Conflict => out.output_conflict(range, range.resolved.as_ref())?,
            }
        }
        Ok(())
    }
}

/// Consumer of a [`Diff`]. Every callback defaults to doing nothing.
pub trait DiffOutput {
    fn output_common(&mut self, _range: &DiffRange) -> Result<(), DiffError> {
        Ok(())
    }

    fn output_diff_modified(&mut self, _range: &DiffRange) -> Result<(), DiffError> {
        Ok(())
    }

    fn output_diff_latest(&mut self, _range: &DiffRange) -> Result<(), DiffError> {
        Ok(())
    }

    fn output_diff_common(&mut self, _range: &DiffRange) -> Result<(), DiffError> {
        Ok(())
    }

    fn output_conflict(
        &mut self,
        _range: &DiffRange,
        _resolved: Option<&Diff>,
    ) -> Result<(), DiffError> {
        Ok(())
    }
}
