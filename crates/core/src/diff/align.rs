//! Two-, three- and four-way alignment over a [`TokenSource`].
//!
//! The three-way algorithm finds *sync regions*, stretches where original,
//! modified and latest all match, by intersecting the original-vs-modified
//! and original-vs-latest matching blocks. The gaps between sync regions are
//! classified by which side departs from the original.

use std::cmp::Ordering;

use tracing::debug;

use super::lcs::{matching_blocks, MatchBlock};
use super::{Diff, DiffRange, RangeKind, Span};
use crate::adapter::{Datasource, TokenHandle, TokenSource};

/// Hashes and handles of one fully read source.
#[derive(Debug, Default)]
struct Positions {
    hashes: Vec<u32>,
    handles: Vec<TokenHandle>,
}

impl Positions {
    fn len(&self) -> usize {
        self.handles.len()
    }
}

fn read_source<S: TokenSource + ?Sized>(src: &mut S, source: Datasource) -> Positions {
    src.open(source);
    let mut positions = Positions::default();
    while let Some((hash, handle)) = src.next_token(source) {
        positions.hashes.push(hash);
        positions.handles.push(handle);
    }
    positions
}

fn close_all<S: TokenSource + ?Sized>(src: &mut S, sources: &[Datasource]) {
    for &source in sources {
        src.close(source);
    }
    src.discard_all();
}

fn lcs<S: TokenSource + ?Sized>(src: &mut S, a: &Positions, b: &Positions) -> Vec<MatchBlock> {
    matching_blocks(&a.hashes, &b.hashes, |i, j| {
        src.compare(a.handles[i], b.handles[j]) == Ordering::Equal
    })
}

/// Token-wise equality of `a[sa]` and `b[sb]`.
fn spans_equal<S: TokenSource + ?Sized>(
    src: &mut S,
    a: &Positions,
    sa: Span,
    b: &Positions,
    sb: Span,
) -> bool {
    sa.len == sb.len
        && (0..sa.len).all(|i| {
            let (x, y) = (sa.start + i, sb.start + i);
            a.hashes[x] == b.hashes[y]
                && src.compare(a.handles[x], b.handles[y]) == Ordering::Equal
        })
}

// ---------------------------------------------------------------------------
// Two-way
// ---------------------------------------------------------------------------

/// Align original against modified.
pub fn diff2<S: TokenSource + ?Sized>(src: &mut S) -> Diff {
    let original = read_source(src, Datasource::Original);
    let modified = read_source(src, Datasource::Modified);

    let blocks = lcs(src, &original, &modified);
    let ranges = two_way_ranges(&blocks, original.len(), modified.len());
    close_all(src, &[Datasource::Original, Datasource::Modified]);

    debug!(
        original = original.len(),
        modified = modified.len(),
        ranges = ranges.len(),
        "two-way alignment complete"
    );
    Diff::from_ranges(ranges)
}

fn two_way_ranges(blocks: &[MatchBlock], a_len: usize, b_len: usize) -> Vec<DiffRange> {
    let mut ranges = Vec::with_capacity(blocks.len() * 2 + 1);
    let (mut i, mut j) = (0, 0);

    let sentinel = MatchBlock {
        a_start: a_len,
        b_start: b_len,
        len: 0,
    };
    for block in blocks.iter().chain(std::iter::once(&sentinel)) {
        if block.a_start > i || block.b_start > j {
            ranges.push(DiffRange::new(
                RangeKind::DiffModified,
                Span::between(i, block.a_start),
                Span::between(j, block.b_start),
                Span::default(),
            ));
        }
        if block.len > 0 {
            ranges.push(DiffRange::new(
                RangeKind::Common,
                Span::new(block.a_start, block.len),
                Span::new(block.b_start, block.len),
                Span::default(),
            ));
        }
        (i, j) = (block.a_end(), block.b_end());
    }

    ranges
}

// ---------------------------------------------------------------------------
// Three-way
// ---------------------------------------------------------------------------

/// A stretch where all three sources match, as `(original, modified, latest)`
/// start positions plus a shared length.
#[derive(Debug, Clone, Copy)]
struct SyncRegion {
    original: usize,
    modified: usize,
    latest: usize,
    len: usize,
}

fn sync_regions(
    om: &[MatchBlock],
    ol: &[MatchBlock],
    lens: (usize, usize, usize),
) -> Vec<SyncRegion> {
    let mut regions = Vec::new();
    let (mut ia, mut ib) = (0, 0);

    while ia < om.len() && ib < ol.len() {
        let (a, b) = (om[ia], ol[ib]);
        let start = a.a_start.max(b.a_start);
        let end = a.a_end().min(b.a_end());
        if start < end {
            regions.push(SyncRegion {
                original: start,
                modified: a.b_start + (start - a.a_start),
                latest: b.b_start + (start - b.a_start),
                len: end - start,
            });
        }
        if a.a_end() < b.a_end() {
            ia += 1;
        } else {
            ib += 1;
        }
    }

    regions.push(SyncRegion {
        original: lens.0,
        modified: lens.1,
        latest: lens.2,
        len: 0,
    });
    regions
}

struct ThreeWay<'p> {
    original: &'p Positions,
    modified: &'p Positions,
    latest: &'p Positions,
}

impl ThreeWay<'_> {
    fn ranges<S: TokenSource + ?Sized>(&self, src: &mut S) -> Vec<DiffRange> {
        let om = lcs(src, self.original, self.modified);
        let ol = lcs(src, self.original, self.latest);
        let lens = (self.original.len(), self.modified.len(), self.latest.len());

        let mut ranges = Vec::new();
        let (mut io, mut im, mut il) = (0, 0, 0);

        for sync in sync_regions(&om, &ol, lens) {
            let o = Span::between(io, sync.original);
            let m = Span::between(im, sync.modified);
            let l = Span::between(il, sync.latest);

            if !(o.is_empty() && m.is_empty() && l.is_empty()) {
                ranges.push(self.classify(src, o, m, l));
            }

            if sync.len > 0 {
                ranges.push(DiffRange::new(
                    RangeKind::Common,
                    Span::new(sync.original, sync.len),
                    Span::new(sync.modified, sync.len),
                    Span::new(sync.latest, sync.len),
                ));
            }
            io = sync.original + sync.len;
            im = sync.modified + sync.len;
            il = sync.latest + sync.len;
        }

        ranges
    }

    fn classify<S: TokenSource + ?Sized>(&self, src: &mut S, o: Span, m: Span, l: Span) -> DiffRange {
        let modified_kept = spans_equal(src, self.modified, m, self.original, o);
        let latest_kept = spans_equal(src, self.latest, l, self.original, o);

        let kind = if modified_kept && latest_kept {
            RangeKind::Common
        } else if modified_kept {
            RangeKind::DiffLatest
        } else if latest_kept {
            RangeKind::DiffModified
        } else if spans_equal(src, self.modified, m, self.latest, l) {
            RangeKind::DiffCommon
        } else {
            RangeKind::Conflict
        };

        let mut range = DiffRange::new(kind, o, m, l);
        if kind == RangeKind::Conflict {
            range.resolved = self.resolve_conflict(src, &range);
        }
        range
    }

    /// Sub-diff of the conflicting modified and latest tokens. Matching
    /// stretches become [`RangeKind::DiffCommon`], the rest stay conflicts.
    /// Returns `None` when nothing matches, as there is nothing to narrow.
    fn resolve_conflict<S: TokenSource + ?Sized>(
        &self,
        src: &mut S,
        conflict: &DiffRange,
    ) -> Option<Diff> {
        let (m, l) = (conflict.modified, conflict.latest);
        let sub = |p: &Positions, s: Span| Positions {
            hashes: p.hashes[s.start..s.end()].to_vec(),
            handles: p.handles[s.start..s.end()].to_vec(),
        };
        let blocks = lcs(src, &sub(self.modified, m), &sub(self.latest, l));
        if blocks.is_empty() {
            return None;
        }

        let anchor = Span::new(conflict.original.start, 0);
        let nested = two_way_ranges(&blocks, m.len, l.len)
            .into_iter()
            .map(|r| {
                let kind = match r.kind {
                    RangeKind::Common => RangeKind::DiffCommon,
                    _ => RangeKind::Conflict,
                };
                DiffRange::new(
                    kind,
                    anchor,
                    Span::new(m.start + r.original.start, r.original.len),
                    Span::new(l.start + r.modified.start, r.modified.len),
                )
            })
            .collect();

        Some(Diff::from_ranges(nested))
    }
}

/// Align original, modified and latest.
pub fn diff3<S: TokenSource + ?Sized>(src: &mut S) -> Diff {
    let original = read_source(src, Datasource::Original);
    let modified = read_source(src, Datasource::Modified);
    let latest = read_source(src, Datasource::Latest);

    let ranges = ThreeWay {
        original: &original,
        modified: &modified,
        latest: &latest,
    }
    .ranges(src);
    close_all(
        src,
        &[Datasource::Original, Datasource::Modified, Datasource::Latest],
    );

    let diff = Diff::from_ranges(ranges);
    debug!(
        original = original.len(),
        modified = modified.len(),
        latest = latest.len(),
        ranges = diff.ranges().len(),
        conflicts = diff.conflict_count(),
        "three-way alignment complete"
    );
    diff
}

// ---------------------------------------------------------------------------
// Four-way
// ---------------------------------------------------------------------------

/// Position in `b` of the first token at or after `a`-position `i`.
fn map_start(blocks: &[MatchBlock], i: usize) -> usize {
    let mut mapped = 0;
    for block in blocks {
        if block.a_start > i {
            break;
        }
        mapped = if i < block.a_end() {
            block.b_start + (i - block.a_start)
        } else {
            block.b_end()
        };
    }
    mapped
}

/// Position in `b` just past the last token before `a`-position `end`.
fn map_end(blocks: &[MatchBlock], end: usize, b_len: usize) -> usize {
    for block in blocks {
        if block.a_end() >= end {
            return if block.a_start < end {
                block.b_start + (end - block.a_start)
            } else {
                block.b_start
            };
        }
    }
    b_len
}

/// Align original, modified and latest, using `ancestor` (the common
/// ancestor of original and modified) to settle conflicts: where modified
/// still carries the ancestor's text, only latest counts as a change.
pub fn diff4<S: TokenSource + ?Sized>(src: &mut S) -> Diff {
    let original = read_source(src, Datasource::Original);
    let modified = read_source(src, Datasource::Modified);
    let latest = read_source(src, Datasource::Latest);
    let ancestor = read_source(src, Datasource::Ancestor);

    let mut ranges = ThreeWay {
        original: &original,
        modified: &modified,
        latest: &latest,
    }
    .ranges(src);

    let oa = lcs(src, &original, &ancestor);
    let mut adjusted = 0;
    for range in ranges.iter_mut().filter(|r| r.kind == RangeKind::Conflict) {
        let start = map_start(&oa, range.original.start);
        let end = map_end(&oa, range.original.end(), ancestor.len()).max(start);
        let inherited = spans_equal(
            src,
            &modified,
            range.modified,
            &ancestor,
            Span::between(start, end),
        );
        if inherited {
            range.kind = RangeKind::DiffLatest;
            range.resolved = None;
            adjusted += 1;
        }
    }
    close_all(src, &Datasource::ALL);

    debug!(
        original = original.len(),
        modified = modified.len(),
        latest = latest.len(),
        ancestor = ancestor.len(),
        ranges = ranges.len(),
        adjusted,
        "four-way alignment complete"
    );
    Diff::from_ranges(ranges)
}
