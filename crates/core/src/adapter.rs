//! Token sources for the alignment primitive.
//!
//! The aligner never looks at buffers directly. It pulls `(hash, handle)`
//! pairs from a [`TokenSource`] one source at a time and asks the source to
//! order two handles. [`MemTokenSource`] serves two, three or four in-memory
//! buffers through that one interface.

use std::cmp::Ordering;

use crate::config::DiffOptions;
use crate::normalize::{adler32, normalize_token, NormalizeState};
use crate::source::SourceTokens;

/// Role of a source in a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Datasource {
    Original,
    Modified,
    Latest,
    Ancestor,
}

impl Datasource {
    pub const ALL: [Datasource; 4] = [
        Datasource::Original,
        Datasource::Modified,
        Datasource::Latest,
        Datasource::Ancestor,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::Original => 0,
            Self::Modified => 1,
            Self::Latest => 2,
            Self::Ancestor => 3,
        }
    }
}

impl std::fmt::Display for Datasource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Original => write!(f, "original"),
            Self::Modified => write!(f, "modified"),
            Self::Latest => write!(f, "latest"),
            Self::Ancestor => write!(f, "ancestor"),
        }
    }
}

/// Opaque reference to one token of one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenHandle {
    pub source: Datasource,
    pub index: usize,
}

/// The contract between token producers and the aligner.
pub trait TokenSource {
    /// Prepare `source` for reading.
    fn open(&mut self, source: Datasource);

    /// Done reading `source`. Its tokens must stay comparable until every
    /// source is closed.
    fn close(&mut self, source: Datasource);

    /// Next token of `source` with its comparison hash, or `None` when the
    /// source is exhausted.
    fn next_token(&mut self, source: Datasource) -> Option<(u32, TokenHandle)>;

    /// Order two tokens by their normalized bytes.
    fn compare(&mut self, a: TokenHandle, b: TokenHandle) -> Ordering;

    /// The aligner no longer needs `handle`.
    fn discard(&mut self, _handle: TokenHandle) {}

    /// The aligner no longer needs any handle.
    fn discard_all(&mut self) {}
}

/// [`TokenSource`] over two, three or four fully materialized buffers.
///
/// Owns the per-call scratch space; dropping it releases everything the
/// comparison allocated.
#[derive(Debug)]
pub struct MemTokenSource<'a> {
    sources: Vec<SourceTokens<'a>>,
    /// We only ever compare two tokens at the same time.
    scratch: [Vec<u8>; 2],
    options: DiffOptions,
}

impl<'a> MemTokenSource<'a> {
    /// Original and modified, for a two-way diff.
    pub fn two_way(original: &'a [u8], modified: &'a [u8], options: DiffOptions) -> Self {
        Self::from_buffers(&[original, modified], options)
    }

    /// Original, modified and latest, for a three-way merge.
    pub fn three_way(
        original: &'a [u8],
        modified: &'a [u8],
        latest: &'a [u8],
        options: DiffOptions,
    ) -> Self {
        Self::from_buffers(&[original, modified, latest], options)
    }

    /// Three-way sources plus the common ancestor of original and modified.
    pub fn four_way(
        original: &'a [u8],
        modified: &'a [u8],
        latest: &'a [u8],
        ancestor: &'a [u8],
        options: DiffOptions,
    ) -> Self {
        Self::from_buffers(&[original, modified, latest, ancestor], options)
    }

    fn from_buffers(buffers: &[&'a [u8]], options: DiffOptions) -> Self {
        let sources: Vec<SourceTokens<'a>> =
            buffers.iter().map(|buf| SourceTokens::new(buf)).collect();
        let max_len = sources.iter().map(SourceTokens::max_token_len).max().unwrap_or(0);

        Self {
            sources,
            scratch: [Vec::with_capacity(max_len), Vec::with_capacity(max_len)],
            options,
        }
    }

    /// Number of active sources.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Tokens of `source`, or `None` if it takes no part in this comparison.
    pub fn tokens(&self, source: Datasource) -> Option<&SourceTokens<'a>> {
        self.sources.get(source.index())
    }

    /// Token count of `source`, zero for inactive sources.
    pub fn len(&self, source: Datasource) -> usize {
        self.sources.get(source.index()).map_or(0, SourceTokens::len)
    }

    pub fn options(&self) -> &DiffOptions {
        &self.options
    }

    fn is_last(&self, handle: TokenHandle) -> bool {
        handle.index + 1 == self.len(handle.source)
    }
}

impl TokenSource for MemTokenSource<'_> {
    fn open(&mut self, _source: Datasource) {
        // Everything was tokenized up front.
    }

    fn close(&mut self, _source: Datasource) {
        // compare() still needs earlier sources until all are processed.
    }

    fn next_token(&mut self, source: Datasource) -> Option<(u32, TokenHandle)> {
        let at_eof = self.sources.get(source.index())?.next_token() + 1
            == self.len(source);
        let (index, token) = self.sources.get_mut(source.index())?.advance()?;

        let mut state = NormalizeState::Normal;
        let key = normalize_token(token, &self.options, at_eof, &mut state, &mut self.scratch[0]);
        let hash = adler32(0, key);

        Some((hash, TokenHandle { source, index }))
    }

    fn compare(&mut self, a: TokenHandle, b: TokenHandle) -> Ordering {
        let (a_eof, b_eof) = (self.is_last(a), self.is_last(b));
        let (Some(ta), Some(tb)) = (
            self.tokens(a.source).and_then(|src| src.get(a.index)),
            self.tokens(b.source).and_then(|src| src.get(b.index)),
        ) else {
            return a.index.cmp(&b.index);
        };

        let [buf_a, buf_b] = &mut self.scratch;
        let mut state = NormalizeState::Normal;
        let key_a = normalize_token(ta, &self.options, a_eof, &mut state, buf_a);
        state = NormalizeState::Normal;
        let key_b = normalize_token(tb, &self.options, b_eof, &mut state, buf_b);

        key_a.len().cmp(&key_b.len()).then_with(|| key_a.cmp(key_b))
    }
}
