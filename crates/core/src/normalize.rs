//! Comparison keys for tokens.
//!
//! Normalization never touches the source buffer: the canonical form is
//! written into caller-provided scratch space, or the token itself is
//! returned when no option applies.

use crate::config::{DiffOptions, IgnoreSpace};
use crate::source::line_ending;

/// Position of the normalizer inside a token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NormalizeState {
    /// Copying ordinary bytes.
    #[default]
    Normal,
    /// Inside a run of whitespace that has already been folded.
    Whitespace,
}

fn is_horizontal_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\x0b' | b'\x0c')
}

/// Canonicalize `token` according to `options`.
///
/// `at_eof` marks the last token of its source; with `ignore_eol_at_eof`
/// its terminator is dropped so a final line with and without a newline
/// compare equal. `state` is left where the token ended; callers seed it with
/// [`NormalizeState::Normal`] for every token because whitespace runs never
/// cross a line boundary.
pub fn normalize_token<'t>(
    token: &'t [u8],
    options: &DiffOptions,
    at_eof: bool,
    state: &mut NormalizeState,
    scratch: &'t mut Vec<u8>,
) -> &'t [u8] {
    if options.is_verbatim() {
        return token;
    }

    let eol = line_ending(token);
    let body = &token[..token.len() - eol.map_or(0, <[u8]>::len)];

    scratch.clear();
    for &b in body {
        if !is_horizontal_space(b) {
            scratch.push(b);
            *state = NormalizeState::Normal;
            continue;
        }

        match options.ignore_space {
            IgnoreSpace::None => scratch.push(b),
            IgnoreSpace::Change => {
                if *state == NormalizeState::Normal {
                    scratch.push(b' ');
                    *state = NormalizeState::Whitespace;
                }
            }
            IgnoreSpace::All => *state = NormalizeState::Whitespace,
        }
    }

    if let Some(eol) = eol {
        let drop_eol = options.ignore_eol_style || (options.ignore_eol_at_eof && at_eof);
        if !drop_eol {
            scratch.extend_from_slice(eol);
        }
        *state = NormalizeState::Normal;
    }

    scratch.as_slice()
}

const ADLER_MOD_BASE: u32 = 65521;

/// Largest number of bytes whose sums cannot overflow before reduction.
const ADLER_MOD_BLOCK_SIZE: usize = 5552;

/// Adler-32 style checksum continuing from `checksum`.
///
/// Used as a cheap pre-filter: unequal checksums prove unequal tokens.
pub fn adler32(checksum: u32, data: &[u8]) -> u32 {
    let mut s1 = checksum & 0xFFFF;
    let mut s2 = checksum >> 16;

    for block in data.chunks(ADLER_MOD_BLOCK_SIZE) {
        for &b in block {
            s1 += u32::from(b);
            s2 += s1;
        }
        s1 %= ADLER_MOD_BASE;
        s2 %= ADLER_MOD_BASE;
    }

    (s2 << 16) | s1
}
