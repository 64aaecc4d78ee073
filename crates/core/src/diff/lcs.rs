//! Longest common subsequence via Myers' O(ND) algorithm.
//!
//! Works on hash arrays plus an equality callback, so the same code serves
//! every [`TokenSource`](crate::adapter::TokenSource): hashes reject most
//! pairs cheaply and the callback settles the rest.

/// A run of `len` matching tokens starting at `a_start` / `b_start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchBlock {
    pub a_start: usize,
    pub b_start: usize,
    pub len: usize,
}

impl MatchBlock {
    pub fn a_end(&self) -> usize {
        self.a_start + self.len
    }

    pub fn b_end(&self) -> usize {
        self.b_start + self.len
    }
}

/// Maximal matching blocks between `a` and `b`, in increasing order.
///
/// `eq(i, j)` is only consulted when `a[i] == b[j]`.
pub fn matching_blocks<F>(a: &[u32], b: &[u32], mut eq: F) -> Vec<MatchBlock>
where
    F: FnMut(usize, usize) -> bool,
{
    let mut same = |i: usize, j: usize| a[i] == b[j] && eq(i, j);

    let prefix = (0..a.len().min(b.len()))
        .take_while(|&i| same(i, i))
        .count();
    let suffix = (0..(a.len() - prefix).min(b.len() - prefix))
        .take_while(|&i| same(a.len() - 1 - i, b.len() - 1 - i))
        .count();

    let n = a.len() - prefix - suffix;
    let m = b.len() - prefix - suffix;

    let mut pairs = Vec::new();
    if n > 0 && m > 0 {
        let trace = shortest_edit(n, m, |x, y| same(prefix + x, prefix + y));
        pairs = backtrack(&trace, n, m);
    }

    let mut blocks: Vec<MatchBlock> = Vec::new();
    let mut push = |a_start: usize, b_start: usize, len: usize| {
        if len == 0 {
            return;
        }
        match blocks.last_mut() {
            Some(last) if last.a_end() == a_start && last.b_end() == b_start => last.len += len,
            _ => blocks.push(MatchBlock { a_start, b_start, len }),
        }
    };

    push(0, 0, prefix);
    for (x, y) in pairs {
        push(prefix + x, prefix + y, 1);
    }
    push(a.len() - suffix, b.len() - suffix, suffix);

    blocks
}

/// Forward pass. `trace[d]` holds the furthest x reached on diagonals
/// `-(d+1)..=d+1` before step `d`, indexed by `k + d + 1`.
fn shortest_edit<F>(n: usize, m: usize, mut same: F) -> Vec<Vec<usize>>
where
    F: FnMut(usize, usize) -> bool,
{
    let max = n + m;
    let offset = max as isize + 1;
    let mut v = vec![0usize; 2 * max + 3];
    let mut trace = Vec::new();

    for d in 0..=max as isize {
        let lo = (offset - d - 1) as usize;
        let hi = (offset + d + 1) as usize;
        trace.push(v[lo..=hi].to_vec());

        for k in (-d..=d).step_by(2) {
            let idx = (offset + k) as usize;
            let mut x = if k == -d || (k != d && v[idx - 1] < v[idx + 1]) {
                // came down from k+1: insertion
                v[idx + 1]
            } else {
                // came right from k-1: deletion
                v[idx - 1] + 1
            };
            let mut y = (x as isize - k) as usize;

            while x < n && y < m && same(x, y) {
                x += 1;
                y += 1;
            }

            v[idx] = x;

            if x >= n && y >= m {
                return trace;
            }
        }
    }

    trace
}

/// Walk the trace back from `(n, m)` and collect matched pairs in order.
fn backtrack(trace: &[Vec<usize>], n: usize, m: usize) -> Vec<(usize, usize)> {
    let (mut x, mut y) = (n as isize, m as isize);
    let mut pairs = Vec::new();

    for (d, v) in trace.iter().enumerate().rev() {
        let d = d as isize;
        let at = |k: isize| v[(k + d + 1) as usize] as isize;
        let k = x - y;

        let prev_k = if k == -d || (k != d && at(k - 1) < at(k + 1)) {
            k + 1
        } else {
            k - 1
        };
        let prev_x = at(prev_k);
        let prev_y = prev_x - prev_k;

        while x > prev_x && y > prev_y {
            pairs.push(((x - 1) as usize, (y - 1) as usize));
            x -= 1;
            y -= 1;
        }

        if d > 0 {
            (x, y) = (prev_x, prev_y);
        }
    }

    pairs.reverse();
    pairs
}
