//! Line tokenization of in-memory buffers.
//!
//! A token is a borrowed slice of the source buffer covering one line and
//! its terminator (`\n`, `\r` or `\r\n`). The last token may lack a
//! terminator. Tokens partition the buffer exactly and nothing is copied.

/// A single line token, borrowed from its source buffer.
pub type Token<'a> = &'a [u8];

/// The tokenized form of one source buffer.
#[derive(Debug, Clone)]
pub struct SourceTokens<'a> {
    tokens: Vec<Token<'a>>,
    /// Next token to be consumed by a single-pass reader.
    next_token: usize,
    source: &'a [u8],
    ends_without_eol: bool,
}

impl<'a> SourceTokens<'a> {
    /// Split `source` into line tokens.
    pub fn new(source: &'a [u8]) -> Self {
        let mut tokens = Vec::new();
        let mut start = 0;
        let mut cur = 0;

        while cur < source.len() {
            match source[cur] {
                b'\r' if source.get(cur + 1) == Some(&b'\n') => {
                    tokens.push(&source[start..cur + 2]);
                    cur += 2;
                    start = cur;
                }
                b'\r' | b'\n' => {
                    tokens.push(&source[start..=cur]);
                    cur += 1;
                    start = cur;
                }
                _ => cur += 1,
            }
        }

        // Last line without a terminator.
        let ends_without_eol = start != source.len();
        if ends_without_eol {
            tokens.push(&source[start..]);
        }

        Self {
            tokens,
            next_token: 0,
            source,
            ends_without_eol,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Token<'a>> {
        self.tokens.get(index).copied()
    }

    pub fn tokens(&self) -> &[Token<'a>] {
        &self.tokens
    }

    /// The buffer the tokens borrow from.
    pub fn source(&self) -> &'a [u8] {
        self.source
    }

    /// True if the buffer is non-empty and its last line has no terminator.
    pub fn ends_without_eol(&self) -> bool {
        self.ends_without_eol
    }

    /// Length of the longest token, used to size normalization scratch space.
    pub fn max_token_len(&self) -> usize {
        self.tokens.iter().map(|t| t.len()).max().unwrap_or(0)
    }

    /// Line terminator of the first token, if it has one.
    pub fn first_eol(&self) -> Option<&'a [u8]> {
        self.tokens.first().and_then(|t| line_ending(t))
    }

    /// Index of the next token a single-pass reader has not consumed yet.
    pub fn next_token(&self) -> usize {
        self.next_token
    }

    /// Hand out the next unconsumed token and advance the cursor.
    pub fn advance(&mut self) -> Option<(usize, Token<'a>)> {
        let index = self.next_token;
        let token = self.get(index)?;
        self.next_token += 1;
        Some((index, token))
    }

    /// Move the cursor forward to `index`; the cursor never moves back.
    pub fn seek(&mut self, index: usize) {
        self.next_token = self.next_token.max(index.min(self.tokens.len()));
    }
}

/// Terminator bytes at the end of `token`, if any.
pub fn line_ending(token: &[u8]) -> Option<&[u8]> {
    match token {
        [.., b'\r', b'\n'] => Some(&token[token.len() - 2..]),
        [.., b'\n'] | [.., b'\r'] => Some(&token[token.len() - 1..]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concat(src: &SourceTokens<'_>) -> Vec<u8> {
        src.tokens().concat()
    }

    #[test]
    fn test_empty_buffer_has_no_tokens() {
        let src = SourceTokens::new(b"");
        assert!(src.is_empty());
        assert!(!src.ends_without_eol());
        assert_eq!(src.first_eol(), None);
    }

    #[test]
    fn test_mixed_terminators() {
        let buf = b"one\ntwo\r\nthree\rfour";
        let src = SourceTokens::new(buf);
        assert_eq!(
            src.tokens(),
            &[&b"one\n"[..], b"two\r\n", b"three\r", b"four"]
        );
        assert!(src.ends_without_eol());
        assert_eq!(concat(&src), buf);
    }

    #[test]
    fn test_trailing_terminator() {
        let src = SourceTokens::new(b"a\nb\n");
        assert_eq!(src.len(), 2);
        assert!(!src.ends_without_eol());
    }

    #[test]
    fn test_blank_lines_and_lone_cr() {
        let buf = b"\n\n\r\r\n\rx";
        let src = SourceTokens::new(buf);
        assert_eq!(
            src.tokens(),
            &[&b"\n"[..], b"\n", b"\r", b"\r\n", b"\r", b"x"]
        );
        assert_eq!(concat(&src), buf);
    }

    #[test]
    fn test_tokens_reproduce_buffer() {
        let samples: [&[u8]; 6] = [
            b"",
            b"no newline",
            b"\r\n",
            b"a\r\r\nb\n\nc",
            b"tab\there\n  spaces  \r\n",
            b"\xff\xfe binary \x00\n",
        ];
        for buf in samples {
            let src = SourceTokens::new(buf);
            assert_eq!(concat(&src), buf);
            assert!(src.tokens().iter().all(|t| !t.is_empty()));
        }
    }

    #[test]
    fn test_tokens_borrow_source() {
        let buf = b"x\ny\n".to_vec();
        let src = SourceTokens::new(&buf);
        assert_eq!(src.source().as_ptr(), buf.as_ptr());
        assert_eq!(src.get(1).map(|t| t.as_ptr()), Some(buf[2..].as_ptr()));
    }

    #[test]
    fn test_first_eol_detection() {
        assert_eq!(SourceTokens::new(b"a\r\nb\n").first_eol(), Some(&b"\r\n"[..]));
        assert_eq!(SourceTokens::new(b"a\rb").first_eol(), Some(&b"\r"[..]));
        assert_eq!(SourceTokens::new(b"\n").first_eol(), Some(&b"\n"[..]));
        assert_eq!(SourceTokens::new(b"only").first_eol(), None);
    }

    #[test]
    fn test_cursor_is_monotonic() {
        let mut src = SourceTokens::new(b"a\nb\nc\n");
        assert_eq!(src.advance(), Some((0, &b"a\n"[..])));
        src.seek(2);
        assert_eq!(src.next_token(), 2);
        src.seek(1);
        assert_eq!(src.next_token(), 2);
        src.seek(10);
        assert_eq!(src.next_token(), 3);
        assert_eq!(src.advance(), None);
    }

    #[test]
    fn test_max_token_len() {
        assert_eq!(SourceTokens::new(b"ab\nabcd\r\nx").max_token_len(), 6);
        assert_eq!(SourceTokens::new(b"").max_token_len(), 0);
    }
}
