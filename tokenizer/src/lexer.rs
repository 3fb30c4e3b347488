/// Streaming lexer for Jack source text.
///
/// The [`Lexer`] consumes bytes from any [`std::io::Read`] source and
/// implements [`Iterator`] over [`Token`]s. It is single-pass and cannot be
/// rewound; callers that need look-ahead wrap it in
/// [`std::iter::Peekable`].
///
/// # Trivia
///
/// | Syntax      | Notes                          |
/// |-------------|--------------------------------|
/// | `// …`      | Runs to end of line            |
/// | `/* … */`   | Does not nest                  |
/// | `/** … */`  | Documentation, same as `/* */` |
///
/// Whitespace and comments never reach the token stream.
///
/// # Classification
///
/// Words are scanned with maximal munch and then checked against the
/// reserved-word table, so `classy` is an identifier while `class` is a
/// keyword. After words come symbols, decimal integers and `"…"` strings.
/// Anything else produces a [`TokenKind::Error`] token.
use std::io::Read;

use crate::span::{Pos, Span};
use crate::token::{Keyword, Token, TokenKind, is_symbol};

// ═══════════════════════════════════════════════════════════════════
// Read buffer
// ═══════════════════════════════════════════════════════════════════

/// Bytes of look-ahead kept in front of the reader. Four is enough to
/// decode one UTF-8 character when reporting an unexpected one.
const LOOKAHEAD: usize = 4;

struct ReadBuf<R: Read> {
    reader: R,
    buf: [u8; LOOKAHEAD],
    /// How many valid bytes are in `buf` starting from index 0.
    filled: usize,
    reader_eof: bool,
    offset: usize,
    line: usize,
    column: usize,
}

impl<R: Read> ReadBuf<R> {
    fn new(reader: R) -> Self {
        let mut rb = Self {
            reader,
            buf: [0u8; LOOKAHEAD],
            filled: 0,
            reader_eof: false,
            offset: 0,
            line: 1,
            column: 1,
        };
        rb.fill();
        rb
    }

    fn fill(&mut self) {
        while !self.reader_eof && self.filled < LOOKAHEAD {
            let mut one = [0u8; 1];
            match self.reader.read(&mut one) {
                Ok(0) | Err(_) => self.reader_eof = true,
                Ok(_) => {
                    self.buf[self.filled] = one[0];
                    self.filled += 1;
                }
            }
        }
    }

    fn pos(&self) -> Pos {
        Pos::new(self.offset, self.line, self.column)
    }

    fn peek(&self) -> Option<u8> {
        (self.filled > 0).then(|| self.buf[0])
    }

    fn peek_ahead(&self, n: usize) -> Option<u8> {
        (n < self.filled).then(|| self.buf[n])
    }

    fn advance(&mut self) -> Option<u8> {
        if self.filled == 0 {
            return None;
        }
        let b = self.buf[0];
        self.buf.copy_within(1..self.filled, 0);
        self.filled -= 1;
        self.fill();

        self.offset += 1;
        if b == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(b)
    }

    /// Consume one UTF-8 character. Invalid sequences yield U+FFFD and
    /// consume a single byte.
    fn advance_char(&mut self) -> Option<char> {
        let b0 = self.peek()?;
        let len = match b0 {
            0x00..=0x7F => 1,
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 0,
        };
        if len == 0 || len > self.filled {
            self.advance();
            return Some('\u{FFFD}');
        }
        let decoded = std::str::from_utf8(&self.buf[..len])
            .ok()
            .and_then(|s| s.chars().next());
        match decoded {
            Some(ch) => {
                for _ in 0..len {
                    self.advance();
                }
                Some(ch)
            }
            None => {
                self.advance();
                Some('\u{FFFD}')
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Lexer
// ═══════════════════════════════════════════════════════════════════

/// A streaming lexer for Jack source code.
///
/// ```rust
/// use tokenizer::{Keyword, Lexer, TokenKind};
///
/// let kinds: Vec<_> = Lexer::from_str("let x = 1;").map(|t| t.kind).collect();
/// assert_eq!(kinds[0], TokenKind::Keyword(Keyword::Let));
/// assert_eq!(kinds.last(), Some(&TokenKind::Eof));
/// ```
pub struct Lexer<R: Read> {
    rb: ReadBuf<R>,
    emitted_eof: bool,
}

impl<R: Read> Lexer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            rb: ReadBuf::new(reader),
            emitted_eof: false,
        }
    }
}

impl<'a> Lexer<&'a [u8]> {
    /// Create a lexer over an in-memory source string.
    pub fn from_str(source: &'a str) -> Self {
        Self::new(source.as_bytes())
    }
}

impl<R: Read> Lexer<R> {
    fn pos(&self) -> Pos {
        self.rb.pos()
    }

    fn peek(&self) -> Option<u8> {
        self.rb.peek()
    }

    fn peek_ahead(&self, n: usize) -> Option<u8> {
        self.rb.peek_ahead(n)
    }

    fn advance(&mut self) -> Option<u8> {
        self.rb.advance()
    }

    // ───────────────────────────────────────────────────────────
    //  Whitespace and comments
    // ───────────────────────────────────────────────────────────

    /// Skip whitespace and comments. Returns an error token for an
    /// unterminated block comment.
    fn skip_trivia(&mut self) -> Option<Token> {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C) => {
                    self.advance();
                }
                Some(b'/') if self.peek_ahead(1) == Some(b'/') => {
                    while !matches!(self.peek(), Some(b'\n') | None) {
                        self.advance();
                    }
                }
                Some(b'/') if self.peek_ahead(1) == Some(b'*') => {
                    if let Some(err) = self.skip_block_comment() {
                        return Some(err);
                    }
                }
                _ => return None,
            }
        }
    }

    fn skip_block_comment(&mut self) -> Option<Token> {
        let start = self.pos();
        self.advance(); // `/`
        self.advance(); // `*`
        loop {
            match self.peek() {
                None => {
                    return Some(Token::new(
                        TokenKind::Error("unterminated block comment".into()),
                        Span::new(start, self.pos()),
                        "/*",
                    ));
                }
                Some(b'*') if self.peek_ahead(1) == Some(b'/') => {
                    self.advance();
                    self.advance();
                    return None;
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    // ───────────────────────────────────────────────────────────
    //  Literals
    // ───────────────────────────────────────────────────────────

    /// Lex a `"…"` literal. The body may not span lines and has no
    /// escape sequences.
    fn lex_string(&mut self) -> Token {
        let start = self.pos();
        self.advance(); // opening `"`
        let mut body = Vec::new();
        loop {
            match self.peek() {
                Some(b'"') => {
                    self.advance();
                    break;
                }
                Some(b'\n') | Some(b'\r') | None => {
                    let raw = format!("\"{}", String::from_utf8_lossy(&body));
                    return Token::new(
                        TokenKind::Error("unterminated string constant".into()),
                        Span::new(start, self.pos()),
                        raw,
                    );
                }
                Some(b) => {
                    body.push(b);
                    self.advance();
                }
            }
        }
        let value = String::from_utf8_lossy(&body).into_owned();
        let raw = format!("\"{value}\"");
        Token::new(TokenKind::String(value), Span::new(start, self.pos()), raw)
    }

    fn lex_integer(&mut self) -> Token {
        let start = self.pos();
        let mut raw = String::new();
        let mut value: Option<u64> = Some(0);
        while let Some(b) = self.peek() {
            if !b.is_ascii_digit() {
                break;
            }
            raw.push(b as char);
            value = value
                .and_then(|v| v.checked_mul(10))
                .and_then(|v| v.checked_add(u64::from(b - b'0')));
            self.advance();
        }
        let span = Span::new(start, self.pos());
        match value {
            Some(v) => Token::new(TokenKind::Integer(v), span, raw),
            None => Token::new(
                TokenKind::Error("integer constant overflow".into()),
                span,
                raw,
            ),
        }
    }

    // ───────────────────────────────────────────────────────────
    //  Words
    // ───────────────────────────────────────────────────────────

    fn lex_word(&mut self) -> Token {
        let start = self.pos();
        let mut raw = String::new();
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'_' {
                raw.push(b as char);
                self.advance();
            } else {
                break;
            }
        }
        let span = Span::new(start, self.pos());
        let kind = match Keyword::from_word(&raw) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Identifier(raw.clone()),
        };
        Token::new(kind, span, raw)
    }

    // ───────────────────────────────────────────────────────────
    //  Main dispatch
    // ───────────────────────────────────────────────────────────

    /// Produce the next token from the stream.
    pub fn next_token(&mut self) -> Token {
        if let Some(err) = self.skip_trivia() {
            return err;
        }

        let start = self.pos();
        let b = match self.peek() {
            Some(b) => b,
            None => return Token::new(TokenKind::Eof, Span::point(start), ""),
        };

        match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.lex_word(),
            _ if is_symbol(b as char) => {
                self.advance();
                let c = b as char;
                Token::new(
                    TokenKind::Symbol(c),
                    Span::new(start, self.pos()),
                    c.to_string(),
                )
            }
            b'0'..=b'9' => self.lex_integer(),
            b'"' => self.lex_string(),
            _ => {
                let ch = self.rb.advance_char().unwrap_or('\u{FFFD}');
                Token::new(
                    TokenKind::Error(format!("unexpected character: {ch:?}")),
                    Span::new(start, self.pos()),
                    ch.to_string(),
                )
            }
        }
    }
}

impl<R: Read> Iterator for Lexer<R> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.emitted_eof {
            return None;
        }
        let tok = self.next_token();
        if tok.is_eof() {
            self.emitted_eof = true;
        }
        Some(tok)
    }
}

// ═══════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn tokens(src: &str) -> Vec<Token> {
        Lexer::from_str(src).collect()
    }

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokens(src).into_iter().map(|t| t.kind).collect()
    }

    fn ident(s: &str) -> TokenKind {
        TokenKind::Identifier(s.into())
    }

    // ── Literals ──────────────────────────────────────────────

    #[test]
    fn lex_integer() {
        assert_eq!(kinds("42"), vec![TokenKind::Integer(42), TokenKind::Eof]);
    }

    #[test]
    fn lex_integer_is_not_range_checked() {
        assert_eq!(
            kinds("99999"),
            vec![TokenKind::Integer(99999), TokenKind::Eof]
        );
    }

    #[test]
    fn lex_integer_overflow_is_error() {
        let k = kinds("99999999999999999999999");
        assert!(matches!(k[0], TokenKind::Error(_)));
    }

    #[test]
    fn lex_string() {
        assert_eq!(
            kinds(r#""hello world""#),
            vec![TokenKind::String("hello world".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn string_body_keeps_comment_markers() {
        assert_eq!(
            kinds(r#""a // b /* c */""#),
            vec![TokenKind::String("a // b /* c */".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn lex_unterminated_string() {
        let k = kinds("\"abc\nlet");
        assert!(matches!(&k[0], TokenKind::Error(m) if m.contains("unterminated")));
    }

    // ── Words ─────────────────────────────────────────────────

    #[test]
    fn keywords_win_over_identifiers() {
        assert_eq!(
            kinds("class while this"),
            vec![
                TokenKind::Keyword(Keyword::Class),
                TokenKind::Keyword(Keyword::While),
                TokenKind::Keyword(Keyword::This),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keyword_prefix_is_identifier() {
        assert_eq!(
            kinds("classy letter do_it"),
            vec![
                ident("classy"),
                ident("letter"),
                ident("do_it"),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn identifiers_with_digits_and_underscores() {
        assert_eq!(
            kinds("_a1 b_2"),
            vec![ident("_a1"), ident("b_2"), TokenKind::Eof]
        );
    }

    // ── Symbols ───────────────────────────────────────────────

    #[test]
    fn lex_symbols() {
        let k = kinds("{}()[].,;+-*/&|<>=~^#");
        let syms: Vec<char> = k
            .iter()
            .filter_map(|k| match k {
                TokenKind::Symbol(c) => Some(*c),
                _ => None,
            })
            .collect();
        assert_eq!(syms.iter().collect::<String>(), "{}()[].,;+-*/&|<>=~^#");
        assert_eq!(k.last(), Some(&TokenKind::Eof));
    }

    #[test]
    fn slash_is_division_when_not_a_comment() {
        assert_eq!(
            kinds("a / b"),
            vec![
                ident("a"),
                TokenKind::Symbol('/'),
                ident("b"),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn digits_then_letters_split() {
        assert_eq!(
            kinds("12ab"),
            vec![TokenKind::Integer(12), ident("ab"), TokenKind::Eof]
        );
    }

    // ── Comments ──────────────────────────────────────────────

    #[test]
    fn comments_are_discarded() {
        let src = "/** doc\n * more */ let // tail\n x /* inline */ = 1;";
        assert_eq!(
            kinds(src),
            vec![
                TokenKind::Keyword(Keyword::Let),
                ident("x"),
                TokenKind::Symbol('='),
                TokenKind::Integer(1),
                TokenKind::Symbol(';'),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_block_comment() {
        let k = kinds("x /* never closed");
        assert_eq!(k[0], ident("x"));
        assert!(matches!(&k[1], TokenKind::Error(m) if m.contains("block comment")));
    }

    #[test]
    fn unexpected_character() {
        let toks = tokens("let $x");
        assert!(matches!(toks[1].kind, TokenKind::Error(_)));
        assert_eq!(toks[1].lexeme, "$");
        assert_eq!(toks[1].span.start.column, 5);
    }

    #[test]
    fn non_ascii_character_is_single_error() {
        let toks = tokens("é");
        assert!(matches!(toks[0].kind, TokenKind::Error(_)));
        assert_eq!(toks[0].lexeme, "é");
        assert_eq!(toks[0].span.len(), 2);
    }

    // ── Spans ─────────────────────────────────────────────────

    #[test]
    fn span_tracking() {
        let toks = tokens("ab\n  cd");
        assert_eq!(toks[0].span.start.line, 1);
        assert_eq!(toks[0].span.start.column, 1);
        assert_eq!(toks[1].span.start.line, 2);
        assert_eq!(toks[1].span.start.column, 3);
    }

    #[test]
    fn eof_is_emitted_once() {
        let mut lexer = Lexer::from_str("x");
        assert!(lexer.next().is_some());
        assert!(lexer.next().is_some_and(|t| t.is_eof()));
        assert!(lexer.next().is_none());
    }

    #[test]
    fn lex_from_cursor() {
        let stream = Cursor::new(b"do Main.run();" as &[u8]);
        let toks: Vec<_> = Lexer::new(stream).map(|t| t.kind).collect();
        assert_eq!(
            toks,
            vec![
                TokenKind::Keyword(Keyword::Do),
                ident("Main"),
                TokenKind::Symbol('.'),
                ident("run"),
                TokenKind::Symbol('('),
                TokenKind::Symbol(')'),
                TokenKind::Symbol(';'),
                TokenKind::Eof,
            ]
        );
    }
}
