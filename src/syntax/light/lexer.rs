//! Lexer for the reference provider.
//!
//! Produces every lexeme including punctuation; the provider keeps only the
//! non-punctuation ones in the public [`TokenStream`](crate::syntax::TokenStream).

use crate::syntax::{SyntaxError, TokenKind};
use crate::types::ByteRange;

static KEYWORDS: phf::Set<&'static str> = phf::phf_set! {
    "_", "as", "associatedtype", "async", "await", "break", "case", "catch", "class", "continue",
    "default", "defer", "deinit", "do", "dynamic", "else", "enum", "extension", "fallthrough",
    "false", "fileprivate", "final", "for", "func", "guard", "if", "import", "in", "indirect",
    "init", "inout", "internal", "is", "lazy", "let", "mutating", "nil", "nonmutating", "open",
    "operator", "override", "private", "protocol", "public", "repeat", "required", "rethrows",
    "return", "self", "Self", "static", "struct", "subscript", "super", "switch", "throw",
    "throws", "true", "try", "typealias", "unowned", "var", "weak", "where", "while", "actor",
    "convenience",
};

pub(super) const OPERATOR_CHARS: &[u8] = b"/=-+!*%<>&|^~?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum LexKind {
    Token(TokenKind),
    Punct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Lexeme {
    pub kind: LexKind,
    pub range: ByteRange,
}

impl Lexeme {
    pub fn is_comment(&self) -> bool {
        self.kind == LexKind::Token(TokenKind::Comment)
    }
}

fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(word)
}

pub(super) struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    out: Vec<Lexeme>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            out: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Lexeme>, SyntaxError> {
        while self.pos < self.bytes.len() {
            let start = self.pos;
            let b = self.bytes[start];
            match b {
                b' ' | b'\t' | b'\r' | b'\n' => self.pos += 1,
                b'/' if self.peek_at(1) == Some(b'/') => {
                    self.pos = self.find_from(start, b'\n').unwrap_or(self.bytes.len());
                    self.push(TokenKind::Comment, start);
                }
                b'/' if self.peek_at(1) == Some(b'*') => {
                    self.block_comment(start)?;
                    self.push(TokenKind::Comment, start);
                }
                b'"' => {
                    self.string(start, 0)?;
                    self.push(TokenKind::String, start);
                }
                b'#' if matches!(self.peek_at(1), Some(b'"' | b'#')) => {
                    let hashes = self.bytes[start..].iter().take_while(|&&c| c == b'#').count();
                    if self.bytes.get(start + hashes) == Some(&b'"') {
                        self.pos = start + hashes;
                        self.string(start, hashes)?;
                        self.push(TokenKind::String, start);
                    } else {
                        self.pos += 1;
                        self.push_punct(start);
                    }
                }
                b'#' | b'@' if self.peek_at(1).is_some_and(is_ident_start) => {
                    self.pos += 1;
                    self.identifier_tail();
                    self.push(TokenKind::Other, start);
                }
                b'0'..=b'9' => {
                    self.number();
                    self.push(TokenKind::Other, start);
                }
                b'$' => {
                    self.pos += 1;
                    self.identifier_tail();
                    self.push(TokenKind::Identifier, start);
                }
                b'`' => {
                    let end = self.find_from(start + 1, b'`').ok_or(SyntaxError::Unexpected {
                        found: "`".to_string(),
                        offset: start,
                    })?;
                    self.pos = end + 1;
                    self.push(TokenKind::Identifier, start);
                }
                b'.' => {
                    let rest = &self.bytes[start..];
                    if rest.starts_with(b"...") || rest.starts_with(b"..<") {
                        self.pos += 3;
                    } else {
                        self.pos += 1;
                    }
                    self.push_punct(start);
                }
                c if OPERATOR_CHARS.contains(&c) => {
                    self.pos += 1;
                    while let Some(&next) = self.bytes.get(self.pos) {
                        let starts_comment = next == b'/' && matches!(self.peek_at(1), Some(b'/' | b'*'));
                        if !OPERATOR_CHARS.contains(&next) || starts_comment {
                            break;
                        }
                        self.pos += 1;
                    }
                    self.push_punct(start);
                }
                c if is_ident_start(c) => {
                    self.identifier_tail();
                    let word = &self.source[start..self.pos];
                    let kind = if is_keyword(word) {
                        TokenKind::Keyword
                    } else {
                        TokenKind::Identifier
                    };
                    self.push(kind, start);
                }
                _ => {
                    // Single punctuation character; step over the whole UTF-8 sequence
                    let width = self.source[start..].chars().next().map_or(1, char::len_utf8);
                    self.pos += width;
                    self.push_punct(start);
                }
            }
        }
        Ok(self.out)
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn find_from(&self, from: usize, needle: u8) -> Option<usize> {
        self.bytes[from..].iter().position(|&c| c == needle).map(|p| from + p)
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        self.out.push(Lexeme {
            kind: LexKind::Token(kind),
            range: ByteRange::from_bounds(start, self.pos),
        });
    }

    fn push_punct(&mut self, start: usize) {
        self.out.push(Lexeme {
            kind: LexKind::Punct,
            range: ByteRange::from_bounds(start, self.pos),
        });
    }

    fn identifier_tail(&mut self) {
        while let Some(&c) = self.bytes.get(self.pos) {
            if is_ident_continue(c) {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn number(&mut self) {
        while let Some(&c) = self.bytes.get(self.pos) {
            let fraction = c == b'.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit());
            if c.is_ascii_alphanumeric() || c == b'_' || fraction {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn block_comment(&mut self, start: usize) -> Result<(), SyntaxError> {
        self.pos = start + 2;
        let mut depth = 1;
        while depth > 0 {
            match (self.bytes.get(self.pos), self.peek_at(1)) {
                (None, _) => return Err(SyntaxError::UnterminatedComment { offset: start }),
                (Some(b'/'), Some(b'*')) => {
                    depth += 1;
                    self.pos += 2;
                }
                (Some(b'*'), Some(b'/')) => {
                    depth -= 1;
                    self.pos += 2;
                }
                _ => self.pos += 1,
            }
        }
        Ok(())
    }

    /// Consume a string literal whose opening quote is at `self.pos`, preceded
    /// by `hashes` raw-string delimiters.
    fn string(&mut self, start: usize, hashes: usize) -> Result<(), SyntaxError> {
        let multiline = self.bytes[self.pos..].starts_with(b"\"\"\"");
        self.pos += if multiline { 3 } else { 1 };
        let close: &[u8] = if multiline { b"\"\"\"" } else { b"\"" };
        loop {
            let Some(&c) = self.bytes.get(self.pos) else {
                return Err(SyntaxError::UnterminatedString { offset: start });
            };
            match c {
                b'\n' if !multiline => return Err(SyntaxError::UnterminatedString { offset: start }),
                b'\\' if self.escape_applies(hashes) => {
                    self.pos += 1 + hashes;
                    if self.bytes.get(self.pos) == Some(&b'(') {
                        self.interpolation(start)?;
                    } else {
                        self.pos += 1;
                    }
                }
                b'"' if self.bytes[self.pos..].starts_with(close) && self.closing_hashes(close.len(), hashes) => {
                    self.pos += close.len() + hashes;
                    return Ok(());
                }
                _ => self.pos += 1,
            }
        }
    }

    fn escape_applies(&self, hashes: usize) -> bool {
        (1..=hashes).all(|i| self.bytes.get(self.pos + i) == Some(&b'#'))
    }

    fn closing_hashes(&self, quote_len: usize, hashes: usize) -> bool {
        (0..hashes).all(|i| self.bytes.get(self.pos + quote_len + i) == Some(&b'#'))
    }

    /// Skip a `\( ... )` interpolation, including nested parentheses and strings.
    fn interpolation(&mut self, string_start: usize) -> Result<(), SyntaxError> {
        self.pos += 1;
        let mut depth = 1;
        while depth > 0 {
            let Some(&c) = self.bytes.get(self.pos) else {
                return Err(SyntaxError::UnterminatedString { offset: string_start });
            };
            match c {
                b'(' => {
                    depth += 1;
                    self.pos += 1;
                }
                b')' => {
                    depth -= 1;
                    self.pos += 1;
                }
                b'"' => {
                    let nested = self.pos;
                    self.string(nested, 0)?;
                }
                b'\n' => return Err(SyntaxError::UnterminatedString { offset: string_start }),
                _ => self.pos += 1,
            }
        }
        Ok(())
    }
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c >= 0x80
}

fn is_ident_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c >= 0x80
}
