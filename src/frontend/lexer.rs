//! Lexer (tokenizer) for C source code
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the parser.
//! Comments are dropped, and preprocessor directives are skipped up to the
//! first unescaped newline.

use super::source::{SourceMap, SourceRange};

/// Kinds of token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Keyword(&'static str),
    IntLiteral(String),
    FloatLiteral(String),
    CharLiteral(String),
    StringLiteral(String),
    Punct(&'static str),
    Eof,
}

/// A token with its source span
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: SourceRange,
}

impl Token {
    pub fn is_punct(&self, p: &str) -> bool {
        matches!(self.kind, TokenKind::Punct(q) if q == p)
    }

    pub fn is_keyword(&self, k: &str) -> bool {
        matches!(self.kind, TokenKind::Keyword(q) if q == k)
    }

    /// Human-readable spelling used in diagnostics
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Ident(s)
            | TokenKind::IntLiteral(s)
            | TokenKind::FloatLiteral(s)
            | TokenKind::CharLiteral(s)
            | TokenKind::StringLiteral(s) => format!("'{}'", s),
            TokenKind::Keyword(s) | TokenKind::Punct(s) => format!("'{}'", s),
            TokenKind::Eof => "end of file".to_string(),
        }
    }
}

const KEYWORDS: &[&str] = &[
    "_Bool", "auto", "break", "case", "char", "const", "continue", "default", "do", "double",
    "else", "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
    "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef",
    "union", "unsigned", "void", "volatile", "while",
];

// Longest first so that maximal munch falls out of a linear scan.
const PUNCTUATORS: &[&str] = &[
    "...", "<<=", ">>=", "->", "++", "--", "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "+=",
    "-=", "*=", "/=", "%=", "&=", "|=", "^=", "+", "-", "*", "/", "%", "<", ">", "=", "!", "~",
    "&", "|", "^", "?", ":", ";", ",", ".", "(", ")", "[", "]", "{", "}",
];

/// Error produced when the input contains something the lexer cannot tokenise
#[derive(Debug, Clone)]
pub struct LexError {
    pub message: String,
    pub offset: usize,
}

/// Tokeniser over one source buffer
pub struct Lexer<'a> {
    map: &'a SourceMap,
    bytes: &'a [u8],
    pos: usize,
    at_line_start: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(map: &'a SourceMap) -> Self {
        Self {
            map,
            bytes: map.text().as_bytes(),
            pos: 0,
            at_line_start: true,
        }
    }

    /// Tokenise the whole buffer; the last token is always [`TokenKind::Eof`]
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let start = self.pos;
            let Some(&c) = self.bytes.get(self.pos) else {
                let eof = self.map.location(start);
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    range: SourceRange::new(eof, eof),
                });
                return Ok(tokens);
            };
            self.at_line_start = false;

            let kind = if c.is_ascii_alphabetic() || c == b'_' {
                self.lex_word()
            } else if c.is_ascii_digit()
                || (c == b'.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit()))
            {
                self.lex_number()
            } else if c == b'\'' {
                TokenKind::CharLiteral(self.lex_quoted(b'\'')?)
            } else if c == b'"' {
                TokenKind::StringLiteral(self.lex_quoted(b'"')?)
            } else {
                self.lex_punct()?
            };

            tokens.push(Token {
                kind,
                range: SourceRange::new(self.map.location(start), self.map.location(self.pos)),
            });
        }
    }

    fn peek_at(&self, n: usize) -> Option<u8> {
        self.bytes.get(self.pos + n).copied()
    }

    fn skip_trivia(&mut self) {
        while let Some(&c) = self.bytes.get(self.pos) {
            match c {
                b'\n' => {
                    self.pos += 1;
                    self.at_line_start = true;
                }
                b' ' | b'\t' | b'\r' | 0x0b | 0x0c => self.pos += 1,
                b'/' if self.peek_at(1) == Some(b'/') => {
                    while self.bytes.get(self.pos).is_some_and(|b| *b != b'\n') {
                        self.pos += 1;
                    }
                }
                b'/' if self.peek_at(1) == Some(b'*') => {
                    self.pos += 2;
                    while self.pos < self.bytes.len()
                        && !(self.bytes[self.pos] == b'*' && self.peek_at(1) == Some(b'/'))
                    {
                        self.pos += 1;
                    }
                    self.pos = (self.pos + 2).min(self.bytes.len());
                }
                b'#' if self.at_line_start => self.skip_directive(),
                _ => return,
            }
        }
    }

    fn skip_directive(&mut self) {
        while let Some(&c) = self.bytes.get(self.pos) {
            if c == b'\\' && self.peek_at(1) == Some(b'\n') {
                self.pos += 2;
                continue;
            }
            if c == b'\n' {
                return;
            }
            self.pos += 1;
        }
    }

    fn lex_word(&mut self) -> TokenKind {
        let start = self.pos;
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|c| c.is_ascii_alphanumeric() || *c == b'_')
        {
            self.pos += 1;
        }
        let word = &self.map.text()[start..self.pos];
        match KEYWORDS.iter().find(|k| **k == word) {
            Some(k) => TokenKind::Keyword(k),
            None => TokenKind::Ident(word.to_string()),
        }
    }

    fn lex_number(&mut self) -> TokenKind {
        let start = self.pos;
        let mut is_float = false;

        if self.bytes[self.pos] == b'0' && matches!(self.peek_at(1), Some(b'x' | b'X')) {
            self.pos += 2;
            while self.bytes.get(self.pos).is_some_and(|c| c.is_ascii_hexdigit()) {
                self.pos += 1;
            }
        } else {
            while let Some(&c) = self.bytes.get(self.pos) {
                if c.is_ascii_digit() {
                    self.pos += 1;
                } else if c == b'.' {
                    is_float = true;
                    self.pos += 1;
                } else if matches!(c, b'e' | b'E') {
                    is_float = true;
                    self.pos += 1;
                    if matches!(self.bytes.get(self.pos), Some(b'+' | b'-')) {
                        self.pos += 1;
                    }
                } else {
                    break;
                }
            }
        }

        // suffixes: u, l, ll, f
        while let Some(&c) = self.bytes.get(self.pos) {
            match c {
                b'u' | b'U' | b'l' | b'L' => self.pos += 1,
                b'f' | b'F' => {
                    is_float = true;
                    self.pos += 1;
                }
                _ => break,
            }
        }

        let text = self.map.text()[start..self.pos].to_string();
        if is_float {
            TokenKind::FloatLiteral(text)
        } else {
            TokenKind::IntLiteral(text)
        }
    }

    fn lex_quoted(&mut self, quote: u8) -> Result<String, LexError> {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.bytes.get(self.pos) {
                None | Some(b'\n') => {
                    return Err(LexError {
                        message: "unterminated literal".to_string(),
                        offset: start,
                    })
                }
                Some(b'\\') => self.pos += 2,
                Some(c) if *c == quote => {
                    self.pos += 1;
                    break;
                }
                Some(_) => self.pos += 1,
            }
        }
        Ok(self.map.text()[start..self.pos].to_string())
    }

    fn lex_punct(&mut self) -> Result<TokenKind, LexError> {
        let rest = &self.bytes[self.pos..];
        match PUNCTUATORS.iter().find(|p| rest.starts_with(p.as_bytes())) {
            Some(p) => {
                self.pos += p.len();
                Ok(TokenKind::Punct(p))
            }
            None => Err(LexError {
                message: format!("unexpected character '{}'", rest[0] as char),
                offset: self.pos,
            }),
        }
    }
}

/// Numeric value of a C integer literal, ignoring suffixes
pub fn parse_int_literal(text: &str) -> Option<i64> {
    let digits = text.trim_end_matches(['u', 'U', 'l', 'L']);
    if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16).ok().map(|v| v as i64)
    } else if digits.len() > 1 && digits.starts_with('0') {
        u64::from_str_radix(&digits[1..], 8).ok().map(|v| v as i64)
    } else {
        digits.parse::<u64>().ok().map(|v| v as i64)
    }
}

/// Numeric value of a C character literal such as `'a'` or `'\n'`
pub fn parse_char_literal(text: &str) -> Option<i64> {
    let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut chars = inner.chars();
    let first = chars.next()?;
    if first != '\\' {
        return Some(first as i64);
    }
    let escaped: String = chars.collect();
    let value = match escaped.as_str() {
        "n" => 10,
        "t" => 9,
        "r" => 13,
        "0" => 0,
        "a" => 7,
        "b" => 8,
        "f" => 12,
        "v" => 11,
        "\\" => 92,
        "'" => 39,
        "\"" => 34,
        "?" => 63,
        other => {
            if let Some(hex) = other.strip_prefix('x') {
                i64::from_str_radix(hex, 16).ok()?
            } else {
                i64::from_str_radix(other, 8).ok()?
            }
        }
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let map = SourceMap::new(src);
        Lexer::new(&map)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_maximal_munch() {
        assert_eq!(
            kinds("a<<=b->c"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Punct("<<="),
                TokenKind::Ident("b".into()),
                TokenKind::Punct("->"),
                TokenKind::Ident("c".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_skips_comments_and_directives() {
        let src = "#include <stdio.h>\n/* c */ int // x\nx;";
        assert_eq!(
            kinds(src),
            vec![
                TokenKind::Keyword("int"),
                TokenKind::Ident("x".into()),
                TokenKind::Punct(";"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("10 0x1F 3.5f 1e3 7UL"),
            vec![
                TokenKind::IntLiteral("10".into()),
                TokenKind::IntLiteral("0x1F".into()),
                TokenKind::FloatLiteral("3.5f".into()),
                TokenKind::FloatLiteral("1e3".into()),
                TokenKind::IntLiteral("7UL".into()),
                TokenKind::Eof,
            ]
        );
        assert_eq!(parse_int_literal("0x1F"), Some(31));
        assert_eq!(parse_int_literal("010"), Some(8));
        assert_eq!(parse_int_literal("7UL"), Some(7));
    }

    #[test]
    fn test_token_ranges() {
        let map = SourceMap::new("int x = 1 + 2;");
        let tokens = Lexer::new(&map).tokenize().unwrap();
        let plus = &tokens[4];
        assert!(plus.is_punct("+"));
        assert_eq!(plus.range.start.column, 11);
        assert_eq!(plus.range.end.column, 12);
    }

    #[test]
    fn test_char_literals() {
        assert_eq!(parse_char_literal("'a'"), Some(97));
        assert_eq!(parse_char_literal("'\\n'"), Some(10));
        assert_eq!(parse_char_literal("'\\x41'"), Some(65));
    }
}
