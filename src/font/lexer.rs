//! Font Lexer (spec section 4.5): tokenizes the Bryx/JSON drum-font
//! dialect. Syntax mode (JSON vs Bryx) auto-detects on the first
//! name-value separator encountered.

use crate::error::FontError;
use crate::number::{self, EngrNum};

/// Which dialect this file turned out to be, locked in on the first `:` or
/// `=` the lexer sees as a name-value separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxMode {
    Json,
    Bryx,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    NvSeparator,
    QuotedString(String),
    UnquotedString(String),
    Number(EngrNum),
    True,
    False,
    Null,
    Sot,
    Eot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub start_row: usize,
    pub start_col: usize,
    pub end_col: usize,
}

impl Token {
    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            TokenKind::LeftBrace => "'{'",
            TokenKind::RightBrace => "'}'",
            TokenKind::LeftBracket => "'['",
            TokenKind::RightBracket => "']'",
            TokenKind::Comma => "','",
            TokenKind::NvSeparator => "name-value separator",
            TokenKind::QuotedString(_) => "a quoted string",
            TokenKind::UnquotedString(_) => "an unquoted string",
            TokenKind::Number(_) => "a number",
            TokenKind::True | TokenKind::False => "a boolean",
            TokenKind::Null => "null",
            TokenKind::Sot => "start of input",
            TokenKind::Eot => "end of input",
        }
    }
}

pub struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    row: usize,
    col: usize,
    pub syntax_mode: Option<SyntaxMode>,
    last_error: Option<FontError>,
}

fn is_unquoted_start(c: u8) -> bool {
    c.is_ascii_alphabetic()
}

fn is_unquoted_cont(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'.' || c == b'-'
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            row: 1,
            col: 1,
            syntax_mode: None,
            last_error: None,
        }
    }

    pub fn last_error(&self) -> Option<&FontError> {
        self.last_error.as_ref()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        if c == b'\n' {
            self.row += 1;
            self.col = 1;
        } else {
            self.col += 1; // tabs count as one column, per spec
        }
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c == b' ' || c == b'\t' || c == b'\r' || c == b'\n' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn error(&mut self, err: FontError) -> Token {
        self.last_error = Some(err.clone());
        Token {
            kind: TokenKind::Eot,
            text: String::new(),
            start_row: self.row,
            start_col: self.col,
            end_col: self.col,
        }
    }

    /// Scan and return the next token. Returns an `Eot`-kinded token both at
    /// true end-of-input and on error (the error is recorded and queryable
    /// via [`last_error`](Self::last_error); scanning stops there, per spec
    /// section 4.5).
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start_row = self.row;
        let start_col = self.col;

        let Some(c) = self.peek() else {
            return Token {
                kind: TokenKind::Eot,
                text: String::new(),
                start_row,
                start_col,
                end_col: start_col,
            };
        };

        match c {
            b'{' => self.single(TokenKind::LeftBrace, start_row, start_col),
            b'}' => self.single(TokenKind::RightBrace, start_row, start_col),
            b'[' => self.single(TokenKind::LeftBracket, start_row, start_col),
            b']' => self.single(TokenKind::RightBracket, start_row, start_col),
            b',' => self.single(TokenKind::Comma, start_row, start_col),
            b':' => self.nv_separator(SyntaxMode::Json, start_row, start_col),
            b'=' => self.nv_separator(SyntaxMode::Bryx, start_row, start_col),
            b'"' => self.quoted_string(start_row, start_col),
            b'0'..=b'9' | b'+' | b'-' => self.number(start_row, start_col),
            c if is_unquoted_start(c) => self.word(start_row, start_col),
            other => {
                let ch = self.src[self.pos..].chars().next().unwrap_or(other as char);
                self.advance();
                self.error(FontError::UnexpectedChar {
                    row: start_row,
                    col: start_col,
                    ch,
                })
            }
        }
    }

    fn single(&mut self, kind: TokenKind, row: usize, col: usize) -> Token {
        let text = (self.peek().unwrap() as char).to_string();
        self.advance();
        Token {
            kind,
            text,
            start_row: row,
            start_col: col,
            end_col: self.col,
        }
    }

    fn nv_separator(&mut self, mode: SyntaxMode, row: usize, col: usize) -> Token {
        let text = (self.peek().unwrap() as char).to_string();
        self.advance();
        if self.syntax_mode.is_none() {
            self.syntax_mode = Some(mode);
        }
        Token {
            kind: TokenKind::NvSeparator,
            text,
            start_row: row,
            start_col: col,
            end_col: self.col,
        }
    }

    fn quoted_string(&mut self, row: usize, col: usize) -> Token {
        self.advance(); // opening quote
        let mut out = String::new();
        loop {
            match self.peek() {
                None | Some(b'\n') => {
                    return self.error(FontError::UnterminatedString { row, col });
                }
                Some(b'"') => {
                    self.advance();
                    break;
                }
                Some(b'\\') => {
                    self.advance();
                    let esc_row = self.row;
                    let esc_col = self.col;
                    match self.peek() {
                        Some(b'"') => {
                            out.push('"');
                            self.advance();
                        }
                        Some(b'\\') => {
                            out.push('\\');
                            self.advance();
                        }
                        Some(b'/') => {
                            out.push('/');
                            self.advance();
                        }
                        Some(b'b') => {
                            out.push('\u{8}');
                            self.advance();
                        }
                        Some(b'f') => {
                            out.push('\u{c}');
                            self.advance();
                        }
                        Some(b'r') => {
                            out.push('\r');
                            self.advance();
                        }
                        Some(b'n') => {
                            out.push('\n');
                            self.advance();
                        }
                        Some(b't') => {
                            out.push('\t');
                            self.advance();
                        }
                        Some(b'u') => {
                            return self.error(FontError::Unsupported { row: esc_row, col: esc_col });
                        }
                        Some(other) => {
                            let ch = other as char;
                            return self.error(FontError::InvalidEscapedChar {
                                row: esc_row,
                                col: esc_col,
                                ch,
                            });
                        }
                        None => {
                            return self.error(FontError::UnterminatedString { row, col });
                        }
                    }
                }
                Some(_) => {
                    let ch = self.src[self.pos..].chars().next().unwrap();
                    out.push(ch);
                    self.advance();
                }
            }
        }
        Token {
            kind: TokenKind::QuotedString(out.clone()),
            text: out,
            start_row: row,
            start_col: col,
            end_col: self.col,
        }
    }

    fn number(&mut self, row: usize, col: usize) -> Token {
        let rest = &self.src[self.pos..];
        match number::scan(rest) {
            Some(traits) => {
                let text = rest[..traits.end].to_string();
                match EngrNum::parse(&text, &traits, row, col) {
                    Ok(engr) => {
                        for _ in 0..traits.end {
                            self.advance();
                        }
                        Token {
                            kind: TokenKind::Number(engr),
                            text,
                            start_row: row,
                            start_col: col,
                            end_col: self.col,
                        }
                    }
                    Err(e) => self.error(e),
                }
            }
            None => {
                // '+'/'-' didn't lead a valid number; treat as unexpected char
                let ch = self.peek().unwrap() as char;
                self.advance();
                self.error(FontError::UnexpectedChar { row, col, ch })
            }
        }
    }

    fn word(&mut self, row: usize, col: usize) -> Token {
        let start = self.pos;
        self.advance();
        while let Some(c) = self.peek() {
            if is_unquoted_cont(c) {
                self.advance();
            } else {
                break;
            }
        }
        let text = self.src[start..self.pos].to_string();
        let kind = match text.as_str() {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            _ => TokenKind::UnquotedString(text.clone()),
        };
        Token {
            kind,
            text,
            start_row: row,
            start_col: col,
            end_col: self.col,
        }
    }
}
