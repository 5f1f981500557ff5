//! Font Parser (spec section 4.6): turns the token stream from the
//! [`Lexer`](super::lexer::Lexer) into a [`Value`] tree.
//!
//! ```text
//! file      := object
//! object    := '{' members? '}'
//! members   := member (',' member)*
//! member    := name nv_sep value
//! array     := '[' elements? ']'
//! elements  := element (',' element)*
//! element   := (name nv_sep value) | value
//! value     := object | array | string | number | 'true' | 'false' | 'null'
//! ```
//!
//! A name-value pair is never itself a legal `value` — it can appear as a
//! direct member of an `object`, or as an element of an `array` (spec
//! section 6's `velocities = [ v0 = {...}, v96 = {...} ]` and
//! `robins = [ r1 = {...}, r2 = {...} ]`) — but not as the bare value of
//! another name-value pair without one of those two wrappings, so
//! `{ a = b = 1 }` is rejected with [`FontError::NestedNameValue`] while
//! `{ a = [ b = 1 ] }` is fine.

use super::lexer::{Lexer, SyntaxMode, Token, TokenKind};
use super::value::Value;
use crate::error::FontError;

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: Token,
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a str) -> Self {
        let mut lexer = Lexer::new(src);
        let lookahead = lexer.next_token();
        Parser { lexer, lookahead }
    }

    pub fn syntax_mode(&self) -> Option<SyntaxMode> {
        self.lexer.syntax_mode
    }

    fn bump(&mut self) -> Token {
        let next = self.lexer.next_token();
        std::mem::replace(&mut self.lookahead, next)
    }

    fn lexer_error(&self) -> Option<FontError> {
        self.lexer.last_error().cloned()
    }

    fn unexpected_token(&self, expected: &str) -> FontError {
        if let Some(e) = self.lexer_error() {
            return e;
        }
        if matches!(self.lookahead.kind, TokenKind::Eot) {
            return FontError::UnexpectedEof {
                row: self.lookahead.start_row,
                col: self.lookahead.start_col,
            };
        }
        FontError::UnexpectedToken {
            row: self.lookahead.start_row,
            col: self.lookahead.start_col,
            expected: expected.to_string(),
            found: self.lookahead.type_name().to_string(),
        }
    }

    /// Parse an entire file. The top-level document must be a single
    /// `object` (spec section 4.6).
    pub fn parse_file(&mut self) -> Result<Value, FontError> {
        let value = self.parse_object()?;
        if !matches!(self.lookahead.kind, TokenKind::Eot) {
            return Err(self.unexpected_token("end of input"));
        }
        if let Some(e) = self.lexer_error() {
            return Err(e);
        }
        Ok(value)
    }

    fn parse_object(&mut self) -> Result<Value, FontError> {
        if !matches!(self.lookahead.kind, TokenKind::LeftBrace) {
            return Err(self.unexpected_token("'{'"));
        }
        self.bump();

        let mut members = Vec::new();
        if !matches!(self.lookahead.kind, TokenKind::RightBrace) {
            loop {
                let (name, value) = self.parse_member()?;
                members.push((name, value));
                if matches!(self.lookahead.kind, TokenKind::Comma) {
                    self.bump();
                    continue;
                }
                break;
            }
        }

        if !matches!(self.lookahead.kind, TokenKind::RightBrace) {
            return Err(self.unexpected_token("'}'"));
        }
        self.bump();
        Ok(Value::Object(members))
    }

    fn parse_member(&mut self) -> Result<(String, Value), FontError> {
        let name = match &self.lookahead.kind {
            TokenKind::QuotedString(s) | TokenKind::UnquotedString(s) => s.clone(),
            _ => return Err(self.unexpected_token("a member name")),
        };
        self.bump();

        if !matches!(self.lookahead.kind, TokenKind::NvSeparator) {
            return Err(self.unexpected_token("':' or '='"));
        }
        self.bump();

        let value = self.parse_value()?;
        Ok((name, value))
    }

    fn parse_array(&mut self) -> Result<Value, FontError> {
        self.bump(); // '['
        let mut elements = Vec::new();
        if !matches!(self.lookahead.kind, TokenKind::RightBracket) {
            loop {
                elements.push(self.parse_array_element()?);
                if matches!(self.lookahead.kind, TokenKind::Comma) {
                    self.bump();
                    continue;
                }
                break;
            }
        }
        if !matches!(self.lookahead.kind, TokenKind::RightBracket) {
            return Err(self.unexpected_token("']'"));
        }
        self.bump();
        Ok(Value::Array(elements))
    }

    /// An array element is either a plain `value`, or a `name nv_sep
    /// value` pair (spec section 6's `velocities`/`robins` arrays) — the
    /// surrounding `[]` is the "intervening bracket" that makes a
    /// name-value pair legal here even though it isn't a legal `value`
    /// on its own.
    fn parse_array_element(&mut self) -> Result<Value, FontError> {
        let quoted = match &self.lookahead.kind {
            TokenKind::QuotedString(_) => true,
            TokenKind::UnquotedString(_) => false,
            _ => return self.parse_value(),
        };

        let name = match &self.lookahead.kind {
            TokenKind::QuotedString(s) | TokenKind::UnquotedString(s) => s.clone(),
            _ => unreachable!(),
        };
        self.bump();

        if matches!(self.lookahead.kind, TokenKind::NvSeparator) {
            self.bump();
            let value = self.parse_value()?;
            return Ok(Value::NameValue(name, Box::new(value)));
        }

        Ok(if quoted { Value::QuotedString(name) } else { Value::UnquotedString(name) })
    }

    fn parse_value(&mut self) -> Result<Value, FontError> {
        match &self.lookahead.kind {
            TokenKind::LeftBrace => self.parse_object(),
            TokenKind::LeftBracket => self.parse_array(),
            TokenKind::QuotedString(s) => {
                let s = s.clone();
                self.bump();
                if matches!(self.lookahead.kind, TokenKind::NvSeparator) {
                    return Err(FontError::NestedNameValue {
                        row: self.lookahead.start_row,
                        col: self.lookahead.start_col,
                    });
                }
                Ok(Value::QuotedString(s))
            }
            TokenKind::UnquotedString(s) => {
                let s = s.clone();
                self.bump();
                if matches!(self.lookahead.kind, TokenKind::NvSeparator) {
                    return Err(FontError::NestedNameValue {
                        row: self.lookahead.start_row,
                        col: self.lookahead.start_col,
                    });
                }
                Ok(Value::UnquotedString(s))
            }
            TokenKind::Number(n) => {
                let n = n.clone();
                self.bump();
                Ok(Value::Number(n))
            }
            TokenKind::True => {
                self.bump();
                Ok(Value::True)
            }
            TokenKind::False => {
                self.bump();
                Ok(Value::False)
            }
            TokenKind::Null => {
                self.bump();
                Ok(Value::Null)
            }
            _ => Err(self.unexpected_token("a value")),
        }
    }
}

/// Parse a complete font document from `src`.
pub fn parse(src: &str) -> Result<Value, FontError> {
    Parser::new(src).parse_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flat_bryx_object() {
        let v = parse("{ name = \"kit\", polyphony = 16 }").unwrap();
        assert_eq!(v.get("name").unwrap().as_str(), Some("kit"));
        assert_eq!(v.get("polyphony").unwrap().as_number().unwrap().x(), 16.0);
    }

    #[test]
    fn parses_nested_objects_and_arrays() {
        let v = parse("{ instruments = { snare = { note = 38, velocities = [1, 2] } } }").unwrap();
        let snare = v.get("instruments").unwrap().get("snare").unwrap();
        assert_eq!(snare.get("note").unwrap().as_number().unwrap().x(), 38.0);
        assert_eq!(snare.get("velocities").unwrap().as_array().unwrap().len(), 2);
    }

    #[test]
    fn accepts_name_value_as_array_element() {
        let v = parse("{ a = [ b = 1, c = 2 ] }").unwrap();
        let elements = v.get("a").unwrap().as_array().unwrap();
        assert_eq!(elements.len(), 2);
        match &elements[0] {
            Value::NameValue(name, value) => {
                assert_eq!(name, "b");
                assert_eq!(value.as_number().unwrap().x(), 1.0);
            }
            other => panic!("expected a name-value pair, got {other:?}"),
        }
    }

    #[test]
    fn rejects_name_value_as_bare_member_value() {
        let err = parse("{ a = b = 1 }").unwrap_err();
        assert!(matches!(err, FontError::NestedNameValue { .. }));
    }

    #[test]
    fn rejects_top_level_non_object() {
        let err = parse("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, FontError::UnexpectedToken { .. }));
    }

    #[test]
    fn reports_unexpected_eof() {
        let err = parse("{ a = 1").unwrap_err();
        assert!(matches!(err, FontError::UnexpectedEof { .. }));
    }

    #[test]
    fn json_style_object_also_parses() {
        let v = parse("{\"name\": \"kit\"}").unwrap();
        assert_eq!(v.get("name").unwrap().as_str(), Some("kit"));
    }
}
