//! Recursive-descent JSON parser producing a position-annotated tree.
//!
//! Object keys keep their order and duplicates are preserved. Extended JSON
//! wrappers are interpreted afterwards, by [`super::extended`].

use alloc::{string::String, vec::Vec};

use super::scanner::{Pos, Scanner};
use crate::error::{JsonErrorKind, JsonParseError};

#[derive(Debug, Clone, PartialEq)]
pub(super) enum JsonValue {
    Null,
    Bool(bool),
    /// The validated lexeme; conversion picks the numeric type.
    Number(String),
    String(String),
    Array(Vec<Node>),
    Object(Vec<(String, Node)>),
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct Node {
    pub(super) value: JsonValue,
    pub(super) pos: Pos,
}

impl Node {
    pub(super) fn error(&self, kind: JsonErrorKind) -> JsonParseError {
        self.pos.error(kind)
    }
}

pub(super) struct Parser<'src> {
    scanner: Scanner<'src>,
    max_depth: usize,
}

impl<'src> Parser<'src> {
    pub(super) fn new(src: &'src str, max_depth: usize) -> Self {
        Self {
            scanner: Scanner::new(src),
            max_depth,
        }
    }

    /// Parses exactly one value surrounded by optional whitespace.
    pub(super) fn parse_document(mut self) -> Result<Node, JsonParseError> {
        let node = self.parse_value(0)?;
        self.scanner.skip_whitespace();
        if self.scanner.peek().is_some() {
            return Err(self.scanner.pos().error(JsonErrorKind::TrailingCharacters));
        }
        Ok(node)
    }

    fn parse_value(&mut self, depth: usize) -> Result<Node, JsonParseError> {
        self.scanner.skip_whitespace();
        let pos = self.scanner.pos();
        let value = match self.scanner.peek() {
            Some('{') => self.parse_object(depth + 1, pos)?,
            Some('[') => self.parse_array(depth + 1, pos)?,
            Some('"') => JsonValue::String(self.parse_string()?),
            Some('t') => {
                self.parse_literal("true")?;
                JsonValue::Bool(true)
            }
            Some('f') => {
                self.parse_literal("false")?;
                JsonValue::Bool(false)
            }
            Some('n') => {
                self.parse_literal("null")?;
                JsonValue::Null
            }
            Some(c) if c == '-' || c.is_ascii_digit() => JsonValue::Number(self.parse_number()?),
            _ => return Err(self.scanner.unexpected()),
        };
        Ok(Node { value, pos })
    }

    fn parse_literal(&mut self, literal: &str) -> Result<(), JsonParseError> {
        literal.chars().try_for_each(|c| self.scanner.expect(c))
    }

    fn parse_object(&mut self, depth: usize, pos: Pos) -> Result<JsonValue, JsonParseError> {
        if depth > self.max_depth {
            return Err(pos.error(JsonErrorKind::MaxDepthExceeded));
        }
        self.scanner.expect('{')?;
        let mut entries = Vec::new();
        self.scanner.skip_whitespace();
        if self.scanner.next_if(|c| c == '}').is_some() {
            return Ok(JsonValue::Object(entries));
        }
        loop {
            self.scanner.skip_whitespace();
            if self.scanner.peek() != Some('"') {
                return Err(self.scanner.unexpected());
            }
            let key = self.parse_string()?;
            self.scanner.skip_whitespace();
            self.scanner.expect(':')?;
            let value = self.parse_value(depth)?;
            entries.push((key, value));
            self.scanner.skip_whitespace();
            match self.scanner.next_if(|c| c == ',' || c == '}') {
                Some(',') => {}
                Some(_) => return Ok(JsonValue::Object(entries)),
                None => return Err(self.scanner.unexpected()),
            }
        }
    }

    fn parse_array(&mut self, depth: usize, pos: Pos) -> Result<JsonValue, JsonParseError> {
        if depth > self.max_depth {
            return Err(pos.error(JsonErrorKind::MaxDepthExceeded));
        }
        self.scanner.expect('[')?;
        let mut items = Vec::new();
        self.scanner.skip_whitespace();
        if self.scanner.next_if(|c| c == ']').is_some() {
            return Ok(JsonValue::Array(items));
        }
        loop {
            items.push(self.parse_value(depth)?);
            self.scanner.skip_whitespace();
            match self.scanner.next_if(|c| c == ',' || c == ']') {
                Some(',') => {}
                Some(_) => return Ok(JsonValue::Array(items)),
                None => return Err(self.scanner.unexpected()),
            }
        }
    }

    fn parse_number(&mut self) -> Result<String, JsonParseError> {
        let start = self.scanner.offset();
        let pos = self.scanner.pos();
        let invalid = || pos.error(JsonErrorKind::InvalidNumber);
        self.scanner.next_if(|c| c == '-');
        match self.scanner.next_char() {
            Some('0') => {}
            Some(c) if c.is_ascii_digit() => self.skip_digits(),
            _ => return Err(invalid()),
        }
        if self.scanner.next_if(|c| c == '.').is_some() {
            if self.scanner.next_if(|c| c.is_ascii_digit()).is_none() {
                return Err(invalid());
            }
            self.skip_digits();
        }
        if self.scanner.next_if(|c| c == 'e' || c == 'E').is_some() {
            self.scanner.next_if(|c| c == '+' || c == '-');
            if self.scanner.next_if(|c| c.is_ascii_digit()).is_none() {
                return Err(invalid());
            }
            self.skip_digits();
        }
        Ok(String::from(self.scanner.slice(start)))
    }

    fn skip_digits(&mut self) {
        while self.scanner.next_if(|c| c.is_ascii_digit()).is_some() {}
    }

    fn parse_string(&mut self) -> Result<String, JsonParseError> {
        self.scanner.expect('"')?;
        let mut out = String::new();
        loop {
            let pos = self.scanner.pos();
            match self.scanner.next_char() {
                None => return Err(pos.error(JsonErrorKind::UnexpectedEndOfInput)),
                Some('"') => return Ok(out),
                Some('\\') => out.push(self.parse_escape()?),
                Some(c) if u32::from(c) < 0x20 => {
                    return Err(pos.error(JsonErrorKind::InvalidCharacter(c)));
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_escape(&mut self) -> Result<char, JsonParseError> {
        let pos = self.scanner.pos();
        Ok(match self.scanner.next_char() {
            Some('"') => '"',
            Some('\\') => '\\',
            Some('/') => '/',
            Some('b') => '\u{08}',
            Some('f') => '\u{0C}',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('t') => '\t',
            Some('u') => return self.parse_unicode_escape(pos),
            Some(c) => return Err(pos.error(JsonErrorKind::InvalidCharacter(c))),
            None => return Err(pos.error(JsonErrorKind::UnexpectedEndOfInput)),
        })
    }

    /// Decodes the digits after `\u`, joining surrogate pairs.
    fn parse_unicode_escape(&mut self, pos: Pos) -> Result<char, JsonParseError> {
        let high = self.parse_hex4()?;
        let code = if (0xD800..0xDC00).contains(&high) {
            if self.scanner.next_if(|c| c == '\\').is_none()
                || self.scanner.next_if(|c| c == 'u').is_none()
            {
                return Err(pos.error(JsonErrorKind::InvalidUnicodeEscape(high)));
            }
            let low = self.parse_hex4()?;
            if !(0xDC00..0xE000).contains(&low) {
                return Err(pos.error(JsonErrorKind::InvalidUnicodeEscape(low)));
            }
            0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
        } else {
            high
        };
        char::from_u32(code).ok_or_else(|| pos.error(JsonErrorKind::InvalidUnicodeEscape(code)))
    }

    fn parse_hex4(&mut self) -> Result<u32, JsonParseError> {
        let mut code = 0;
        for _ in 0..4 {
            let pos = self.scanner.pos();
            let digit = match self.scanner.next_char() {
                Some(c) => c
                    .to_digit(16)
                    .ok_or_else(|| pos.error(JsonErrorKind::InvalidCharacter(c)))?,
                None => return Err(pos.error(JsonErrorKind::UnexpectedEndOfInput)),
            };
            code = code * 16 + digit;
        }
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn parse(src: &str) -> Result<Node, JsonParseError> {
        Parser::new(src, 10).parse_document()
    }

    #[test]
    fn keeps_key_order_and_duplicates() {
        let node = parse(r#"{"b": 1, "a": 2, "b": 3}"#).unwrap();
        let JsonValue::Object(entries) = node.value else {
            panic!("expected object");
        };
        let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["b", "a", "b"]);
    }

    #[test]
    fn decodes_surrogate_pairs() {
        let node = parse(r#""\ud83d\ude00 \u00e9""#).unwrap();
        assert_eq!(node.value, JsonValue::String(String::from("\u{1F600} \u{e9}")));
    }

    #[rstest]
    #[case::lone_high_surrogate(r#""\ud83d""#, JsonErrorKind::InvalidUnicodeEscape(0xD83D), 1, 3)]
    #[case::leading_zero("01", JsonErrorKind::TrailingCharacters, 1, 2)]
    #[case::missing_fraction("1.", JsonErrorKind::InvalidNumber, 1, 1)]
    #[case::bare_word("{\n  \"a\": nope}", JsonErrorKind::InvalidCharacter('o'), 2, 9)]
    #[case::unterminated("[1, 2", JsonErrorKind::UnexpectedEndOfInput, 1, 6)]
    #[case::trailing("{} {}", JsonErrorKind::TrailingCharacters, 1, 4)]
    #[case::too_deep("[[[[[[[[[[[1]]]]]]]]]]]", JsonErrorKind::MaxDepthExceeded, 1, 11)]
    fn reports_errors(
        #[case] src: &str,
        #[case] kind: JsonErrorKind,
        #[case] line: usize,
        #[case] column: usize,
    ) {
        assert_eq!(parse(src), Err(JsonParseError { kind, line, column }));
    }
}
