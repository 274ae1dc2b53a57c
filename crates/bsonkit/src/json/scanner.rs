//! Character reader that tracks line and column for error reporting.

use crate::error::{JsonErrorKind, JsonParseError};

/// Position of a character in the input, both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Pos {
    pub(super) line: usize,
    pub(super) column: usize,
}

impl Pos {
    pub(super) fn error(self, kind: JsonErrorKind) -> JsonParseError {
        JsonParseError {
            kind,
            line: self.line,
            column: self.column,
        }
    }
}

#[derive(Debug, Clone)]
pub(super) struct Scanner<'src> {
    src: &'src str,
    /// Byte offset of the next unread character.
    offset: usize,
    pos: Pos,
}

impl<'src> Scanner<'src> {
    pub(super) fn new(src: &'src str) -> Self {
        Self {
            src,
            offset: 0,
            pos: Pos { line: 1, column: 1 },
        }
    }

    pub(super) fn pos(&self) -> Pos {
        self.pos
    }

    pub(super) fn offset(&self) -> usize {
        self.offset
    }

    pub(super) fn slice(&self, start: usize) -> &'src str {
        &self.src[start..self.offset]
    }

    pub(super) fn peek(&self) -> Option<char> {
        self.src[self.offset..].chars().next()
    }

    pub(super) fn next_char(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.pos.line += 1;
            self.pos.column = 1;
        } else {
            self.pos.column += 1;
        }
        Some(ch)
    }

    /// Consumes the next character if it satisfies `pred`.
    pub(super) fn next_if(&mut self, pred: impl FnOnce(char) -> bool) -> Option<char> {
        match self.peek() {
            Some(ch) if pred(ch) => self.next_char(),
            _ => None,
        }
    }

    pub(super) fn skip_whitespace(&mut self) {
        while self
            .next_if(|c| matches!(c, ' ' | '\t' | '\n' | '\r'))
            .is_some()
        {}
    }

    /// Consumes `expected` or reports the offending character.
    pub(super) fn expect(&mut self, expected: char) -> Result<(), JsonParseError> {
        let at = self.pos;
        match self.next_char() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(at.error(JsonErrorKind::InvalidCharacter(c))),
            None => Err(at.error(JsonErrorKind::UnexpectedEndOfInput)),
        }
    }

    /// The error for whatever sits at the cursor.
    pub(super) fn unexpected(&self) -> JsonParseError {
        match self.peek() {
            Some(c) => self.pos.error(JsonErrorKind::InvalidCharacter(c)),
            None => self.pos.error(JsonErrorKind::UnexpectedEndOfInput),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_lines_and_columns() {
        let mut s = Scanner::new("a\nbc");
        assert_eq!(s.next_char(), Some('a'));
        assert_eq!(s.pos(), Pos { line: 1, column: 2 });
        s.next_char();
        assert_eq!(s.pos(), Pos { line: 2, column: 1 });
        s.next_char();
        assert_eq!(s.pos(), Pos { line: 2, column: 2 });
    }

    #[test]
    fn expect_reports_position() {
        let mut s = Scanner::new("  x");
        s.skip_whitespace();
        let err = s.expect('y').unwrap_err();
        assert_eq!(err.kind, JsonErrorKind::InvalidCharacter('x'));
        assert_eq!((err.line, err.column), (1, 3));
    }
}
