//! Lexer producing spanned JSON tokens.
//!
//! The tokenizer knows nothing about the JSON grammar beyond individual
//! tokens; the reader layers the grammar on top. Splitting the two keeps the
//! escape and number handling testable in isolation.

use crate::error::{Error, Result};
use crate::event::JsonNumber;
use crate::location::Location;

/// A lexical token with the location it started at.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Colon,
    Comma,
    String(String),
    Number(JsonNumber),
    True,
    False,
    Null,
}

impl TokenKind {
    /// Name used in grammar error messages.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::LeftBrace => "'{'",
            TokenKind::RightBrace => "'}'",
            TokenKind::LeftBracket => "'['",
            TokenKind::RightBracket => "']'",
            TokenKind::Colon => "':'",
            TokenKind::Comma => "','",
            TokenKind::String(_) => "string",
            TokenKind::Number(_) => "number",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::Null => "'null'",
        }
    }
}

/// Streaming tokenizer over a UTF-8 input.
pub struct Tokenizer<'a> {
    input: &'a str,
    offset: usize,
    row: usize,
    column: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            offset: 0,
            row: 0,
            column: 0,
        }
    }

    /// The current position, used for end-of-input diagnostics.
    pub fn location(&self) -> Location {
        Location::new(self.offset, self.row, self.column)
    }

    /// Pull the next token, or `None` at the end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        self.skip_whitespace();
        let location = self.location();
        let ch = match self.peek() {
            Some(ch) => ch,
            None => return Ok(None),
        };
        let kind = match ch {
            '{' => {
                self.bump();
                TokenKind::LeftBrace
            }
            '}' => {
                self.bump();
                TokenKind::RightBrace
            }
            '[' => {
                self.bump();
                TokenKind::LeftBracket
            }
            ']' => {
                self.bump();
                TokenKind::RightBracket
            }
            ':' => {
                self.bump();
                TokenKind::Colon
            }
            ',' => {
                self.bump();
                TokenKind::Comma
            }
            '"' => TokenKind::String(self.read_string(location)?),
            '-' | '0'..='9' => TokenKind::Number(self.read_number(location)?),
            't' => {
                self.read_word("true", location)?;
                TokenKind::True
            }
            'f' => {
                self.read_word("false", location)?;
                TokenKind::False
            }
            'n' => {
                self.read_word("null", location)?;
                TokenKind::Null
            }
            other => {
                return Err(Error::UnexpectedCharacter {
                    found: other,
                    location,
                });
            }
        };
        Ok(Some(Token { kind, location }))
    }

    fn peek(&self) -> Option<char> {
        self.input[self.offset..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.row += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\n' | '\r')) {
            self.bump();
        }
    }

    fn read_word(&mut self, word: &'static str, location: Location) -> Result<()> {
        for expected in word.chars() {
            match self.bump() {
                Some(ch) if ch == expected => {}
                Some(ch) => {
                    return Err(Error::UnexpectedCharacter {
                        found: ch,
                        location,
                    });
                }
                None => return Err(Error::UnexpectedEnd { location }),
            }
        }
        Ok(())
    }

    fn read_string(&mut self, start: Location) -> Result<String> {
        self.bump(); // opening quote
        let mut out = String::new();
        loop {
            let ch = self
                .bump()
                .ok_or(Error::UnterminatedString { location: start })?;
            match ch {
                '"' => return Ok(out),
                '\\' => out.push(self.read_escape(start)?),
                c if (c as u32) < 0x20 => {
                    return Err(Error::UnexpectedCharacter {
                        found: c,
                        location: start,
                    });
                }
                c => out.push(c),
            }
        }
    }

    fn read_escape(&mut self, start: Location) -> Result<char> {
        let location = self.location();
        let ch = self
            .bump()
            .ok_or(Error::UnterminatedString { location: start })?;
        Ok(match ch {
            '"' => '"',
            '\\' => '\\',
            '/' => '/',
            'b' => '\u{0008}',
            'f' => '\u{000C}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'u' => self.read_unicode_escape(location, start)?,
            other => {
                return Err(Error::InvalidEscape {
                    escape: format!("\\{other}"),
                    location,
                });
            }
        })
    }

    fn read_unicode_escape(&mut self, location: Location, start: Location) -> Result<char> {
        let first = self.read_hex4(location, start)?;
        // Surrogate pairs encode characters outside the BMP.
        if (0xD800..0xDC00).contains(&first) {
            if self.bump() != Some('\\') || self.bump() != Some('u') {
                return Err(Error::InvalidEscape {
                    escape: format!("\\u{first:04X}"),
                    location,
                });
            }
            let second = self.read_hex4(location, start)?;
            if !(0xDC00..0xE000).contains(&second) {
                return Err(Error::InvalidEscape {
                    escape: format!("\\u{first:04X}\\u{second:04X}"),
                    location,
                });
            }
            let code = 0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00);
            return char::from_u32(code).ok_or(Error::InvalidEscape {
                escape: format!("\\u{first:04X}\\u{second:04X}"),
                location,
            });
        }
        char::from_u32(first).ok_or(Error::InvalidEscape {
            escape: format!("\\u{first:04X}"),
            location,
        })
    }

    fn read_hex4(&mut self, location: Location, start: Location) -> Result<u32> {
        let mut value = 0u32;
        for _ in 0..4 {
            let ch = self
                .bump()
                .ok_or(Error::UnterminatedString { location: start })?;
            let digit = ch.to_digit(16).ok_or_else(|| Error::InvalidEscape {
                escape: format!("\\u..{ch}"),
                location,
            })?;
            value = value * 16 + digit;
        }
        Ok(value)
    }

    fn read_number(&mut self, location: Location) -> Result<JsonNumber> {
        let start = self.offset;
        if self.peek() == Some('-') {
            self.bump();
        }
        // Integer part: a bare zero or a nonzero-led digit run.
        match self.peek() {
            Some('0') => {
                self.bump();
            }
            Some('1'..='9') => {
                self.consume_digits();
            }
            _ => return Err(self.bad_number(start, location)),
        }
        if self.peek() == Some('.') {
            self.bump();
            if !self.consume_digits() {
                return Err(self.bad_number(start, location));
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            if !self.consume_digits() {
                return Err(self.bad_number(start, location));
            }
        }
        Ok(JsonNumber::from_literal(&self.input[start..self.offset]))
    }

    fn consume_digits(&mut self) -> bool {
        let mut any = false;
        while matches!(self.peek(), Some('0'..='9')) {
            self.bump();
            any = true;
        }
        any
    }

    fn bad_number(&mut self, start: usize, location: Location) -> Error {
        // Include the partial literal plus the offending character.
        let end = self
            .peek()
            .map(|c| self.offset + c.len_utf8())
            .unwrap_or(self.offset);
        Error::InvalidNumber {
            text: self.input[start..end].to_string(),
            location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<TokenKind> {
        let mut tokenizer = Tokenizer::new(input);
        let mut out = Vec::new();
        while let Some(token) = tokenizer.next_token().unwrap() {
            out.push(token.kind);
        }
        out
    }

    #[test]
    fn test_punctuation_and_literals() {
        assert_eq!(
            tokens("{}[]:, true false null"),
            vec![
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::LeftBracket,
                TokenKind::RightBracket,
                TokenKind::Colon,
                TokenKind::Comma,
                TokenKind::True,
                TokenKind::False,
                TokenKind::Null,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            tokens(r#""a\"b\\c\ndA""#),
            vec![TokenKind::String("a\"b\\c\nd\u{0041}".to_string())]
        );
    }

    #[test]
    fn test_surrogate_pair() {
        assert_eq!(
            tokens(r#""😀""#),
            vec![TokenKind::String("\u{1F600}".to_string())]
        );
    }

    #[test]
    fn test_lone_surrogate_is_rejected() {
        let mut tokenizer = Tokenizer::new(r#""\uD83D!""#);
        assert!(matches!(
            tokenizer.next_token(),
            Err(Error::InvalidEscape { .. })
        ));
    }

    #[test]
    fn test_number_grammar() {
        assert_eq!(
            tokens("0 -1 1.5 1e3 -2.5E-2"),
            vec![
                TokenKind::Number(JsonNumber::from_literal("0")),
                TokenKind::Number(JsonNumber::from_literal("-1")),
                TokenKind::Number(JsonNumber::from_literal("1.5")),
                TokenKind::Number(JsonNumber::from_literal("1e3")),
                TokenKind::Number(JsonNumber::from_literal("-2.5E-2")),
            ]
        );
    }

    #[test]
    fn test_leading_zero_is_rejected() {
        let mut tokenizer = Tokenizer::new("01");
        // "0" terminates the literal; "1" then reads as a second number,
        // which the reader rejects as trailing data. A bare "-" fails here.
        assert!(tokenizer.next_token().is_ok());
        let mut tokenizer = Tokenizer::new("-x");
        assert!(matches!(
            tokenizer.next_token(),
            Err(Error::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_locations_track_rows_and_columns() {
        let mut tokenizer = Tokenizer::new("{\n  \"a\": 1}");
        let brace = tokenizer.next_token().unwrap().unwrap();
        assert_eq!(brace.location, Location::new(0, 0, 0));
        let key = tokenizer.next_token().unwrap().unwrap();
        assert_eq!(key.location, Location::new(4, 1, 2));
    }

    #[test]
    fn test_unterminated_string() {
        let mut tokenizer = Tokenizer::new(r#""abc"#);
        assert!(matches!(
            tokenizer.next_token(),
            Err(Error::UnterminatedString { .. })
        ));
    }
}
