//! Parse errors with source locations.

use crate::location::Location;
use thiserror::Error;

/// Result type for parsing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the tokenizer and the event reader.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A character that cannot start or continue any token.
    #[error("unexpected character '{found}' at {location}")]
    UnexpectedCharacter { found: char, location: Location },

    /// The input ended inside a string literal.
    #[error("unterminated string starting at {location}")]
    UnterminatedString { location: Location },

    /// An invalid escape sequence inside a string literal.
    #[error("invalid escape sequence '{escape}' at {location}")]
    InvalidEscape { escape: String, location: Location },

    /// A number literal that does not match the JSON grammar.
    #[error("invalid number literal '{text}' at {location}")]
    InvalidNumber { text: String, location: Location },

    /// A well-formed token in a position the grammar does not allow.
    #[error("unexpected {token} at {location}")]
    UnexpectedToken { token: String, location: Location },

    /// The input ended while a value or container was still open.
    #[error("unexpected end of input at {location}")]
    UnexpectedEnd { location: Location },

    /// Non-whitespace input after the top-level value.
    #[error("unexpected trailing content at {location}")]
    TrailingData { location: Location },
}

impl Error {
    /// The location the error was detected at.
    pub fn location(&self) -> Location {
        match self {
            Error::UnexpectedCharacter { location, .. }
            | Error::UnterminatedString { location }
            | Error::InvalidEscape { location, .. }
            | Error::InvalidNumber { location, .. }
            | Error::UnexpectedToken { location, .. }
            | Error::UnexpectedEnd { location }
            | Error::TrailingData { location } => *location,
        }
    }
}
