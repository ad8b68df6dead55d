//! Error types for the typewrap crate.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::types::Type;

/// A type alias for `Result<T, Error>`.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Identifies the argument a validation failure refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentSlot {
    /// Zero-based index into the positional arguments.
    Position(usize),
    /// Keyword argument name.
    Keyword(String),
}

impl fmt::Display for ArgumentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentSlot::Position(index) => write!(f, "position {}", index),
            ArgumentSlot::Keyword(name) => write!(f, "keyword `{}`", name),
        }
    }
}

/// The main error type for the typewrap crate.
#[derive(Error, Debug)]
pub enum Error {
    /// A positional argument landed in a slot the signature declares no type for.
    #[error("no type declared for argument at {slot}")]
    MissingTypeDeclaration {
        /// The offending slot.
        slot: ArgumentSlot,
    },

    /// A supplied argument does not satisfy its declared type.
    #[error("argument at {slot} must be {expected}, got {actual}")]
    ArgumentTypeMismatch {
        /// Position or keyword of the argument.
        slot: ArgumentSlot,
        /// The declared type.
        expected: Type,
        /// Runtime type name of the supplied value, or `missing`.
        actual: String,
    },

    /// A keyword argument no parameter or rest-keyword type covers.
    ///
    /// Validation stops at the first leftover keyword in sorted order, so a
    /// call with several unmatched keywords reports only that one.
    #[error("unexpected keyword argument `{keyword}`")]
    UnexpectedKeywordArgument {
        /// The unmatched keyword.
        keyword: String,
    },

    /// The wrapped callable returned a value outside its declared return type.
    #[error("return value must be {expected}, got {actual}")]
    ReturnTypeMismatch {
        /// The declared return type.
        expected: Type,
        /// Runtime type of the returned value.
        actual: Type,
    },

    /// Parameter descriptors or type signature are malformed.
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Invalid argument errors raised by callables themselves.
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// Parser related errors.
    #[error("Parser error: {0}")]
    Parser(String),

    /// I/O related errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other miscellaneous errors.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Creates a new type mismatch error for an argument.
    pub fn mismatch(slot: ArgumentSlot, expected: &Type, actual: impl Into<String>) -> Self {
        Self::ArgumentTypeMismatch { slot, expected: expected.clone(), actual: actual.into() }
    }

    /// Creates a new invalid signature error.
    pub fn signature_error(msg: impl Into<String>) -> Self {
        Self::InvalidSignature(msg.into())
    }

    /// Creates a new parser error.
    pub fn parser_error(msg: impl Into<String>) -> Self {
        Self::Parser(msg.into())
    }

    /// Creates a new argument error.
    pub fn argument_error(msg: impl Into<String>) -> Self {
        Self::Argument(msg.into())
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::mismatch(ArgumentSlot::Position(3), &Type::Numeric, "str");
        assert_eq!(err.to_string(), "argument at position 3 must be Numeric, got str");

        let err = Error::mismatch(ArgumentSlot::Keyword("msg".into()), &Type::Str, "int");
        assert_eq!(err.to_string(), "argument at keyword `msg` must be str, got int");

        let err = Error::UnexpectedKeywordArgument { keyword: "color".into() };
        assert_eq!(err.to_string(), "unexpected keyword argument `color`");
    }
}
