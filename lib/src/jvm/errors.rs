use super::class_file::{Constant, ConstantIndex};
use std::fmt;

#[derive(Debug)]
pub enum Error {
    ConstantPoolOverflow {
        constant: Constant,
        offset: usize,
    },
    IoError(std::io::Error),

    /// Class file structure is invalid (bad magic, truncated data, trailing bytes, ...)
    MalformedClassFile(String),

    /// String whose modified UTF-8 encoding is longer than a `Utf8` constant can hold
    Utf8TooLong { length: usize },

    /// Index does not point at the start of a constant
    MissingConstant(ConstantIndex),

    /// Index points at a constant of the wrong kind
    UnexpectedConstant {
        index: ConstantIndex,
        expected: &'static str,
        found: Constant,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConstantPoolOverflow { constant, offset } => write!(
                f,
                "constant pool overflow adding {:?} at offset {}",
                constant, offset
            ),
            Error::IoError(err) => write!(f, "{}", err),
            Error::MalformedClassFile(msg) => write!(f, "malformed class file: {}", msg),
            Error::Utf8TooLong { length } => write!(
                f,
                "string of {} bytes is too long for a Utf8 constant (at most 65535)",
                length
            ),
            Error::MissingConstant(index) => write!(f, "no constant at index #{}", index.0),
            Error::UnexpectedConstant {
                index,
                expected,
                found,
            } => write!(
                f,
                "expected {} constant at index #{}, found {:?}",
                expected, index.0, found
            ),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::IoError(err)
    }
}
