//! Codec error types

use thiserror::Error;

/// Errors raised while reading or writing encoded buffers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Unexpected end of buffer: needed {needed} bytes, {remaining} remaining")]
    EndOfBuffer { needed: usize, remaining: usize },

    #[error("Variable-length integer exceeds {bits} bits")]
    VarIntSizeExceeded { bits: u32 },

    #[error("Unsupported value type: {0}")]
    UnsupportedType(String),

    #[error("Unknown Any tag: {0}")]
    UnknownTag(u8),

    #[error("Invalid UTF-8 string: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("Nesting depth {depth} exceeds the limit of {limit}")]
    NestingTooDeep { depth: usize, limit: usize },

    #[error("Integer {value} does not fit into {target}")]
    IntegerOutOfRange { value: i128, target: &'static str },
}

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, Error>;
