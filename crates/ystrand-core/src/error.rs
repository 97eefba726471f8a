//! Error types for ystrand core

use thiserror::Error;

use crate::id::{ClientID, ID};

/// Core error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Codec error: {0}")]
    Codec(#[from] ystrand_codec::Error),

    #[error("Unknown block ref number: {0}")]
    UnknownRefNumber(u8),

    #[error("Content with ref number {0} has no binary encoding")]
    UnsupportedContent(u8),

    #[error("Unknown type ref: {0}")]
    UnknownTypeRef(u8),

    #[error("Offset {offset} out of bounds for content of length {len}")]
    InvalidOffset { offset: u32, len: u32 },

    #[error("Clock gap for client {client}: expected {expected}, got {got}")]
    ClockGap {
        client: ClientID,
        expected: u32,
        got: u32,
    },

    #[error("Parent of item {0} is unknown and cannot be encoded")]
    UnknownParent(ID),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid document options: {0}")]
    InvalidOptions(String),
}

/// Result type alias for ystrand core operations
pub type Result<T> = std::result::Result<T, Error>;
