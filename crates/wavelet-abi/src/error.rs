use thiserror::Error;

/// Errors raised while encoding or decoding payloads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Invalid {field}: expected 32 bytes, got {len}")]
    InvalidIdentifier { field: &'static str, len: usize },

    #[error("Payload truncated: needed {needed} bytes, got {actual}")]
    Truncated { needed: usize, actual: usize },

    #[error("Unknown parameter type: {0}")]
    UnknownTag(String),

    #[error("Invalid value for {tag}: {value}")]
    InvalidValue { tag: String, value: String },
}

impl From<hex::FromHexError> for EncodingError {
    fn from(e: hex::FromHexError) -> Self {
        EncodingError::InvalidHex(e.to_string())
    }
}
