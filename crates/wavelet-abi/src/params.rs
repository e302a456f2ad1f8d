//! Contract call parameters.
//!
//! Parameters are written back to back with no separators or type tags, so
//! the order must match what the contract function reads.

use crate::builder::PayloadBuilder;
use crate::error::EncodingError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Byte-valued parameter input. Whether the value is hex is decided by the
/// variant, never by inspecting the content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ByteSource {
    /// Hex-encoded bytes, optionally `0x`-prefixed.
    Hex(String),
    /// Already-binary bytes.
    Binary(Vec<u8>),
}

impl ByteSource {
    /// Resolve to raw bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodingError> {
        match self {
            ByteSource::Binary(bytes) => Ok(bytes.clone()),
            ByteSource::Hex(s) => decode_hex(s),
        }
    }
}

impl From<Vec<u8>> for ByteSource {
    fn from(bytes: Vec<u8>) -> Self {
        ByteSource::Binary(bytes)
    }
}

impl From<&[u8]> for ByteSource {
    fn from(bytes: &[u8]) -> Self {
        ByteSource::Binary(bytes.to_vec())
    }
}

/// A single typed call argument.
///
/// The serde form mirrors the node client's `{ "type": ..., "value": ... }`
/// parameter objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CallParameter {
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Byte(u8),
    /// Bytes written verbatim; the contract must know the length.
    Raw(ByteSource),
    /// Bytes prefixed with a u32 little-endian length.
    Bytes(ByteSource),
    /// UTF-8 followed by a single zero byte.
    String(String),
}

impl CallParameter {
    /// Wire tag of this parameter.
    pub fn tag(&self) -> &'static str {
        match self {
            CallParameter::Int16(_) => "int16",
            CallParameter::Int32(_) => "int32",
            CallParameter::Int64(_) => "int64",
            CallParameter::Uint16(_) => "uint16",
            CallParameter::Uint32(_) => "uint32",
            CallParameter::Uint64(_) => "uint64",
            CallParameter::Byte(_) => "byte",
            CallParameter::Raw(_) => "raw",
            CallParameter::Bytes(_) => "bytes",
            CallParameter::String(_) => "string",
        }
    }

    /// Append the encoding of this parameter to `builder`.
    pub fn encode_into(&self, builder: &mut PayloadBuilder) -> Result<(), EncodingError> {
        match self {
            CallParameter::Int16(n) => builder.write_i16(*n),
            CallParameter::Int32(n) => builder.write_i32(*n),
            CallParameter::Int64(n) => builder.write_i64(*n),
            CallParameter::Uint16(n) => builder.write_u16(*n),
            CallParameter::Uint32(n) => builder.write_u32(*n),
            CallParameter::Uint64(n) => builder.write_u64(*n),
            CallParameter::Byte(n) => builder.write_byte(*n),
            CallParameter::Raw(source) => builder.write_bytes(&source.to_bytes()?),
            CallParameter::Bytes(source) => {
                let bytes = source.to_bytes()?;
                let len = u32::try_from(bytes.len()).map_err(|_| EncodingError::InvalidValue {
                    tag: "bytes".to_string(),
                    value: format!("{} bytes exceeds u32 length prefix", bytes.len()),
                })?;
                builder.write_u32(len).write_bytes(&bytes)
            }
            CallParameter::String(s) => builder.write_bytes(s.as_bytes()).write_byte(0),
        };
        Ok(())
    }
}

impl fmt::Display for CallParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallParameter::Int16(n) => write!(f, "int16:{}", n),
            CallParameter::Int32(n) => write!(f, "int32:{}", n),
            CallParameter::Int64(n) => write!(f, "int64:{}", n),
            CallParameter::Uint16(n) => write!(f, "uint16:{}", n),
            CallParameter::Uint32(n) => write!(f, "uint32:{}", n),
            CallParameter::Uint64(n) => write!(f, "uint64:{}", n),
            CallParameter::Byte(n) => write!(f, "byte:{}", n),
            CallParameter::Raw(source) | CallParameter::Bytes(source) => {
                let hex = match source {
                    ByteSource::Hex(s) => s.clone(),
                    ByteSource::Binary(b) => hex::encode(b),
                };
                write!(f, "{}:{}", self.tag(), hex)
            }
            CallParameter::String(s) => write!(f, "string:{}", s),
        }
    }
}

/// Parses the command-line form `<type>:<value>`. Byte-valued types take hex.
impl FromStr for CallParameter {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tag, value) = s
            .split_once(':')
            .ok_or_else(|| EncodingError::UnknownTag(s.to_string()))?;

        let invalid = || EncodingError::InvalidValue {
            tag: tag.to_string(),
            value: value.to_string(),
        };

        let param = match tag {
            "int16" => CallParameter::Int16(value.parse().map_err(|_| invalid())?),
            "int32" => CallParameter::Int32(value.parse().map_err(|_| invalid())?),
            "int64" => CallParameter::Int64(value.parse().map_err(|_| invalid())?),
            "uint16" => CallParameter::Uint16(value.parse().map_err(|_| invalid())?),
            "uint32" => CallParameter::Uint32(value.parse().map_err(|_| invalid())?),
            "uint64" => CallParameter::Uint64(value.parse().map_err(|_| invalid())?),
            "byte" => CallParameter::Byte(value.parse().map_err(|_| invalid())?),
            "raw" => CallParameter::Raw(ByteSource::Hex(value.to_string())),
            "bytes" => CallParameter::Bytes(ByteSource::Hex(value.to_string())),
            "string" => CallParameter::String(value.to_string()),
            other => return Err(EncodingError::UnknownTag(other.to_string())),
        };
        Ok(param)
    }
}

/// Encode an ordered parameter list into contract input bytes.
pub fn encode_parameters(params: &[CallParameter]) -> Result<Vec<u8>, EncodingError> {
    let mut builder = PayloadBuilder::new();
    for param in params {
        param.encode_into(&mut builder)?;
    }
    Ok(builder.into_bytes())
}

fn decode_hex(s: &str) -> Result<Vec<u8>, EncodingError> {
    let s = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    Ok(hex::decode(s)?)
}
