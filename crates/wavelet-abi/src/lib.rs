//! Wavelet ABI - Binary serialization of contract call parameters and of
//! the invocation envelope a contract reads through `_payload`.
//!
//! Everything is little-endian. The envelope is a fixed 112-byte header
//! followed by the encoded parameters:
//!
//! ```text
//! round_index:u64 | round_id:32 | transaction_id:32 | sender_id:32 | amount:u64 | params
//! ```

pub mod builder;
pub mod error;
pub mod params;
pub mod payload;

pub use builder::PayloadBuilder;
pub use error::EncodingError;
pub use params::{encode_parameters, ByteSource, CallParameter};
pub use payload::{encode_invocation_envelope, ContractPayload, HEADER_LEN};
