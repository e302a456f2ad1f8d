//! Wavelet Crypto - Primitives a contract may reach through the host ABI.
//!
//! This crate provides:
//! - Blake2b (256/512), SHA-256 and SHA-512 digests
//! - Ed25519 signature verification

pub mod ed25519;
pub mod hash;
pub mod error;

pub use ed25519::{verify as ed25519_verify, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
pub use hash::{blake2b_256, blake2b_512, sha256, sha512, HashAlgorithm};
pub use error::CryptoError;
