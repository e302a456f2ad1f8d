//! Wavelet Types - Core type definitions shared by the gas estimator crates.
//!
//! This crate provides:
//! - Hashes (32-byte identifiers for rounds, transactions and accounts)
//! - The shared error type for parsing them

pub mod hash;
pub mod error;

#[cfg(feature = "serde")]
mod serialization;

pub use hash::Hash;
pub use error::TypesError;
