//! Digest functions backing the `_hash_*` host imports.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Blake2b512, Digest};
use sha2::{Sha256, Sha512};
use std::fmt;

type Blake2b256 = Blake2b<U32>;

/// Hash algorithms a contract can request from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Blake2b256,
    Blake2b512,
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 4] = [
        HashAlgorithm::Blake2b256,
        HashAlgorithm::Blake2b512,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha512,
    ];

    /// Digest length in bytes.
    pub const fn output_len(self) -> usize {
        match self {
            HashAlgorithm::Blake2b256 | HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Blake2b512 | HashAlgorithm::Sha512 => 64,
        }
    }

    /// Compute the digest of `data`.
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Blake2b256 => blake2b_256(data).to_vec(),
            HashAlgorithm::Blake2b512 => blake2b_512(data).to_vec(),
            HashAlgorithm::Sha256 => sha256(data).to_vec(),
            HashAlgorithm::Sha512 => sha512(data).to_vec(),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HashAlgorithm::Blake2b256 => "blake2b-256",
            HashAlgorithm::Blake2b512 => "blake2b-512",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
        };
        f.write_str(name)
    }
}

pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Blake2b256::digest(data));
    out
}

pub fn blake2b_512(data: &[u8]) -> [u8; 64] {
    let mut out = [0u8; 64];
    out.copy_from_slice(&Blake2b512::digest(data));
    out
}

pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(data));
    out
}

pub fn sha512(data: &[u8]) -> [u8; 64] {
    let mut out = [0u8; 64];
    out.copy_from_slice(&Sha512::digest(data));
    out
}
