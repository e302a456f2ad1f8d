use serde::{Deserialize, Serialize};
use wavelet_crypto::HashAlgorithm;

/// Gas schedule for host functions.
///
/// Wasm instructions are metered separately by the engine at one unit per
/// operator; these costs are deducted from the same budget whenever a
/// contract calls into the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GasSchedule {
    // Payload access
    pub payload_len: u64,            // 5
    pub payload_base: u64,           // 5
    pub payload_per_byte: u64,       // 1

    // Output
    pub result_base: u64,            // 100
    pub result_per_byte: u64,        // 1
    pub log_base: u64,               // 375
    pub log_per_byte: u64,           // 8

    // Transactions
    pub send_transaction_base: u64,      // 2,100
    pub send_transaction_per_byte: u64,  // 16

    // Crypto
    pub ed25519_verify: u64,         // 3,000
    pub blake2b_base: u64,           // 20
    pub blake2b_per_word: u64,       // 4
    pub sha256_base: u64,            // 60
    pub sha256_per_word: u64,        // 12
    pub sha512_base: u64,            // 80
    pub sha512_per_word: u64,        // 16
}

impl Default for GasSchedule {
    fn default() -> Self {
        Self {
            // Payload access
            payload_len: 5,
            payload_base: 5,
            payload_per_byte: 1,

            // Output
            result_base: 100,
            result_per_byte: 1,
            log_base: 375,
            log_per_byte: 8,

            // Transactions
            send_transaction_base: 2_100,
            send_transaction_per_byte: 16,

            // Crypto
            ed25519_verify: 3_000,
            blake2b_base: 20,
            blake2b_per_word: 4,
            sha256_base: 60,
            sha256_per_word: 12,
            sha512_base: 80,
            sha512_per_word: 16,
        }
    }
}

impl GasSchedule {
    /// Cost of copying the payload into contract memory.
    pub fn payload_cost(&self, len: usize) -> u64 {
        linear(self.payload_base, self.payload_per_byte, len as u64)
    }

    /// Cost of setting the call result.
    pub fn result_cost(&self, len: usize) -> u64 {
        linear(self.result_base, self.result_per_byte, len as u64)
    }

    /// Cost of emitting a log line.
    pub fn log_cost(&self, len: usize) -> u64 {
        linear(self.log_base, self.log_per_byte, len as u64)
    }

    /// Cost of queueing a transaction with a payload of `len` bytes.
    pub fn send_transaction_cost(&self, len: usize) -> u64 {
        linear(self.send_transaction_base, self.send_transaction_per_byte, len as u64)
    }

    /// Cost of hashing `len` bytes, charged per started 32-byte word.
    pub fn hash_cost(&self, algorithm: HashAlgorithm, len: usize) -> u64 {
        let words = (len as u64).div_ceil(32);
        let (base, per_word) = match algorithm {
            HashAlgorithm::Blake2b256 | HashAlgorithm::Blake2b512 => {
                (self.blake2b_base, self.blake2b_per_word)
            }
            HashAlgorithm::Sha256 => (self.sha256_base, self.sha256_per_word),
            HashAlgorithm::Sha512 => (self.sha512_base, self.sha512_per_word),
        };
        linear(base, per_word, words)
    }
}

fn linear(base: u64, per_unit: u64, units: u64) -> u64 {
    base.saturating_add(per_unit.saturating_mul(units))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_cost_scales_with_size() {
        let schedule = GasSchedule::default();
        assert_eq!(schedule.log_cost(0), 375);
        assert_eq!(schedule.log_cost(10), 375 + 80);
    }

    #[test]
    fn test_hash_cost_rounds_up_to_words() {
        let schedule = GasSchedule::default();
        assert_eq!(schedule.hash_cost(HashAlgorithm::Sha256, 0), 60);
        assert_eq!(schedule.hash_cost(HashAlgorithm::Sha256, 1), 72);
        assert_eq!(schedule.hash_cost(HashAlgorithm::Sha256, 32), 72);
        assert_eq!(schedule.hash_cost(HashAlgorithm::Sha256, 33), 84);
        assert_eq!(schedule.hash_cost(HashAlgorithm::Blake2b512, 64), 28);
    }

    #[test]
    fn test_costs_saturate() {
        let schedule = GasSchedule {
            log_per_byte: u64::MAX,
            ..GasSchedule::default()
        };
        assert_eq!(schedule.log_cost(2), u64::MAX);
    }

    #[test]
    fn test_partial_override_from_toml() {
        let schedule: GasSchedule = toml::from_str("ed25519_verify = 1\n").unwrap();
        assert_eq!(schedule.ed25519_verify, 1);
        assert_eq!(schedule.log_base, GasSchedule::default().log_base);
    }
}
