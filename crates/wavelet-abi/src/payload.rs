//! The contract invocation envelope.

use crate::builder::PayloadBuilder;
use crate::error::EncodingError;
use wavelet_types::Hash;

/// Size of the fixed envelope header: round index, three identifiers, amount.
pub const HEADER_LEN: usize = 8 + 32 * 3 + 8;

/// On-chain context and arguments of one contract invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContractPayload {
    pub round_index: u64,
    pub round_id: Hash,
    pub transaction_id: Hash,
    pub sender_id: Hash,
    pub amount: u64,
    pub params: Vec<u8>,
}

impl ContractPayload {
    pub fn new(
        round_index: u64,
        round_id: Hash,
        transaction_id: Hash,
        sender_id: Hash,
        amount: u64,
        params: Vec<u8>,
    ) -> Self {
        Self {
            round_index,
            round_id,
            transaction_id,
            sender_id,
            amount,
            params,
        }
    }

    /// Context-free payload used for estimation: every identifier is zero.
    ///
    /// Contracts that branch on the round, transaction or sender id will see
    /// the all-zero values and may take a different path than on-chain.
    pub fn for_estimation(amount: u64, params: Vec<u8>) -> Self {
        Self {
            amount,
            params,
            ..Self::default()
        }
    }

    /// Build from hex-encoded identifiers as the node reports them.
    pub fn from_hex_ids(
        round_index: u64,
        round_id: &str,
        transaction_id: &str,
        sender_id: &str,
        amount: u64,
        params: Vec<u8>,
    ) -> Result<Self, EncodingError> {
        Ok(Self {
            round_index,
            round_id: parse_identifier("round_id", round_id)?,
            transaction_id: parse_identifier("transaction_id", transaction_id)?,
            sender_id: parse_identifier("sender_id", sender_id)?,
            amount,
            params,
        })
    }

    /// Serialize to the envelope layout.
    pub fn encode(&self) -> Vec<u8> {
        let mut builder = PayloadBuilder::with_capacity(HEADER_LEN + self.params.len());
        builder
            .write_u64(self.round_index)
            .write_bytes(self.round_id.as_bytes())
            .write_bytes(self.transaction_id.as_bytes())
            .write_bytes(self.sender_id.as_bytes())
            .write_u64(self.amount)
            .write_bytes(&self.params);
        builder.into_bytes()
    }

    /// Parse an envelope. Everything after the header is taken as params.
    pub fn decode(bytes: &[u8]) -> Result<Self, EncodingError> {
        if bytes.len() < HEADER_LEN {
            return Err(EncodingError::Truncated {
                needed: HEADER_LEN,
                actual: bytes.len(),
            });
        }

        let (header, params) = bytes.split_at(HEADER_LEN);
        let (round_index, rest) = header.split_at(8);
        let (round_id, rest) = rest.split_at(32);
        let (transaction_id, rest) = rest.split_at(32);
        let (sender_id, amount) = rest.split_at(32);

        Ok(Self {
            round_index: read_u64(round_index),
            round_id: to_hash("round_id", round_id)?,
            transaction_id: to_hash("transaction_id", transaction_id)?,
            sender_id: to_hash("sender_id", sender_id)?,
            amount: read_u64(amount),
            params: params.to_vec(),
        })
    }
}

/// Serialize an invocation envelope.
pub fn encode_invocation_envelope(payload: &ContractPayload) -> Vec<u8> {
    payload.encode()
}

fn parse_identifier(field: &'static str, s: &str) -> Result<Hash, EncodingError> {
    let s = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    let bytes = hex::decode(s)?;
    to_hash(field, &bytes)
}

fn to_hash(field: &'static str, bytes: &[u8]) -> Result<Hash, EncodingError> {
    Hash::from_slice(bytes).map_err(|_| EncodingError::InvalidIdentifier {
        field,
        len: bytes.len(),
    })
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{encode_parameters, CallParameter};

    fn sample() -> ContractPayload {
        ContractPayload::new(
            42,
            Hash::from_bytes([1u8; 32]),
            Hash::from_bytes([2u8; 32]),
            Hash::from_bytes([3u8; 32]),
            120,
            vec![0xaa, 0xbb],
        )
    }

    #[test]
    fn test_envelope_layout() {
        let bytes = encode_invocation_envelope(&sample());

        assert_eq!(bytes.len(), HEADER_LEN + 2);
        assert_eq!(&bytes[0..8], &42u64.to_le_bytes());
        assert_eq!(&bytes[8..40], &[1u8; 32]);
        assert_eq!(&bytes[40..72], &[2u8; 32]);
        assert_eq!(&bytes[72..104], &[3u8; 32]);
        assert_eq!(&bytes[104..112], &120u64.to_le_bytes());
        assert_eq!(&bytes[112..], &[0xaa, 0xbb]);
    }

    #[test]
    fn test_header_roundtrip() {
        let payload = sample();
        let decoded = ContractPayload::decode(&payload.encode()).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_estimation_payload_is_zeroed() {
        let params = encode_parameters(&[CallParameter::Uint32(120)]).unwrap();
        let payload = ContractPayload::for_estimation(120, params.clone());
        let bytes = payload.encode();

        assert!(bytes[..104].iter().all(|b| *b == 0));
        assert_eq!(&bytes[104..112], &120u64.to_le_bytes());
        assert_eq!(&bytes[112..], params.as_slice());
    }

    #[test]
    fn test_from_hex_ids() {
        let zero = "00".repeat(32);
        let payload = ContractPayload::from_hex_ids(0, &zero, &zero, &zero, 5, vec![]).unwrap();
        assert_eq!(payload, ContractPayload::for_estimation(5, vec![]));
    }

    #[test]
    fn test_from_hex_ids_wrong_length() {
        let zero = "00".repeat(32);
        let err = ContractPayload::from_hex_ids(0, &zero, "abcd", &zero, 5, vec![]).unwrap_err();
        assert_eq!(
            err,
            EncodingError::InvalidIdentifier {
                field: "transaction_id",
                len: 2
            }
        );
    }

    #[test]
    fn test_from_hex_ids_bad_hex() {
        let zero = "00".repeat(32);
        let err = ContractPayload::from_hex_ids(0, &zero, &zero, &"gg".repeat(32), 5, vec![])
            .unwrap_err();
        assert!(matches!(err, EncodingError::InvalidHex(_)));
    }

    #[test]
    fn test_decode_truncated() {
        let err = ContractPayload::decode(&[0u8; 50]).unwrap_err();
        assert_eq!(
            err,
            EncodingError::Truncated {
                needed: HEADER_LEN,
                actual: 50
            }
        );
    }
}
