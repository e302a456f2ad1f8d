use crate::error::CryptoError;
use ed25519_dalek::{Signature, VerifyingKey};

pub const PUBLIC_KEY_LENGTH: usize = ed25519_dalek::PUBLIC_KEY_LENGTH;
pub const SIGNATURE_LENGTH: usize = ed25519_dalek::SIGNATURE_LENGTH;

/// Verify an ed25519 signature given raw key and signature bytes, as a
/// contract hands them over through linear memory.
///
/// Uses the strict check: small-order public keys and non-canonical
/// signature points are rejected.
pub fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
    let pk: &[u8; PUBLIC_KEY_LENGTH] =
        public_key
            .try_into()
            .map_err(|_| CryptoError::InvalidLength {
                expected: PUBLIC_KEY_LENGTH,
                actual: public_key.len(),
            })?;
    let sig: &[u8; SIGNATURE_LENGTH] =
        signature
            .try_into()
            .map_err(|_| CryptoError::InvalidLength {
                expected: SIGNATURE_LENGTH,
                actual: signature.len(),
            })?;

    let pk = VerifyingKey::from_bytes(pk).map_err(|_| CryptoError::InvalidPublicKey)?;
    let sig = Signature::from_bytes(sig);
    pk.verify_strict(message, &sig)?;
    Ok(())
}
