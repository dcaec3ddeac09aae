//! Digital signature primitives for SigilVM
//!
//! ECDSA over NIST P-256. Public keys travel as the untagged SEC1 point
//! `x || y` (64 bytes); signatures as IEEE P1363 fixed-width `r || s`
//! (64 bytes).

use crate::error::{EnclaveError, EnclaveResult};
use crate::types::{PUBKEY_SIZE, SIGNATURE_SIZE};

use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::elliptic_curve::generic_array::GenericArray;
use p256::EncodedPoint;

/// Build a P-256 signing key from a 32-byte secret scalar
///
/// # Errors
/// * `KeyGen` if the scalar is zero or not below the curve order
pub fn p256_key_from_seed(seed: &[u8]) -> EnclaveResult<SigningKey> {
    if seed.len() < 32 {
        return Err(EnclaveError::KeyGen);
    }

    SigningKey::from_slice(&seed[..32]).map_err(|_| EnclaveError::KeyGen)
}

/// Export the untagged public point for a signing key
pub fn p256_public_key_bytes(key: &SigningKey) -> [u8; PUBKEY_SIZE] {
    let point = key.verifying_key().to_encoded_point(false);
    let bytes = point.as_bytes();

    // Uncompressed SEC1 is 0x04 || x || y; drop the tag.
    let mut out = [0u8; PUBKEY_SIZE];
    out.copy_from_slice(&bytes[1..65]);
    out
}

/// Sign a message, returning a fixed-width `r || s` signature
///
/// The message is digested with SHA-256 before signing.
pub fn p256_sign(key: &SigningKey, message: &[u8]) -> EnclaveResult<[u8; SIGNATURE_SIZE]> {
    let signature: Signature = key.try_sign(message).map_err(|_| EnclaveError::Sign)?;
    let bytes = signature.to_bytes();

    let mut out = [0u8; SIGNATURE_SIZE];
    out.copy_from_slice(bytes.as_slice());
    Ok(out)
}

/// Verify a fixed-width signature under an untagged public key
///
/// Returns `false` for any malformed key or signature rather than erroring:
/// a proof carrying garbage bytes is simply not valid.
pub fn p256_verify(
    public_key: &[u8; PUBKEY_SIZE],
    message: &[u8],
    signature: &[u8; SIGNATURE_SIZE],
) -> bool {
    let point = EncodedPoint::from_untagged_bytes(GenericArray::from_slice(public_key));
    let verifying_key = match VerifyingKey::from_encoded_point(&point) {
        Ok(key) => key,
        Err(_) => return false,
    };

    let signature = match Signature::from_slice(signature) {
        Ok(sig) => sig,
        Err(_) => return false,
    };

    verifying_key.verify(message, &signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::random_bytes;

    fn test_key() -> SigningKey {
        let seed = random_bytes(32).unwrap();
        p256_key_from_seed(&seed).unwrap()
    }

    #[test]
    fn test_sign_verify() {
        let key = test_key();
        let public_key = p256_public_key_bytes(&key);

        let message = b"attested execution";
        let signature = p256_sign(&key, message).unwrap();

        assert!(p256_verify(&public_key, message, &signature));
        assert!(!p256_verify(&public_key, b"different message", &signature));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let key = test_key();
        let other = p256_public_key_bytes(&test_key());

        let message = b"attested execution";
        let signature = p256_sign(&key, message).unwrap();

        assert!(!p256_verify(&other, message, &signature));
    }

    #[test]
    fn test_garbage_key_and_signature() {
        let key = test_key();
        let public_key = p256_public_key_bytes(&key);
        let signature = p256_sign(&key, b"msg").unwrap();

        // Not a curve point
        assert!(!p256_verify(&[0xFFu8; 64], b"msg", &signature));
        // All-zero r and s are invalid scalars
        assert!(!p256_verify(&public_key, b"msg", &[0u8; 64]));
    }

    #[test]
    fn test_zero_seed_rejected() {
        assert!(p256_key_from_seed(&[0u8; 32]).is_err());
        assert!(p256_key_from_seed(&[1u8; 16]).is_err());
    }

    #[test]
    fn test_public_key_is_deterministic() {
        let seed = random_bytes(32).unwrap();
        let a = p256_public_key_bytes(&p256_key_from_seed(&seed).unwrap());
        let b = p256_public_key_bytes(&p256_key_from_seed(&seed).unwrap());
        assert_eq!(a, b);
    }
}
