//! Key derivation functions for SigilVM

use crate::error::{EnclaveError, EnclaveResult};

use alloc::vec::Vec;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// HKDF-SHA256 Extract
///
/// Extracts a pseudorandom key from input key material.
pub fn hkdf_extract(salt: &[u8], ikm: &[u8]) -> [u8; 32] {
    let salt = if salt.is_empty() {
        &[0u8; 32]
    } else {
        salt
    };

    let mut mac = HmacSha256::new_from_slice(salt)
        .expect("HMAC key length is valid");
    mac.update(ikm);

    mac.finalize().into_bytes().into()
}

/// HKDF-SHA256 Expand
///
/// Expands a pseudorandom key to the desired length.
pub fn hkdf_expand(prk: &[u8; 32], info: &[u8], length: usize) -> EnclaveResult<Vec<u8>> {
    if length > 255 * 32 {
        return Err(EnclaveError::SealFail);
    }

    let n = (length + 31) / 32;
    let mut output = Vec::with_capacity(length);
    let mut t = Vec::new();

    for i in 1..=n {
        let mut mac = HmacSha256::new_from_slice(prk)
            .expect("HMAC key length is valid");
        mac.update(&t);
        mac.update(info);
        mac.update(&[i as u8]);

        t = mac.finalize().into_bytes().to_vec();
        output.extend_from_slice(&t);
    }

    output.truncate(length);
    Ok(output)
}

/// HKDF-SHA256 (combined Extract + Expand)
///
/// # Arguments
/// * `salt` - Optional salt (can be empty)
/// * `ikm` - Input key material
/// * `info` - Context-specific info
/// * `length` - Desired output length
pub fn hkdf(salt: &[u8], ikm: &[u8], info: &[u8], length: usize) -> EnclaveResult<Vec<u8>> {
    let prk = hkdf_extract(salt, ikm);
    hkdf_expand(&prk, info, length)
}
