//! Symmetric encryption for SigilVM

use crate::error::{EnclaveError, EnclaveResult};

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes128Gcm, Nonce};
use alloc::vec::Vec;

/// Encrypt data using AES-128-GCM
///
/// # Arguments
/// * `key` - 128-bit (16 byte) encryption key
/// * `iv` - 96-bit (12 byte) IV (must be unique per key)
/// * `plaintext` - Data to encrypt
/// * `aad` - Additional authenticated data (can be empty)
///
/// # Returns
/// * Ciphertext with 16-byte authentication tag appended
pub fn aes128_gcm_encrypt(
    key: &[u8; 16],
    iv: &[u8; 12],
    plaintext: &[u8],
    aad: &[u8],
) -> EnclaveResult<Vec<u8>> {
    let cipher = Aes128Gcm::new_from_slice(key)
        .map_err(|_| EnclaveError::SealFail)?;

    let nonce = Nonce::from_slice(iv);

    cipher
        .encrypt(nonce, Payload {
            msg: plaintext,
            aad,
        })
        .map_err(|_| EnclaveError::SealFail)
}

/// Decrypt data using AES-128-GCM
///
/// # Arguments
/// * `key` - 128-bit (16 byte) encryption key
/// * `iv` - 96-bit (12 byte) IV used during encryption
/// * `ciphertext` - Encrypted data with tag appended
/// * `aad` - Additional authenticated data (must match encryption)
///
/// # Returns
/// * Decrypted plaintext; `UnsealAuthFail` on any tag mismatch
pub fn aes128_gcm_decrypt(
    key: &[u8; 16],
    iv: &[u8; 12],
    ciphertext: &[u8],
    aad: &[u8],
) -> EnclaveResult<Vec<u8>> {
    let cipher = Aes128Gcm::new_from_slice(key)
        .map_err(|_| EnclaveError::UnsealAuthFail)?;

    let nonce = Nonce::from_slice(iv);

    cipher
        .decrypt(nonce, Payload {
            msg: ciphertext,
            aad,
        })
        .map_err(|_| EnclaveError::UnsealAuthFail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{random_bytes, random_iv};

    fn random_key() -> [u8; 16] {
        let bytes = random_bytes(16).unwrap();
        let mut key = [0u8; 16];
        key.copy_from_slice(&bytes);
        key
    }

    #[test]
    fn test_aes128_gcm_roundtrip() {
        let key = random_key();
        let iv = random_iv().unwrap();
        let plaintext = b"enclave state blob";
        let aad = b"measurement";

        let ciphertext = aes128_gcm_encrypt(&key, &iv, plaintext, aad).unwrap();
        assert_eq!(ciphertext.len(), plaintext.len() + 16);

        let decrypted = aes128_gcm_decrypt(&key, &iv, &ciphertext, aad).unwrap();
        assert_eq!(plaintext.as_slice(), decrypted.as_slice());
    }

    #[test]
    fn test_aes128_gcm_wrong_key() {
        let key1 = random_key();
        let key2 = random_key();
        let iv = random_iv().unwrap();

        let ciphertext = aes128_gcm_encrypt(&key1, &iv, b"secret", b"").unwrap();
        let result = aes128_gcm_decrypt(&key2, &iv, &ciphertext, b"");

        assert_eq!(result, Err(EnclaveError::UnsealAuthFail));
    }

    #[test]
    fn test_aes128_gcm_wrong_aad() {
        let key = random_key();
        let iv = random_iv().unwrap();

        let ciphertext = aes128_gcm_encrypt(&key, &iv, b"secret", b"aad1").unwrap();
        let result = aes128_gcm_decrypt(&key, &iv, &ciphertext, b"aad2");

        assert!(result.is_err());
    }

    #[test]
    fn test_aes128_gcm_tamper_detection() {
        let key = random_key();
        let iv = random_iv().unwrap();

        let mut ciphertext = aes128_gcm_encrypt(&key, &iv, b"secret", b"").unwrap();
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0x01;

        assert!(aes128_gcm_decrypt(&key, &iv, &ciphertext, b"").is_err());
    }
}
