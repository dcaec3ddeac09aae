//! Sealing of persistent state to the enclave identity
//!
//! Sealed blobs are AES-128-GCM ciphertexts under a key expanded from the
//! platform's root sealing key, with the enclave measurement as additional
//! authenticated data. Only the same trusted module can unseal. Blob
//! layout: `IV(12) || CT || TAG(16)`; unsealing fails closed on any tag
//! mismatch.

use crate::crypto::{aes128_gcm_decrypt, aes128_gcm_encrypt, hkdf, random_iv};
use crate::error::{EnclaveError, EnclaveResult};
use crate::platform::Platform;

use alloc::vec::Vec;
use zeroize::Zeroize;

/// IV length prepended to every sealed blob
pub const SEAL_IV_SIZE: usize = 12;

/// Authentication tag length appended to every sealed blob
pub const SEAL_TAG_SIZE: usize = 16;

/// Fixed sealing overhead: `IV || TAG`
pub const SEAL_OVERHEAD: usize = SEAL_IV_SIZE + SEAL_TAG_SIZE;

/// Seals and unseals blobs under the enclave's identity.
pub struct Sealer {
    key: [u8; 16],
    measurement: [u8; 32],
}

impl Sealer {
    /// Derive the sealing key from the platform.
    ///
    /// The platform's 16-byte root key is expanded through HKDF with a
    /// sealing label, so the AEAD key is distinct from any other use of
    /// the root key.
    pub fn new(platform: &dyn Platform) -> EnclaveResult<Self> {
        let mut root = platform.sealing_key()?;
        let expanded = hkdf(&[], &root, b"sigilvm seal key v1", 16)?;
        root.zeroize();

        let mut key = [0u8; 16];
        key.copy_from_slice(&expanded);

        Ok(Self {
            key,
            measurement: platform.measurement(),
        })
    }

    /// Seal a blob: `IV || CT || TAG` with the measurement as AAD.
    pub fn seal(&self, plaintext: &[u8]) -> EnclaveResult<Vec<u8>> {
        let iv = random_iv()?;
        let ciphertext = aes128_gcm_encrypt(&self.key, &iv, plaintext, &self.measurement)?;

        let mut blob = Vec::with_capacity(SEAL_IV_SIZE + ciphertext.len());
        blob.extend_from_slice(&iv);
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    /// Unseal a blob previously produced by [`Sealer::seal`].
    ///
    /// # Errors
    /// * `UnsealFormat` - blob too short to carry an IV and tag
    /// * `UnsealAuthFail` - authentication failed (tampered, truncated, or
    ///   sealed by a different enclave identity)
    pub fn unseal(&self, blob: &[u8]) -> EnclaveResult<Vec<u8>> {
        if blob.len() < SEAL_OVERHEAD {
            return Err(EnclaveError::UnsealFormat);
        }

        let mut iv = [0u8; SEAL_IV_SIZE];
        iv.copy_from_slice(&blob[..SEAL_IV_SIZE]);

        aes128_gcm_decrypt(&self.key, &iv, &blob[SEAL_IV_SIZE..], &self.measurement)
            .map_err(|_| EnclaveError::UnsealAuthFail)
    }

    /// The measurement this sealer authenticates against
    pub fn measurement(&self) -> [u8; 32] {
        self.measurement
    }
}

impl Drop for Sealer {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::random_bytes;
    use crate::platform::SimulatedPlatform;

    fn sealer() -> Sealer {
        Sealer::new(&SimulatedPlatform::new()).unwrap()
    }

    #[test]
    fn test_seal_unseal_roundtrip() {
        let sealer = sealer();
        let data = random_bytes(64).unwrap();

        let blob = sealer.seal(&data).unwrap();
        assert_eq!(blob.len(), data.len() + SEAL_OVERHEAD);

        let unsealed = sealer.unseal(&blob).unwrap();
        assert_eq!(unsealed, data);
    }

    #[test]
    fn test_empty_blob_roundtrip() {
        let sealer = sealer();
        let blob = sealer.seal(b"").unwrap();
        assert_eq!(blob.len(), SEAL_OVERHEAD);
        assert!(sealer.unseal(&blob).unwrap().is_empty());
    }

    #[test]
    fn test_tag_tamper_detected() {
        let sealer = sealer();
        let mut blob = sealer.seal(&random_bytes(64).unwrap()).unwrap();

        let last = blob.len() - 1;
        blob[last] ^= 0x01;

        assert_eq!(sealer.unseal(&blob), Err(EnclaveError::UnsealAuthFail));
    }

    #[test]
    fn test_every_byte_flip_detected() {
        let sealer = sealer();
        let blob = sealer.seal(b"short secret").unwrap();

        for i in 0..blob.len() {
            let mut tampered = blob.clone();
            tampered[i] ^= 0x80;
            assert_eq!(
                sealer.unseal(&tampered),
                Err(EnclaveError::UnsealAuthFail),
                "flip at byte {i} went undetected"
            );
        }
    }

    #[test]
    fn test_truncation_detected() {
        let sealer = sealer();
        let blob = sealer.seal(b"some data").unwrap();

        let mut truncated = blob.clone();
        truncated.pop();
        assert_eq!(sealer.unseal(&truncated), Err(EnclaveError::UnsealAuthFail));

        assert_eq!(
            sealer.unseal(&blob[..SEAL_OVERHEAD - 1]),
            Err(EnclaveError::UnsealFormat)
        );
    }

    #[test]
    fn test_foreign_enclave_cannot_unseal() {
        let ours = Sealer::new(&SimulatedPlatform::with_identity(b"ours")).unwrap();
        let theirs = Sealer::new(&SimulatedPlatform::with_identity(b"theirs")).unwrap();

        let blob = ours.seal(b"bound to our identity").unwrap();
        assert_eq!(theirs.unseal(&blob), Err(EnclaveError::UnsealAuthFail));
    }

    #[test]
    fn test_fresh_iv_per_seal() {
        let sealer = sealer();
        let a = sealer.seal(b"same plaintext").unwrap();
        let b = sealer.seal(b"same plaintext").unwrap();
        assert_ne!(a, b);
    }
}
