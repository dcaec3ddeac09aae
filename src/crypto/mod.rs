//! Cryptographic primitives for SigilVM
//!
//! Provides the enclave's cryptographic operations:
//! - ECDSA-P256 signing and verification (execution proofs)
//! - AES-128-GCM authenticated encryption (sealing)
//! - SHA-256 hashing (execution hashes, measurements)
//! - HKDF-SHA256 key derivation (sealing-key expansion)

use crate::error::{EnclaveError, EnclaveResult};

use alloc::vec;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, Ordering};

mod hashing;
mod kdf;
mod signing;
mod symmetric;

pub use hashing::*;
pub use kdf::*;
pub use signing::*;
pub use symmetric::*;

/// Global initialization flag
static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize the cryptographic subsystem
///
/// Must be called before any cryptographic operations.
/// Safe to call multiple times.
pub fn init() -> EnclaveResult<()> {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(()); // Already initialized
    }

    verify_primitives()?;

    Ok(())
}

/// Verify cryptographic primitives are working correctly
fn verify_primitives() -> EnclaveResult<()> {
    // Known SHA-256 vector for the empty string
    let digest = sha256(b"");
    let expected = [
        0xe3, 0xb0, 0xc4, 0x42, 0x98, 0xfc, 0x1c, 0x14, 0x9a, 0xfb, 0xf4, 0xc8, 0x99, 0x6f,
        0xb9, 0x24, 0x27, 0xae, 0x41, 0xe4, 0x64, 0x9b, 0x93, 0x4c, 0xa4, 0x95, 0x99, 0x1b,
        0x78, 0x52, 0xb8, 0x55,
    ];
    if digest != expected {
        return Err(EnclaveError::Platform("SHA-256 self-test failed".into()));
    }

    // Test CSPRNG
    let random = random_bytes(32)?;
    if random.iter().all(|&b| b == 0) {
        return Err(EnclaveError::RngFailed);
    }

    Ok(())
}

/// Generate cryptographically secure random bytes
pub fn random_bytes(len: usize) -> EnclaveResult<Vec<u8>> {
    #[cfg(feature = "std")]
    {
        use getrandom::getrandom;

        let mut bytes = vec![0u8; len];
        getrandom(&mut bytes).map_err(|_| EnclaveError::RngFailed)?;
        Ok(bytes)
    }

    #[cfg(not(feature = "std"))]
    {
        // Without std the platform must supply entropy; fail closed.
        let _ = len;
        Err(EnclaveError::RngFailed)
    }
}

/// Generate a random AES-GCM IV (12 bytes)
pub fn random_iv() -> EnclaveResult<[u8; 12]> {
    let bytes = random_bytes(12)?;
    let mut iv = [0u8; 12];
    iv.copy_from_slice(&bytes);
    Ok(iv)
}

/// Generate a random proof nonce (16 bytes)
pub fn random_nonce() -> EnclaveResult<[u8; 16]> {
    let bytes = random_bytes(16)?;
    let mut nonce = [0u8; 16];
    nonce.copy_from_slice(&bytes);
    Ok(nonce)
}

/// Secure memory comparison (constant time)
pub fn secure_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }

    result == 0
}
