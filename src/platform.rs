//! Trusted-execution platform interface
//!
//! The measurement, the sealing-key derivation, and the attestation report
//! are platform primitives. They sit behind a trait so the enclave core is
//! testable on a plain host with deterministic stubs; a production build
//! plugs in the real TEE bindings.

use crate::crypto::sha256;
use crate::error::EnclaveResult;

use alloc::vec::Vec;

/// Opaque trusted-execution platform primitives.
pub trait Platform {
    /// The 32-byte identity of the loaded trusted module.
    fn measurement(&self) -> [u8; 32];

    /// Derive the 16-byte root sealing key bound to this module's identity.
    fn sealing_key(&self) -> EnclaveResult<[u8; 16]>;

    /// Produce an attestation report embedding 64 bytes of user data.
    ///
    /// The report layout is platform-defined and treated as an opaque
    /// token; transporting it to a remote verifier is the host's business.
    fn create_report(&self, user_data: &[u8; 64]) -> EnclaveResult<Vec<u8>>;
}

/// Deterministic platform stub for development and tests.
///
/// Identity and keys are derived from a caller-chosen tag, so two stubs
/// built from the same tag behave as the same "enclave" and two different
/// tags behave as different ones.
pub struct SimulatedPlatform {
    measurement: [u8; 32],
    root_key: [u8; 16],
}

impl SimulatedPlatform {
    /// Stub with the default identity tag
    pub fn new() -> Self {
        Self::with_identity(b"sigilvm simulated enclave")
    }

    /// Stub whose identity is derived from `tag`
    pub fn with_identity(tag: &[u8]) -> Self {
        let measurement = sha256(tag);

        let seed = crate::crypto::hash_concat(&[&measurement, b"sealing root"]);
        let mut root_key = [0u8; 16];
        root_key.copy_from_slice(&seed[..16]);

        Self {
            measurement,
            root_key,
        }
    }
}

impl Default for SimulatedPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for SimulatedPlatform {
    fn measurement(&self) -> [u8; 32] {
        self.measurement
    }

    fn sealing_key(&self) -> EnclaveResult<[u8; 16]> {
        Ok(self.root_key)
    }

    fn create_report(&self, user_data: &[u8; 64]) -> EnclaveResult<Vec<u8>> {
        // Simulated report: version header, measurement, then user data.
        let mut report = Vec::with_capacity(2 + 2 + 32 + 64);
        report.extend_from_slice(&[1u8, 0]); // version
        report.extend_from_slice(&[0u8, 0]); // flags
        report.extend_from_slice(&self.measurement);
        report.extend_from_slice(user_data);
        Ok(report)
    }
}
