//! Core types for SigilVM
//!
//! Defines the public records and limits shared across the enclave.

use crate::error::{EnclaveError, EnclaveResult, Fault};

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Maximum contract bytecode size (1 MiB)
pub const MAX_CONTRACT_SIZE: usize = 1024 * 1024;

/// Maximum contract input size (64 KiB)
pub const MAX_INPUT_SIZE: usize = 64 * 1024;

/// Maximum contract result size (64 KiB)
pub const MAX_RESULT_SIZE: usize = 64 * 1024;

/// Maximum persistent-state key length
pub const MAX_STATE_KEY_SIZE: usize = 256;

/// Maximum persistent-state value length (4 KiB)
pub const MAX_STATE_VALUE_SIZE: usize = 4 * 1024;

/// Operand stack capacity in 64-bit words
pub const STACK_CAPACITY: usize = 256;

/// Scratch memory size in bytes
pub const MEMORY_SIZE: usize = 4096;

/// Size of a SHA-256 digest
pub const HASH_SIZE: usize = 32;

/// Size of a proof freshness nonce
pub const NONCE_SIZE: usize = 16;

/// Size of an untagged P-256 public key (`x || y`)
pub const PUBKEY_SIZE: usize = 64;

/// Size of a fixed-width P-256 signature (`r || s`)
pub const SIGNATURE_SIZE: usize = 64;

/// Wire size of an execution proof
pub const PROOF_SIZE: usize = HASH_SIZE + 8 + NONCE_SIZE + PUBKEY_SIZE + SIGNATURE_SIZE;

/// Default per-execution gas limit
pub const DEFAULT_GAS_LIMIT: u64 = 1_000_000;

/// Terminal and intermediate states of one contract execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionState {
    /// Context created, not yet stepped
    Init,
    /// Stepping through instructions
    Running,
    /// Reached `HALT`
    Completed,
    /// Stopped on a runtime fault
    Error,
    /// Stopped because the next instruction could not be paid for
    OutOfGas,
}

impl ExecutionState {
    /// True for states in which the VM will take no further steps
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error | Self::OutOfGas)
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::OutOfGas => "out-of-gas",
        };
        write!(f, "{name}")
    }
}

/// The result of one `execute` call.
///
/// Runtime faults and gas exhaustion are reported here rather than as
/// errors: the host always receives the gas spent and the terminal state.
/// `exec_hash` is present only for completed runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Contract output (top-of-stack at `HALT`, little-endian; empty on
    /// failure or an empty stack)
    pub output: Vec<u8>,
    /// Gas consumed, including the charge for a faulting instruction
    pub gas_used: u64,
    /// Terminal state of the run
    pub state: ExecutionState,
    /// Deterministic execution hash, completed runs only
    pub exec_hash: Option<[u8; HASH_SIZE]>,
    /// The fault that stopped the run, if any
    pub fault: Option<Fault>,
}

impl ExecutionOutcome {
    /// True if the run reached `HALT`
    pub fn is_completed(&self) -> bool {
        self.state == ExecutionState::Completed
    }

    /// The execution hash, or the all-zero nil hash for failed runs
    pub fn exec_hash_or_nil(&self) -> [u8; HASH_SIZE] {
        self.exec_hash.unwrap_or([0u8; HASH_SIZE])
    }
}

/// A signed execution proof.
///
/// Binds an execution hash to the enclave's long-term key together with
/// freshness material. The signature covers
/// `exec_hash || LE64(timestamp_ms) || nonce || public_key`.
#[derive(Clone, PartialEq, Eq)]
pub struct ExecutionProof {
    /// Execution hash of the attested run
    pub exec_hash: [u8; HASH_SIZE],
    /// Milliseconds since the Unix epoch, as reported by the host
    pub timestamp_ms: u64,
    /// Fresh random nonce
    pub nonce: [u8; NONCE_SIZE],
    /// Signer's untagged P-256 public key
    pub public_key: [u8; PUBKEY_SIZE],
    /// Fixed-width ECDSA signature
    pub signature: [u8; SIGNATURE_SIZE],
}

impl ExecutionProof {
    /// The byte range covered by the signature.
    pub fn signed_bytes(&self) -> [u8; PROOF_SIZE - SIGNATURE_SIZE] {
        let mut out = [0u8; PROOF_SIZE - SIGNATURE_SIZE];
        out[..32].copy_from_slice(&self.exec_hash);
        out[32..40].copy_from_slice(&self.timestamp_ms.to_le_bytes());
        out[40..56].copy_from_slice(&self.nonce);
        out[56..120].copy_from_slice(&self.public_key);
        out
    }

    /// Serialize to the fixed 184-byte wire layout.
    pub fn to_bytes(&self) -> [u8; PROOF_SIZE] {
        let mut out = [0u8; PROOF_SIZE];
        out[..120].copy_from_slice(&self.signed_bytes());
        out[120..].copy_from_slice(&self.signature);
        out
    }

    /// Parse from the fixed wire layout.
    ///
    /// # Errors
    /// * `BadProofFormat` if `bytes` is not exactly [`PROOF_SIZE`] long
    pub fn from_bytes(bytes: &[u8]) -> EnclaveResult<Self> {
        if bytes.len() != PROOF_SIZE {
            return Err(EnclaveError::BadProofFormat);
        }

        let mut proof = Self {
            exec_hash: [0u8; HASH_SIZE],
            timestamp_ms: 0,
            nonce: [0u8; NONCE_SIZE],
            public_key: [0u8; PUBKEY_SIZE],
            signature: [0u8; SIGNATURE_SIZE],
        };
        proof.exec_hash.copy_from_slice(&bytes[..32]);
        let mut ts = [0u8; 8];
        ts.copy_from_slice(&bytes[32..40]);
        proof.timestamp_ms = u64::from_le_bytes(ts);
        proof.nonce.copy_from_slice(&bytes[40..56]);
        proof.public_key.copy_from_slice(&bytes[56..120]);
        proof.signature.copy_from_slice(&bytes[120..]);
        Ok(proof)
    }

    /// Hex-encoded execution hash
    pub fn exec_hash_hex(&self) -> String {
        hex::encode(self.exec_hash)
    }
}

impl fmt::Debug for ExecutionProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionProof")
            .field("exec_hash", &self.exec_hash_hex())
            .field("timestamp_ms", &self.timestamp_ms)
            .field("nonce", &hex::encode(self.nonce))
            .field("public_key", &hex::encode(&self.public_key[..8]))
            .finish()
    }
}

/// Audit log severity, matching the host-side audit stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum AuditLevel {
    /// Diagnostic detail
    Debug = 0,
    /// Normal operation
    Info = 1,
    /// Recoverable anomaly
    Warn = 2,
    /// Operation failed
    Error = 3,
    /// Trust-boundary integrity at risk
    Critical = 4,
}

impl AuditLevel {
    /// Numeric level as carried by the outcall
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Parse a numeric level
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Debug),
            1 => Some(Self::Info),
            2 => Some(Self::Warn),
            3 => Some(Self::Error),
            4 => Some(Self::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for AuditLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        };
        write!(f, "{name}")
    }
}

/// Operation selector for the persistent-state boundary call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateOp {
    /// Read and unseal the value under a key
    Read,
    /// Seal and write a value under a key
    Write,
    /// Delete the blob under a key
    Delete,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_proof() -> ExecutionProof {
        ExecutionProof {
            exec_hash: [0x11; HASH_SIZE],
            timestamp_ms: 0x0102_0304_0506_0708,
            nonce: [0x22; NONCE_SIZE],
            public_key: [0x33; PUBKEY_SIZE],
            signature: [0x44; SIGNATURE_SIZE],
        }
    }

    #[test]
    fn test_proof_wire_roundtrip() {
        let proof = sample_proof();
        let bytes = proof.to_bytes();
        assert_eq!(bytes.len(), PROOF_SIZE);

        let parsed = ExecutionProof::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, proof);
    }

    #[test]
    fn test_proof_timestamp_is_little_endian() {
        let bytes = sample_proof().to_bytes();
        assert_eq!(bytes[32], 0x08);
        assert_eq!(bytes[39], 0x01);
    }

    #[test]
    fn test_proof_wrong_length_rejected() {
        let bytes = sample_proof().to_bytes();
        assert_eq!(
            ExecutionProof::from_bytes(&bytes[..PROOF_SIZE - 1]),
            Err(EnclaveError::BadProofFormat)
        );
        let mut longer = bytes.to_vec();
        longer.push(0);
        assert_eq!(
            ExecutionProof::from_bytes(&longer),
            Err(EnclaveError::BadProofFormat)
        );
    }

    #[test]
    fn test_signed_bytes_excludes_signature() {
        let proof = sample_proof();
        let signed = proof.signed_bytes();
        assert_eq!(signed.len(), 120);
        assert_eq!(&proof.to_bytes()[..120], &signed[..]);
    }

    #[test]
    fn test_audit_level_roundtrip() {
        for level in [
            AuditLevel::Debug,
            AuditLevel::Info,
            AuditLevel::Warn,
            AuditLevel::Error,
            AuditLevel::Critical,
        ] {
            assert_eq!(AuditLevel::from_u8(level.as_u8()), Some(level));
        }
        assert_eq!(AuditLevel::from_u8(9), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(ExecutionState::Completed.is_terminal());
        assert!(ExecutionState::OutOfGas.is_terminal());
        assert!(!ExecutionState::Running.is_terminal());
    }
}
