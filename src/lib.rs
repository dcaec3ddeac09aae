//! # SigilVM
//!
//! Attested smart-contract bytecode execution inside a trust boundary.
//!
//! SigilVM runs small contract programs in a hardware-isolated context the
//! host can neither observe nor tamper with, and emits a signed *execution
//! proof* binding `(contract, input, result, gas)` to the enclave identity.
//!
//! ## Architecture
//!
//! 1. **Virtual machine** - a compact stack machine over 64-bit words
//!    - Static bytecode validation with a precomputed jump-target set
//!    - Per-opcode gas metering with pre-charge semantics
//!    - Deterministic execution and a SHA-256 execution hash
//!
//! 2. **Proof engine** - ECDSA-P256 over the execution hash
//!    - Fresh nonce and host timestamp under the signature
//!    - Constant-time hash comparison on verification
//!
//! 3. **Sealing layer** - persistent state bound to the enclave identity
//!    - AES-128-GCM with a key expanded from the platform sealing key
//!    - Measurement as additional authenticated data
//!
//! ## Security Model
//!
//! - The signing key never leaves the trust boundary unsealed
//! - Host storage only ever sees sealed blobs
//! - Every execution is recorded on the audit-log outcall stream
//! - The TEE primitives sit behind the [`Platform`] trait, so the core is
//!   testable on a plain host with deterministic stubs
//!
//! ## Example
//!
//! ```rust
//! use sigilvm::{EnclaveConfig, MemoryHost, SigilVm, SimulatedPlatform};
//!
//! let vm = SigilVm::new(
//!     EnclaveConfig::default(),
//!     Box::new(SimulatedPlatform::new()),
//!     Box::new(MemoryHost::new()),
//! )
//! .unwrap();
//!
//! // PUSH 10, PUSH 20, ADD, HALT
//! let code = [
//!     0x01, 10, 0, 0, 0, 0, 0, 0, 0,
//!     0x01, 20, 0, 0, 0, 0, 0, 0, 0,
//!     0x03, 0xFF,
//! ];
//!
//! let (outcome, proof) = vm.generate_proof(&code, &[], 1_000_000).unwrap();
//! assert_eq!(outcome.output, 30u64.to_le_bytes());
//! assert!(vm.verify_proof(&proof, &outcome.exec_hash.unwrap()));
//! ```
//!
//! ## Feature Flags
//!
//! - `std` - Standard library support (default); enables the OS RNG, the
//!   reference [`MemoryHost`], and `tracing` log forwarding

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

extern crate alloc;

pub mod boundary;
pub mod config;
pub mod crypto;
pub mod error;
pub mod host;
pub mod keystore;
pub mod platform;
pub mod proof;
pub mod sealing;
pub mod types;
pub mod vm;

pub use config::{EnclaveConfig, KeyRecoveryPolicy, KeystoreConfig, VmConfig};
pub use error::{EnclaveError, EnclaveResult, Fault, ValidateError};
pub use host::Host;
#[cfg(feature = "std")]
pub use host::MemoryHost;
pub use platform::{Platform, SimulatedPlatform};
pub use types::*;

use crate::keystore::Keystore;
use crate::proof::ProofEngine;
use crate::sealing::Sealer;

use alloc::boxed::Box;
use alloc::format;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU64, Ordering};

/// Build-info string bound into the verifier identity hash
const VERIFIER_INFO: &str = "SigilVM attested contract verifier v1";

/// The verifier singleton: owns the unsealed signing key, the sealing key,
/// and the execution counter for the lifetime of the enclave.
///
/// One `execute` call occupies the verifier exclusively; the host
/// serializes calls. The VM state itself is per-call and never reused.
pub struct SigilVm {
    /// Enclave configuration
    config: EnclaveConfig,

    /// Trusted-execution platform primitives
    platform: Box<dyn Platform>,

    /// Outcalls to the untrusted host
    host: Box<dyn Host>,

    /// Sealing layer bound to this enclave's identity
    sealer: Sealer,

    /// Proof engine holding the long-term signing key
    engine: ProofEngine,

    /// Keystore lifecycle manager
    keystore: Keystore,

    /// Cached enclave measurement
    measurement: [u8; 32],

    /// Identity hash of this verifier build
    verifier_hash: [u8; 32],

    /// Total executions, completed or failed, in invocation order
    execution_counter: AtomicU64,
}

impl SigilVm {
    /// Initialize the verifier.
    ///
    /// Unseals the persisted signing key (or generates and seals a fresh
    /// one on first boot) and derives the enclave measurement.
    ///
    /// # Errors
    /// * `KeyGen` is fatal: the verifier stays uninitialized
    /// * `UnsealAuthFail` on a tampered keystore under the `Refuse` policy
    pub fn new(
        config: EnclaveConfig,
        platform: Box<dyn Platform>,
        host: Box<dyn Host>,
    ) -> EnclaveResult<Self> {
        config.validate().map_err(EnclaveError::InvalidParameter)?;
        crypto::init()?;

        let sealer = Sealer::new(platform.as_ref())?;
        let keystore = Keystore::new(config.keystore.clone());
        let signing_key = keystore.load_or_generate(&sealer, host.as_ref())?;
        let engine = ProofEngine::new(signing_key);

        let measurement = platform.measurement();
        let verifier_hash = crypto::sha256(VERIFIER_INFO.as_bytes());

        host.audit_log(AuditLevel::Info, "verifier initialized", Some(&measurement));

        Ok(Self {
            config,
            platform,
            host,
            sealer,
            engine,
            keystore,
            measurement,
            verifier_hash,
            execution_counter: AtomicU64::new(0),
        })
    }

    /// Validate and execute a contract.
    ///
    /// Runtime faults and gas exhaustion are reported in the outcome, not
    /// as errors; structural validation failures are. Either way the
    /// execution counter advances and the audit stream records the run.
    pub fn execute(
        &self,
        code: &[u8],
        input: &[u8],
        gas_limit: u64,
    ) -> EnclaveResult<ExecutionOutcome> {
        self.check_execute_params(code, input)?;

        let code_hash = crypto::sha256(code);
        self.host
            .audit_log(AuditLevel::Info, "contract execution started", Some(&code_hash));

        let outcome = match vm::execute(code, input, gas_limit) {
            Ok(outcome) => outcome,
            Err(cause) => {
                self.execution_counter.fetch_add(1, Ordering::SeqCst);
                self.host.audit_log(
                    AuditLevel::Error,
                    &format!("contract rejected: {cause}"),
                    Some(&code_hash),
                );
                return Err(EnclaveError::InvalidCode(cause));
            }
        };

        self.execution_counter.fetch_add(1, Ordering::SeqCst);
        match outcome.state {
            ExecutionState::Completed => {
                self.host.audit_log(
                    AuditLevel::Info,
                    "contract execution completed",
                    Some(&outcome.output),
                );
            }
            ExecutionState::OutOfGas => {
                self.host.audit_log(
                    AuditLevel::Warn,
                    "contract execution ran out of gas",
                    Some(&code_hash),
                );
            }
            _ => {
                if let Some(fault) = outcome.fault {
                    self.host.audit_log(
                        AuditLevel::Error,
                        &format!("contract execution failed: {fault}"),
                        Some(&code_hash),
                    );
                }
            }
        }

        Ok(outcome)
    }

    /// Execute a contract and wrap its execution hash in a signed proof.
    ///
    /// Only completed runs are attested; a failed run surfaces the gas or
    /// fault error instead.
    pub fn generate_proof(
        &self,
        code: &[u8],
        input: &[u8],
        gas_limit: u64,
    ) -> EnclaveResult<(ExecutionOutcome, ExecutionProof)> {
        let outcome = self.execute(code, input, gas_limit)?;

        let exec_hash = match (outcome.state, outcome.exec_hash) {
            (ExecutionState::Completed, Some(hash)) => hash,
            (ExecutionState::OutOfGas, _) => return Err(EnclaveError::OutOfGas),
            _ => {
                let fault = outcome.fault.unwrap_or(Fault::UnterminatedProgram);
                return Err(EnclaveError::ExecutionFailed(fault));
            }
        };

        let proof = self.engine.generate(&exec_hash, self.host.as_ref())?;
        self.host.audit_log(
            AuditLevel::Info,
            "execution proof generated",
            Some(&proof.exec_hash),
        );

        Ok((outcome, proof))
    }

    /// Verify a proof against an expected execution hash.
    pub fn verify_proof(&self, proof: &ExecutionProof, expected_exec_hash: &[u8; 32]) -> bool {
        ProofEngine::verify(proof, expected_exec_hash)
    }

    /// Read or mutate sealed persistent state in host storage.
    ///
    /// Values are sealed before they leave the trust boundary and unsealed
    /// after they return, so the host only ever stores ciphertext.
    ///
    /// Returns the unsealed value for `Read` (or `None` if absent); `Write`
    /// and `Delete` return `None`.
    pub fn state_update(
        &self,
        key: &str,
        op: StateOp,
        value: Option<&[u8]>,
    ) -> EnclaveResult<Option<Vec<u8>>> {
        if key.is_empty() || key.len() > MAX_STATE_KEY_SIZE {
            return Err(EnclaveError::InvalidParameter("state key length".into()));
        }

        match op {
            StateOp::Read => match self.host.storage_read(key) {
                Some(blob) => Ok(Some(self.sealer.unseal(&blob)?)),
                None => Ok(None),
            },
            StateOp::Write => {
                let value = value.ok_or_else(|| {
                    EnclaveError::InvalidParameter("state write requires a value".into())
                })?;
                if value.len() > MAX_STATE_VALUE_SIZE {
                    return Err(EnclaveError::InvalidParameter("state value length".into()));
                }

                let blob = self.sealer.seal(value)?;
                if !self.host.storage_write(key, &blob) {
                    return Err(EnclaveError::Platform("host storage write failed".into()));
                }
                Ok(None)
            }
            StateOp::Delete => {
                self.host.storage_delete(key);
                Ok(None)
            }
        }
    }

    /// Seal a blob to this enclave's identity
    pub fn seal(&self, data: &[u8]) -> EnclaveResult<Vec<u8>> {
        self.sealer.seal(data)
    }

    /// Unseal a blob previously sealed by this enclave
    pub fn unseal(&self, blob: &[u8]) -> EnclaveResult<Vec<u8>> {
        self.sealer.unseal(blob)
    }

    /// Produce a platform attestation report embedding `user_data`
    pub fn attestation_report(&self, user_data: &[u8; 64]) -> EnclaveResult<Vec<u8>> {
        self.platform.create_report(user_data)
    }

    /// Generate a fresh signing keypair and reseal the keystore.
    ///
    /// Proofs generated before rotation stay verifiable; they embed the
    /// old public key.
    pub fn rotate_signing_key(&mut self) -> EnclaveResult<()> {
        let key = self.keystore.generate_and_store(&self.sealer, self.host.as_ref())?;
        self.engine = ProofEngine::new(key);
        self.host
            .audit_log(AuditLevel::Info, "signing key rotated", None);
        Ok(())
    }

    /// The enclave measurement
    pub fn measurement(&self) -> [u8; 32] {
        self.measurement
    }

    /// Identity hash of this verifier build
    pub fn verifier_hash(&self) -> [u8; 32] {
        self.verifier_hash
    }

    /// The proof-signing public key
    pub fn public_key(&self) -> &[u8; PUBKEY_SIZE] {
        self.engine.public_key()
    }

    /// Number of executions performed, completed or failed
    pub fn execution_count(&self) -> u64 {
        self.execution_counter.load(Ordering::SeqCst)
    }

    /// Gas limit applied when the caller does not supply one
    pub fn default_gas_limit(&self) -> u64 {
        self.config.vm.default_gas_limit
    }

    /// The active configuration
    pub fn config(&self) -> &EnclaveConfig {
        &self.config
    }

    pub(crate) fn host(&self) -> &dyn Host {
        self.host.as_ref()
    }

    fn check_execute_params(&self, code: &[u8], input: &[u8]) -> EnclaveResult<()> {
        if code.len() > self.config.vm.max_code_size {
            return Err(EnclaveError::InvalidCode(ValidateError::TooLarge {
                size: code.len(),
            }));
        }
        if input.len() > self.config.vm.max_input_size {
            return Err(EnclaveError::InvalidParameter(
                "input exceeds maximum size".into(),
            ));
        }
        Ok(())
    }
}
