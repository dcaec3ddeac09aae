//! Host-facing trust-boundary surface
//!
//! [`Session`] mirrors the enclave call table: an explicit init/teardown
//! lifecycle around the verifier, byte-oriented arguments, and one stable
//! status code per failure (see [`EnclaveError::code`]). Inputs are
//! contiguous byte ranges copied in at entry; `*_into` variants copy out
//! into caller buffers and size them via `BufferTooSmall`.
//!
//! Detailed validator and runtime causes do not cross this surface; they
//! are preserved on the audit stream and collapse to their family code
//! here.

use crate::config::EnclaveConfig;
use crate::error::{EnclaveError, EnclaveResult};
use crate::host::Host;
use crate::platform::Platform;
use crate::types::{ExecutionProof, ExecutionState, StateOp, HASH_SIZE, PROOF_SIZE};
use crate::{Fault, SigilVm};

use alloc::boxed::Box;
use alloc::vec::Vec;

/// Reply to a boundary `execute` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteReply {
    /// Contract result bytes
    pub result: Vec<u8>,
    /// Execution hash of the completed run
    pub exec_hash: [u8; HASH_SIZE],
    /// Gas consumed
    pub gas_used: u64,
}

/// The enclave call surface with an explicit lifecycle.
///
/// Every call before `init` fails with `NotInitialized`. The host is
/// responsible for serializing calls; nothing here suspends or yields.
pub struct Session {
    vm: Option<SigilVm>,
}

impl Session {
    /// An uninitialized session
    pub const fn new() -> Self {
        Self { vm: None }
    }

    /// True once `init` has succeeded
    pub fn is_initialized(&self) -> bool {
        self.vm.is_some()
    }

    /// Initialize the verifier.
    ///
    /// Idempotent: a second call on a live session is a no-op, reported to
    /// the host console.
    pub fn init(
        &mut self,
        config: EnclaveConfig,
        platform: Box<dyn Platform>,
        host: Box<dyn Host>,
    ) -> EnclaveResult<()> {
        if let Some(vm) = &self.vm {
            vm.host().print_string("verifier already initialized");
            return Ok(());
        }

        self.vm = Some(SigilVm::new(config, platform, host)?);
        Ok(())
    }

    /// Tear down the verifier, dropping the unsealed signing key.
    pub fn teardown(&mut self) {
        self.vm = None;
    }

    fn vm(&self) -> EnclaveResult<&SigilVm> {
        self.vm.as_ref().ok_or(EnclaveError::NotInitialized)
    }

    /// Execute a contract and return its result and execution hash.
    ///
    /// Unlike [`SigilVm::execute`], failed runs surface as errors here:
    /// `InvalidCode`, `OutOfGas`, or the collapsed `ExecutionFailed`.
    pub fn execute(
        &self,
        code: &[u8],
        input: &[u8],
        gas_limit: u64,
    ) -> EnclaveResult<ExecuteReply> {
        let outcome = self.vm()?.execute(code, input, gas_limit)?;

        match outcome.state {
            ExecutionState::Completed => Ok(ExecuteReply {
                exec_hash: outcome.exec_hash_or_nil(),
                gas_used: outcome.gas_used,
                result: outcome.output,
            }),
            ExecutionState::OutOfGas => Err(EnclaveError::OutOfGas),
            _ => Err(EnclaveError::ExecutionFailed(
                outcome.fault.unwrap_or(Fault::UnterminatedProgram),
            )),
        }
    }

    /// Execute a contract, copying the result into `result_buf`.
    ///
    /// Returns the result length and the execution hash.
    ///
    /// # Errors
    /// * `BufferTooSmall` with the required size if `result_buf` cannot
    ///   hold the result
    pub fn execute_into(
        &self,
        code: &[u8],
        input: &[u8],
        gas_limit: u64,
        result_buf: &mut [u8],
    ) -> EnclaveResult<(usize, [u8; HASH_SIZE])> {
        let reply = self.execute(code, input, gas_limit)?;

        if result_buf.len() < reply.result.len() {
            return Err(EnclaveError::BufferTooSmall {
                required: reply.result.len(),
            });
        }

        result_buf[..reply.result.len()].copy_from_slice(&reply.result);
        Ok((reply.result.len(), reply.exec_hash))
    }

    /// Execute a contract under the configured default gas limit and wrap
    /// the run in a signed proof, returned in wire layout.
    pub fn generate_proof(&self, code: &[u8], input: &[u8]) -> EnclaveResult<[u8; PROOF_SIZE]> {
        let vm = self.vm()?;
        let (_, proof) = vm.generate_proof(code, input, vm.default_gas_limit())?;
        Ok(proof.to_bytes())
    }

    /// Like [`Session::generate_proof`], copying into a caller buffer.
    pub fn generate_proof_into(
        &self,
        code: &[u8],
        input: &[u8],
        proof_buf: &mut [u8],
    ) -> EnclaveResult<usize> {
        if proof_buf.len() < PROOF_SIZE {
            return Err(EnclaveError::BufferTooSmall {
                required: PROOF_SIZE,
            });
        }

        let wire = self.generate_proof(code, input)?;
        proof_buf[..PROOF_SIZE].copy_from_slice(&wire);
        Ok(PROOF_SIZE)
    }

    /// Verify a wire-format proof against an expected execution hash.
    ///
    /// A mismatched hash or bad signature returns `Ok(false)`; only a
    /// malformed proof blob or hash length is an error.
    pub fn verify_proof(&self, proof: &[u8], exec_hash: &[u8]) -> EnclaveResult<bool> {
        let vm = self.vm()?;

        let expected: [u8; HASH_SIZE] = exec_hash
            .try_into()
            .map_err(|_| EnclaveError::InvalidParameter("execution hash length".into()))?;
        let proof = ExecutionProof::from_bytes(proof)?;

        Ok(vm.verify_proof(&proof, &expected))
    }

    /// The enclave measurement
    pub fn get_measurement(&self) -> EnclaveResult<[u8; 32]> {
        Ok(self.vm()?.measurement())
    }

    /// Produce a platform attestation report embedding 64 bytes of user
    /// data.
    pub fn create_report(&self, user_data: &[u8]) -> EnclaveResult<Vec<u8>> {
        let user_data: [u8; 64] = user_data
            .try_into()
            .map_err(|_| EnclaveError::InvalidParameter("user data must be 64 bytes".into()))?;
        self.vm()?.attestation_report(&user_data)
    }

    /// Seal a blob to the enclave identity
    pub fn seal(&self, data: &[u8]) -> EnclaveResult<Vec<u8>> {
        self.vm()?.seal(data)
    }

    /// Unseal a blob sealed by this enclave
    pub fn unseal(&self, blob: &[u8]) -> EnclaveResult<Vec<u8>> {
        self.vm()?.unseal(blob)
    }

    /// Read, write, or delete sealed persistent state
    pub fn state_update(
        &self,
        key: &str,
        op: StateOp,
        value: Option<&[u8]>,
    ) -> EnclaveResult<Option<Vec<u8>>> {
        self.vm()?.state_update(key, op, value)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
