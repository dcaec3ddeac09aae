//! Execution proof generation and verification
//!
//! A proof binds an execution hash to the enclave's long-term ECDSA-P256
//! key together with freshness material. The nonce and timestamp are under
//! the signature, so an execution hash cannot be replayed into a different
//! context.

use crate::crypto::{p256_public_key_bytes, p256_sign, p256_verify, random_nonce, secure_compare};
use crate::error::EnclaveResult;
use crate::host::Host;
use crate::types::{ExecutionProof, HASH_SIZE, PUBKEY_SIZE};

use p256::ecdsa::SigningKey;

/// Signs and verifies execution proofs under the enclave's long-term key.
///
/// The signing key is owned here and never copied out of the trust
/// boundary unsealed; `p256::ecdsa::SigningKey` zeroizes on drop.
pub struct ProofEngine {
    signing_key: SigningKey,
    public_key: [u8; PUBKEY_SIZE],
}

impl ProofEngine {
    /// Wrap an unsealed signing key
    pub fn new(signing_key: SigningKey) -> Self {
        let public_key = p256_public_key_bytes(&signing_key);
        Self {
            signing_key,
            public_key,
        }
    }

    /// The signer's untagged public key
    pub fn public_key(&self) -> &[u8; PUBKEY_SIZE] {
        &self.public_key
    }

    /// Generate a proof for an execution hash.
    ///
    /// Draws a fresh 16-byte nonce and takes the current wall clock from
    /// the host, then signs `exec_hash || LE64(ts) || nonce || pubkey`.
    pub fn generate(
        &self,
        exec_hash: &[u8; HASH_SIZE],
        host: &dyn Host,
    ) -> EnclaveResult<ExecutionProof> {
        let mut proof = ExecutionProof {
            exec_hash: *exec_hash,
            timestamp_ms: host.timestamp_ms(),
            nonce: random_nonce()?,
            public_key: self.public_key,
            signature: [0u8; 64],
        };

        proof.signature = p256_sign(&self.signing_key, &proof.signed_bytes())?;
        Ok(proof)
    }

    /// Verify a proof against an expected execution hash.
    ///
    /// The hash comparison is constant-time; the signature is checked
    /// under the proof's embedded public key. Binding that key to a
    /// trusted measurement is the remote verifier's job.
    pub fn verify(proof: &ExecutionProof, expected_exec_hash: &[u8; HASH_SIZE]) -> bool {
        let hash_ok = secure_compare(&proof.exec_hash, expected_exec_hash);
        let sig_ok = p256_verify(&proof.public_key, &proof.signed_bytes(), &proof.signature);
        hash_ok & sig_ok
    }
}
