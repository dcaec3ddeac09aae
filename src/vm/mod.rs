//! The contract virtual machine
//!
//! A compact stack machine over 64-bit words: single-byte opcodes, a
//! 256-word operand stack, 4 KiB of scratch memory, and per-opcode gas.
//! Programs are validated before execution; execution is deterministic,
//! and a completed run is bound to its inputs by a SHA-256 execution hash.

pub mod gas;
mod interp;
pub mod opcode;
pub mod stack;
pub mod validator;

pub use gas::GasMeter;
pub use opcode::Opcode;
pub use stack::OperandStack;
pub use validator::{validate, JumpSet};

use crate::crypto::sha256;
use crate::error::ValidateError;
use crate::types::{ExecutionOutcome, ExecutionState};

use sha2::{Digest, Sha256};

/// Validate and execute a contract program.
///
/// Runtime faults and gas exhaustion terminate the run and are reported in
/// the outcome; only structural validation failures are errors. The
/// execution hash is derived for completed runs only.
///
/// # Arguments
/// * `code` - Contract bytecode, borrowed for the duration of the call
/// * `input` - Call input; bound into the execution hash
/// * `gas_limit` - Sole bound on execution cost
pub fn execute(
    code: &[u8],
    input: &[u8],
    gas_limit: u64,
) -> Result<ExecutionOutcome, ValidateError> {
    let jumps = validator::validate(code)?;

    let mut cx = interp::ExecContext::new(code, &jumps, gas_limit);
    cx.run();

    let exec_hash = (cx.state == ExecutionState::Completed)
        .then(|| execution_hash(code, input, &cx.output, cx.gas.used()));

    Ok(ExecutionOutcome {
        output: cx.output,
        gas_used: cx.gas.used(),
        state: cx.state,
        exec_hash,
        fault: cx.fault,
    })
}

/// Derive the deterministic execution hash for a completed run:
/// `SHA256( SHA256(code) || SHA256(input) || output || LE64(gas_used) )`.
///
/// Empty input contributes the empty-string digest.
pub fn execution_hash(code: &[u8], input: &[u8], output: &[u8], gas_used: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(sha256(code));
    hasher.update(sha256(input));
    hasher.update(output);
    hasher.update(gas_used.to_le_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Fault;
    use crate::types::ExecutionState;
    use alloc::vec::Vec;

    /// PUSH 10, PUSH 20, ADD, HALT
    fn add_and_halt() -> Vec<u8> {
        let mut code = Vec::new();
        code.extend_from_slice(&[0x01, 0x0A, 0, 0, 0, 0, 0, 0, 0]);
        code.extend_from_slice(&[0x01, 0x14, 0, 0, 0, 0, 0, 0, 0]);
        code.extend_from_slice(&[0x03, 0xFF]);
        code
    }

    #[test]
    fn test_add_and_halt_scenario() {
        let outcome = execute(&add_and_halt(), &[], 1_000_000).unwrap();

        assert_eq!(outcome.state, ExecutionState::Completed);
        assert_eq!(outcome.output, 30u64.to_le_bytes());
        assert_eq!(outcome.gas_used, 9);
        assert!(outcome.exec_hash.is_some());
        assert_eq!(outcome.fault, None);
    }

    #[test]
    fn test_div_by_zero_scenario() {
        let mut code = Vec::new();
        code.extend_from_slice(&[0x01, 0x05, 0, 0, 0, 0, 0, 0, 0]);
        code.extend_from_slice(&[0x01, 0x00, 0, 0, 0, 0, 0, 0, 0]);
        code.extend_from_slice(&[0x06, 0xFF]);

        let outcome = execute(&code, &[], 1_000_000).unwrap();

        assert_eq!(outcome.state, ExecutionState::Error);
        assert_eq!(outcome.fault, Some(Fault::DivByZero));
        assert_eq!(outcome.gas_used, 11); // DIV charges before faulting
        assert!(outcome.output.is_empty());
        assert_eq!(outcome.exec_hash, None);
    }

    #[test]
    fn test_out_of_gas_scenario() {
        let outcome = execute(&add_and_halt(), &[], 2).unwrap();

        assert_eq!(outcome.state, ExecutionState::OutOfGas);
        assert_eq!(outcome.gas_used, 0); // first PUSH cannot be paid
        assert!(outcome.output.is_empty());
        assert_eq!(outcome.exec_hash, None);
    }

    #[test]
    fn test_invalid_code_is_an_error() {
        let err = execute(&[0x11, 0xFF], &[], 1_000).unwrap_err();
        assert!(matches!(err, ValidateError::UnknownOpcode { .. }));
    }

    #[test]
    fn test_determinism() {
        let code = add_and_halt();
        let a = execute(&code, b"input", 500).unwrap();
        let b = execute(&code, b"input", 500).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_gas_never_exceeds_limit() {
        let code = add_and_halt();
        for limit in 0..12 {
            let outcome = execute(&code, &[], limit).unwrap();
            assert!(outcome.gas_used <= limit);
        }
    }

    #[test]
    fn test_exec_hash_independent_of_surplus_gas_limit() {
        let code = add_and_halt();
        let a = execute(&code, b"in", 9).unwrap();
        let b = execute(&code, b"in", 1_000_000).unwrap();

        assert_eq!(a.state, ExecutionState::Completed);
        assert_eq!(a.exec_hash, b.exec_hash);
    }

    #[test]
    fn test_exec_hash_depends_on_each_component() {
        let base = execution_hash(b"code", b"input", b"output", 9);

        assert_ne!(base, execution_hash(b"codE", b"input", b"output", 9));
        assert_ne!(base, execution_hash(b"code", b"inpuT", b"output", 9));
        assert_ne!(base, execution_hash(b"code", b"input", b"outpuT", 9));
        assert_ne!(base, execution_hash(b"code", b"input", b"output", 10));
    }

    #[test]
    fn test_exec_hash_empty_input_uses_empty_digest() {
        // Recompute by hand with the documented formula.
        let code = add_and_halt();
        let outcome = execute(&code, &[], 1_000).unwrap();

        let expected = execution_hash(&code, &[], &30u64.to_le_bytes(), 9);
        assert_eq!(outcome.exec_hash, Some(expected));
    }

    #[test]
    fn test_validator_soundness_over_opcode_soup() {
        // Any program the validator accepts must execute without decode or
        // jump faults.
        let mut seed = 0x1234_5678_u32;
        for _ in 0..200 {
            let mut code = Vec::new();
            for _ in 0..32 {
                seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                code.push((seed >> 24) as u8);
            }
            code.push(0xFF);

            if validator::validate(&code).is_ok() {
                let outcome = execute(&code, &[], 10_000).unwrap();
                assert!(!matches!(
                    outcome.fault,
                    Some(Fault::BadJumpTarget { .. }) | Some(Fault::UnterminatedProgram)
                ));
            }
        }
    }
}
