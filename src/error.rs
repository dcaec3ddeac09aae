//! Error types for SigilVM
//!
//! All failure modes are closed sums. Nothing is thrown across the trust
//! boundary; every boundary call maps its error to a stable numeric status
//! code via [`EnclaveError::code`].

use alloc::string::String;
use core::fmt;

/// Result type for enclave operations
pub type EnclaveResult<T> = Result<T, EnclaveError>;

/// Structural bytecode validation failure.
///
/// Produced by the validator's linear scans; each variant carries the byte
/// offset(s) needed to pinpoint the defect in the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidateError {
    /// The program is empty
    Empty,
    /// The program exceeds the maximum contract size
    TooLarge {
        /// Size of the rejected program in bytes
        size: usize,
    },
    /// A byte at an instruction boundary is not a valid opcode
    ///
    /// `CALL` and `RET` are reserved and rejected with this cause.
    UnknownOpcode {
        /// Offset of the offending byte
        offset: usize,
        /// The byte value found
        byte: u8,
    },
    /// An instruction's operand bytes run past the end of the program
    TruncatedOperand {
        /// Offset of the instruction whose operand is cut short
        offset: usize,
    },
    /// A jump target lands inside another instruction's operand
    JumpIntoOperand {
        /// Offset of the jump instruction
        offset: usize,
        /// The offending target
        target: usize,
    },
    /// A jump target is outside the program
    OutOfRangeJump {
        /// Offset of the jump instruction
        offset: usize,
        /// The offending target
        target: usize,
    },
    /// The final instruction is not `HALT`
    MissingHalt,
}

impl fmt::Display for ValidateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty program"),
            Self::TooLarge { size } => {
                write!(f, "program too large ({size} bytes)")
            }
            Self::UnknownOpcode { offset, byte } => {
                write!(f, "unknown opcode 0x{byte:02X} at offset {offset}")
            }
            Self::TruncatedOperand { offset } => {
                write!(f, "truncated operand for instruction at offset {offset}")
            }
            Self::JumpIntoOperand { offset, target } => {
                write!(f, "jump at offset {offset} targets operand byte {target}")
            }
            Self::OutOfRangeJump { offset, target } => {
                write!(f, "jump at offset {offset} targets out-of-range offset {target}")
            }
            Self::MissingHalt => write!(f, "program does not end with HALT"),
        }
    }
}

/// A runtime fault inside the virtual machine.
///
/// Faults are terminal: the VM transitions to the `Error` state and reports
/// the fault in its outcome rather than unwinding into the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Pop from an empty operand stack
    StackUnderflow,
    /// Push onto a full operand stack
    StackOverflow,
    /// Integer division or remainder by zero
    DivByZero,
    /// A memory access outside the 4 KiB scratch region
    MemoryOutOfRange {
        /// Base address of the access
        addr: u64,
        /// Width of the access in bytes
        len: u64,
    },
    /// A taken jump whose target is not an instruction boundary
    BadJumpTarget {
        /// The offending target
        target: usize,
    },
    /// The program counter ran past the end of the code without `HALT`
    UnterminatedProgram,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StackUnderflow => write!(f, "stack underflow"),
            Self::StackOverflow => write!(f, "stack overflow"),
            Self::DivByZero => write!(f, "division by zero"),
            Self::MemoryOutOfRange { addr, len } => {
                write!(f, "memory access out of range ({len} bytes at {addr})")
            }
            Self::BadJumpTarget { target } => {
                write!(f, "jump to non-instruction offset {target}")
            }
            Self::UnterminatedProgram => write!(f, "program ran off the end without HALT"),
        }
    }
}

/// Main error type for enclave operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnclaveError {
    // === Contract errors ===
    /// The program failed structural validation
    InvalidCode(ValidateError),

    /// Execution reached a terminal runtime fault
    ExecutionFailed(Fault),

    /// Execution exhausted its gas limit
    OutOfGas,

    // === Crypto / proof errors ===
    /// Signing keypair generation failed
    KeyGen,

    /// Proof signing failed
    Sign,

    /// A proof signature did not verify
    BadSignature,

    /// A proof blob does not match the fixed wire layout
    BadProofFormat,

    /// Random number generation failed
    RngFailed,

    // === Sealing errors ===
    /// Sealing (encryption) failed
    SealFail,

    /// Unsealing failed authentication (tampered or foreign blob)
    UnsealAuthFail,

    /// A sealed blob is too short to carry IV and tag
    UnsealFormat,

    // === Platform / boundary errors ===
    /// The trusted-execution platform reported a failure
    Platform(String),

    /// A boundary call received an invalid argument
    InvalidParameter(String),

    /// An output buffer is too small for the result
    BufferTooSmall {
        /// Size the caller must provide
        required: usize,
    },

    /// The verifier has not been initialized
    NotInitialized,
}

impl fmt::Display for EnclaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCode(cause) => write!(f, "invalid contract code: {cause}"),
            Self::ExecutionFailed(fault) => write!(f, "contract execution failed: {fault}"),
            Self::OutOfGas => write!(f, "out of gas"),
            Self::KeyGen => write!(f, "key generation failed"),
            Self::Sign => write!(f, "proof signing failed"),
            Self::BadSignature => write!(f, "signature verification failed"),
            Self::BadProofFormat => write!(f, "malformed execution proof"),
            Self::RngFailed => write!(f, "random number generation failed"),
            Self::SealFail => write!(f, "sealing failed"),
            Self::UnsealAuthFail => write!(f, "unsealing failed authentication"),
            Self::UnsealFormat => write!(f, "sealed blob too short"),
            Self::Platform(msg) => write!(f, "platform error: {msg}"),
            Self::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
            Self::BufferTooSmall { required } => {
                write!(f, "buffer too small, {required} bytes required")
            }
            Self::NotInitialized => write!(f, "verifier not initialized"),
        }
    }
}

impl From<ValidateError> for EnclaveError {
    fn from(e: ValidateError) -> Self {
        Self::InvalidCode(e)
    }
}

impl From<Fault> for EnclaveError {
    fn from(e: Fault) -> Self {
        Self::ExecutionFailed(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EnclaveError {}

impl EnclaveError {
    /// Stable numeric status code surfaced to the untrusted host.
    ///
    /// Validator causes share one code and runtime faults share another;
    /// the detailed kind reaches the host only through the audit log.
    pub fn code(&self) -> u32 {
        match self {
            Self::InvalidCode(_) => 0x1001,
            Self::ExecutionFailed(_) => 0x1002,
            Self::OutOfGas => 0x1003,
            Self::KeyGen => 0x1005,
            Self::Sign => 0x1006,
            Self::BadSignature => 0x1007,
            Self::BadProofFormat => 0x1008,
            Self::RngFailed => 0x1009,
            Self::SealFail => 0x100A,
            Self::UnsealAuthFail => 0x100B,
            Self::UnsealFormat => 0x100C,
            Self::Platform(_) => 0x100D,
            Self::InvalidParameter(_) => 0x100E,
            Self::BufferTooSmall { .. } => 0x100F,
            Self::NotInitialized => 0x1010,
        }
    }

    /// Check if this error should be logged at critical level
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            Self::KeyGen
                | Self::Sign
                | Self::RngFailed
                | Self::SealFail
                | Self::UnsealAuthFail
                | Self::Platform(_)
        )
    }
}
