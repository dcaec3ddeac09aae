//! Bytecode interpreter
//!
//! Executes one instruction per step against a per-call execution context.
//! All effects are confined to the context: the operand stack, the 4 KiB
//! scratch memory, and the output buffer. Gas is charged before each
//! instruction executes; a failed charge halts the VM in the out-of-gas
//! state with `gas_used` unchanged.

use crate::crypto::sha256;
use crate::error::Fault;
use crate::types::{ExecutionState, MEMORY_SIZE};
use crate::vm::gas::GasMeter;
use crate::vm::opcode::Opcode;
use crate::vm::stack::OperandStack;
use crate::vm::validator::JumpSet;

use alloc::vec::Vec;

/// Execution context for a single contract run.
///
/// Owned exclusively by one `execute` call; never reused. Constructed from
/// code that passed validation together with its boundary set.
pub(crate) struct ExecContext<'a> {
    code: &'a [u8],
    jumps: &'a JumpSet,
    pub stack: OperandStack,
    pub memory: [u8; MEMORY_SIZE],
    pub pc: usize,
    pub gas: GasMeter,
    pub state: ExecutionState,
    pub fault: Option<Fault>,
    pub output: Vec<u8>,
}

impl<'a> ExecContext<'a> {
    pub fn new(code: &'a [u8], jumps: &'a JumpSet, gas_limit: u64) -> Self {
        Self {
            code,
            jumps,
            stack: OperandStack::new(),
            memory: [0; MEMORY_SIZE],
            pc: 0,
            gas: GasMeter::new(gas_limit),
            state: ExecutionState::Init,
            fault: None,
            output: Vec::new(),
        }
    }

    /// Run to a terminal state.
    pub fn run(&mut self) {
        self.state = ExecutionState::Running;
        while self.state == ExecutionState::Running {
            self.step();
        }
    }

    /// Fetch, charge, and apply one instruction.
    fn step(&mut self) {
        let Some(&byte) = self.code.get(self.pc) else {
            return self.fail(Fault::UnterminatedProgram);
        };

        // Validated code always decodes here; a non-instruction byte means
        // the pc left the instruction stream.
        let Some(op) = Opcode::from_byte(byte) else {
            return self.fail(Fault::BadJumpTarget { target: self.pc });
        };

        if self.gas.charge(op.gas_cost()).is_err() {
            self.state = ExecutionState::OutOfGas;
            return;
        }

        if let Err(fault) = self.apply(op) {
            self.fail(fault);
        }
    }

    fn apply(&mut self, op: Opcode) -> Result<(), Fault> {
        let mut next_pc = self.pc + 1 + op.operand_width();

        match op {
            Opcode::Nop => {}
            Opcode::Push => {
                let imm = self.read_imm64()?;
                self.stack.push(imm)?;
            }
            Opcode::Pop => {
                self.stack.pop()?;
            }
            Opcode::Add => self.binary(u64::wrapping_add)?,
            Opcode::Sub => self.binary(u64::wrapping_sub)?,
            Opcode::Mul => self.binary(u64::wrapping_mul)?,
            Opcode::Div => self.div_mod(false)?,
            Opcode::Mod => self.div_mod(true)?,
            Opcode::And => self.binary(|a, b| a & b)?,
            Opcode::Or => self.binary(|a, b| a | b)?,
            Opcode::Xor => self.binary(|a, b| a ^ b)?,
            Opcode::Not => {
                let a = self.stack.pop()?;
                self.stack.push(!a)?;
            }
            Opcode::Eq => self.binary(|a, b| u64::from(a == b))?,
            Opcode::Lt => self.binary(|a, b| u64::from(a < b))?,
            Opcode::Gt => self.binary(|a, b| u64::from(a > b))?,
            Opcode::Jmp => {
                next_pc = self.jump_target()?;
            }
            Opcode::JmpIf => {
                let condition = self.stack.pop()?;
                if condition != 0 {
                    next_pc = self.jump_target()?;
                }
            }
            Opcode::Load => {
                let addr = self.stack.pop()?;
                let base = self.mem_range(addr, 8)?;
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&self.memory[base..base + 8]);
                self.stack.push(u64::from_le_bytes(raw))?;
            }
            Opcode::Store => {
                let value = self.stack.pop()?;
                let addr = self.stack.pop()?;
                let base = self.mem_range(addr, 8)?;
                self.memory[base..base + 8].copy_from_slice(&value.to_le_bytes());
            }
            Opcode::Hash => {
                let len = self.stack.pop()?;
                let addr = self.stack.pop()?;
                let base = self.mem_range(addr, len)?;
                let digest = sha256(&self.memory[base..base + len as usize]);
                let mut low = [0u8; 8];
                low.copy_from_slice(&digest[..8]);
                self.stack.push(u64::from_le_bytes(low))?;
            }
            Opcode::Verify => {
                // Stub scheme: any tag verifies.
                self.stack.pop()?;
                self.stack.push(1)?;
            }
            Opcode::Halt => {
                self.output = match self.stack.peek() {
                    Some(value) => value.to_le_bytes().to_vec(),
                    None => Vec::new(),
                };
                self.state = ExecutionState::Completed;
                return Ok(());
            }
        }

        self.pc = next_pc;
        Ok(())
    }

    fn fail(&mut self, fault: Fault) {
        self.state = ExecutionState::Error;
        self.fault = Some(fault);
    }

    fn binary(&mut self, f: impl Fn(u64, u64) -> u64) -> Result<(), Fault> {
        let b = self.stack.pop()?;
        let a = self.stack.pop()?;
        self.stack.push(f(a, b))
    }

    fn div_mod(&mut self, remainder: bool) -> Result<(), Fault> {
        let b = self.stack.pop()?;
        let a = self.stack.pop()?;
        if b == 0 {
            return Err(Fault::DivByZero);
        }
        self.stack.push(if remainder { a % b } else { a / b })
    }

    /// Resolve a scratch-memory access, requiring `addr + len <= 4096`.
    fn mem_range(&self, addr: u64, len: u64) -> Result<usize, Fault> {
        let out_of_range = Fault::MemoryOutOfRange { addr, len };
        let end = addr.checked_add(len).ok_or(out_of_range)?;
        if end > MEMORY_SIZE as u64 {
            return Err(out_of_range);
        }
        Ok(addr as usize)
    }

    fn read_imm64(&self) -> Result<u64, Fault> {
        let bytes = self
            .code
            .get(self.pc + 1..self.pc + 9)
            .ok_or(Fault::UnterminatedProgram)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(raw))
    }

    /// Decode a jump operand and re-check it against the boundary set.
    fn jump_target(&self) -> Result<usize, Fault> {
        let bytes = self
            .code
            .get(self.pc + 1..self.pc + 5)
            .ok_or(Fault::UnterminatedProgram)?;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(bytes);
        let target = u32::from_le_bytes(raw) as usize;

        if !self.jumps.contains(target) {
            return Err(Fault::BadJumpTarget { target });
        }
        Ok(target)
    }
}
