//! Gas metering
//!
//! Every instruction pre-charges its fixed cost before executing. A charge
//! that would exceed the limit leaves `used` untouched; the VM then halts
//! in the out-of-gas state.

/// Marker for a charge that would exceed the gas limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsufficientGas;

/// Per-execution gas counter
#[derive(Debug, Clone, Copy)]
pub struct GasMeter {
    limit: u64,
    used: u64,
}

impl GasMeter {
    /// Create a meter with the given limit
    pub fn new(limit: u64) -> Self {
        Self { limit, used: 0 }
    }

    /// Charge `cost` gas.
    ///
    /// Fails without side effect when `used + cost` would exceed the limit.
    pub fn charge(&mut self, cost: u64) -> Result<(), InsufficientGas> {
        match self.used.checked_add(cost) {
            Some(total) if total <= self.limit => {
                self.used = total;
                Ok(())
            }
            _ => Err(InsufficientGas),
        }
    }

    /// Gas consumed so far
    pub fn used(&self) -> u64 {
        self.used
    }

    /// The configured limit
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Gas still available
    pub fn remaining(&self) -> u64 {
        self.limit - self.used
    }
}
