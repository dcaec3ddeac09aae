//! Configuration for SigilVM
//!
//! Provides configuration with validation and sensible defaults for the
//! virtual machine and the sealed keystore.

use crate::types::{DEFAULT_GAS_LIMIT, MAX_CONTRACT_SIZE, MAX_INPUT_SIZE, MAX_RESULT_SIZE};

use alloc::string::String;
use serde::{Deserialize, Serialize};

/// Main enclave configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnclaveConfig {
    /// Virtual machine limits
    pub vm: VmConfig,
    /// Sealed keystore behavior
    pub keystore: KeystoreConfig,
}

impl Default for EnclaveConfig {
    fn default() -> Self {
        Self {
            vm: VmConfig::default(),
            keystore: KeystoreConfig::default(),
        }
    }
}

impl EnclaveConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        self.vm.validate()?;
        self.keystore.validate()?;
        Ok(())
    }
}

/// Virtual machine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmConfig {
    /// Maximum contract bytecode size in bytes
    pub max_code_size: usize,
    /// Maximum input size in bytes
    pub max_input_size: usize,
    /// Maximum result size in bytes
    pub max_result_size: usize,
    /// Gas limit applied when the caller does not supply one
    pub default_gas_limit: u64,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_code_size: MAX_CONTRACT_SIZE,
            max_input_size: MAX_INPUT_SIZE,
            max_result_size: MAX_RESULT_SIZE,
            default_gas_limit: DEFAULT_GAS_LIMIT,
        }
    }
}

impl VmConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_code_size == 0 || self.max_code_size > MAX_CONTRACT_SIZE {
            return Err("max_code_size must be in 1..=1 MiB".into());
        }
        if self.max_input_size > MAX_INPUT_SIZE {
            return Err("max_input_size must be <= 64 KiB".into());
        }
        if self.max_result_size == 0 || self.max_result_size > MAX_RESULT_SIZE {
            return Err("max_result_size must be in 1..=64 KiB".into());
        }
        if self.default_gas_limit == 0 {
            return Err("default_gas_limit must be > 0".into());
        }
        Ok(())
    }
}

/// Policy for a keystore blob that fails authentication on cold boot.
///
/// `Refuse` preserves the signing-key identity by refusing to start;
/// `Regenerate` falls back to a cold keygen and reseals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyRecoveryPolicy {
    /// Fail initialization on a tampered or foreign keystore
    Refuse,
    /// Generate a fresh keypair and overwrite the keystore
    Regenerate,
}

/// Sealed keystore configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeystoreConfig {
    /// Host storage key the sealed keypair lives under
    pub storage_key: String,
    /// What to do when the keystore fails to unseal
    pub recovery: KeyRecoveryPolicy,
}

impl Default for KeystoreConfig {
    fn default() -> Self {
        Self {
            storage_key: "keystore.dat".into(),
            recovery: KeyRecoveryPolicy::Refuse,
        }
    }
}

impl KeystoreConfig {
    fn validate(&self) -> Result<(), String> {
        if self.storage_key.is_empty() {
            return Err("storage_key must not be empty".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EnclaveConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_gas_limit_rejected() {
        let mut config = EnclaveConfig::default();
        config.vm.default_gas_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_code_limit_rejected() {
        let mut config = EnclaveConfig::default();
        config.vm.max_code_size = MAX_CONTRACT_SIZE + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_storage_key_rejected() {
        let mut config = EnclaveConfig::default();
        config.keystore.storage_key = String::new();
        assert!(config.validate().is_err());
    }
}
