//! Sealed signing-key persistence
//!
//! The long-term proof-signing key lives in host storage as a sealed blob
//! under a fixed key. On cold boot it is unsealed; if absent, a fresh
//! keypair is generated and sealed. The secret scalar never reaches the
//! host unsealed.

use crate::config::{KeyRecoveryPolicy, KeystoreConfig};
use crate::crypto::{p256_key_from_seed, random_bytes};
use crate::error::{EnclaveError, EnclaveResult};
use crate::host::Host;
use crate::sealing::Sealer;
use crate::types::AuditLevel;

use p256::ecdsa::SigningKey;
use zeroize::Zeroize;

/// Lifecycle manager for the sealed signing keypair.
pub struct Keystore {
    config: KeystoreConfig,
}

impl Keystore {
    /// Create a keystore with the given configuration
    pub fn new(config: KeystoreConfig) -> Self {
        Self { config }
    }

    /// Unseal the persisted signing key, or generate and seal a fresh one.
    ///
    /// A keystore blob that fails authentication is handled per the
    /// configured [`KeyRecoveryPolicy`]: `Refuse` propagates
    /// `UnsealAuthFail` so the process can preserve its signing identity;
    /// `Regenerate` performs a cold keygen and reseals.
    pub fn load_or_generate(
        &self,
        sealer: &Sealer,
        host: &dyn Host,
    ) -> EnclaveResult<SigningKey> {
        match host.storage_read(&self.config.storage_key) {
            Some(blob) => match sealer.unseal(&blob) {
                Ok(mut secret) => {
                    let key = p256_key_from_seed(&secret);
                    secret.zeroize();
                    key
                }
                Err(EnclaveError::UnsealAuthFail) => match self.config.recovery {
                    KeyRecoveryPolicy::Refuse => {
                        host.audit_log(
                            AuditLevel::Critical,
                            "keystore failed authentication, refusing to start",
                            None,
                        );
                        Err(EnclaveError::UnsealAuthFail)
                    }
                    KeyRecoveryPolicy::Regenerate => {
                        host.audit_log(
                            AuditLevel::Warn,
                            "keystore failed authentication, regenerating signing key",
                            None,
                        );
                        self.generate_and_store(sealer, host)
                    }
                },
                Err(e) => Err(e),
            },
            None => self.generate_and_store(sealer, host),
        }
    }

    /// Generate a fresh keypair and reseal the keystore.
    ///
    /// Used for first boot and for key rotation.
    pub fn generate_and_store(
        &self,
        sealer: &Sealer,
        host: &dyn Host,
    ) -> EnclaveResult<SigningKey> {
        // Zeroize the scalar before propagating any failure.
        let mut seed = random_bytes(32)?;
        let key = p256_key_from_seed(&seed);
        let sealed = sealer.seal(&seed[..32]);
        seed.zeroize();

        let (key, sealed) = (key?, sealed?);
        if !host.storage_write(&self.config.storage_key, &sealed) {
            return Err(EnclaveError::SealFail);
        }

        host.audit_log(AuditLevel::Info, "signing key generated and sealed", None);
        Ok(key)
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::crypto::p256_public_key_bytes;
    use crate::host::MemoryHost;
    use crate::platform::SimulatedPlatform;

    fn fixture() -> (Sealer, MemoryHost, Keystore) {
        let sealer = Sealer::new(&SimulatedPlatform::new()).unwrap();
        let host = MemoryHost::new();
        let keystore = Keystore::new(KeystoreConfig::default());
        (sealer, host, keystore)
    }

    #[test]
    fn test_first_boot_generates_and_seals() {
        let (sealer, host, keystore) = fixture();

        assert_eq!(host.storage_read("keystore.dat"), None);
        let key = keystore.load_or_generate(&sealer, &host).unwrap();

        // The stored blob is sealed, not the raw scalar.
        let blob = host.storage_read("keystore.dat").unwrap();
        assert_ne!(&blob[..], &key.to_bytes()[..]);
        assert!(blob.len() > 32);
    }

    #[test]
    fn test_warm_boot_restores_same_key() {
        let (sealer, host, keystore) = fixture();

        let first = keystore.load_or_generate(&sealer, &host).unwrap();
        let second = keystore.load_or_generate(&sealer, &host).unwrap();

        assert_eq!(
            p256_public_key_bytes(&first),
            p256_public_key_bytes(&second)
        );
    }

    #[test]
    fn test_tampered_keystore_refused_by_default() {
        let (sealer, host, keystore) = fixture();
        keystore.load_or_generate(&sealer, &host).unwrap();

        let mut blob = host.storage_read("keystore.dat").unwrap();
        blob[20] ^= 0xFF;
        host.storage_write("keystore.dat", &blob);

        let result = keystore.load_or_generate(&sealer, &host);
        assert!(matches!(result, Err(EnclaveError::UnsealAuthFail)));
    }

    #[test]
    fn test_tampered_keystore_regenerated_when_configured() {
        let (sealer, host, _) = fixture();
        let keystore = Keystore::new(KeystoreConfig {
            recovery: KeyRecoveryPolicy::Regenerate,
            ..KeystoreConfig::default()
        });

        let original = keystore.load_or_generate(&sealer, &host).unwrap();

        let mut blob = host.storage_read("keystore.dat").unwrap();
        blob[20] ^= 0xFF;
        host.storage_write("keystore.dat", &blob);

        let regenerated = keystore.load_or_generate(&sealer, &host).unwrap();
        assert_ne!(
            p256_public_key_bytes(&original),
            p256_public_key_bytes(&regenerated)
        );

        // And the new keystore round-trips again.
        let restored = keystore.load_or_generate(&sealer, &host).unwrap();
        assert_eq!(
            p256_public_key_bytes(&regenerated),
            p256_public_key_bytes(&restored)
        );
    }

    #[test]
    fn test_rotation_changes_key() {
        let (sealer, host, keystore) = fixture();

        let original = keystore.load_or_generate(&sealer, &host).unwrap();
        let rotated = keystore.generate_and_store(&sealer, &host).unwrap();

        assert_ne!(
            p256_public_key_bytes(&original),
            p256_public_key_bytes(&rotated)
        );
    }
}
