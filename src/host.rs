//! Host outcall interface
//!
//! The trust boundary reaches the outside world only through these calls:
//! console output, the audit-log stream, wall-clock time, and untrusted
//! blob storage. Host storage holds sealed blobs only; confidentiality
//! comes from the sealing layer, never from the host.

use crate::types::AuditLevel;

use alloc::string::String;
use alloc::vec::Vec;

/// Outcalls from the enclave to the untrusted host.
pub trait Host {
    /// Print a line to the host console.
    fn print_string(&self, message: &str);

    /// Print a line to the host error stream.
    fn print_error(&self, message: &str);

    /// Append a record to the host audit stream.
    ///
    /// Records are totally ordered by the order of `execute` invocations;
    /// the host serializes boundary calls.
    fn audit_log(&self, level: AuditLevel, message: &str, blob: Option<&[u8]>);

    /// Milliseconds since the Unix epoch, per the host's clock.
    fn timestamp_ms(&self) -> u64;

    /// Read the blob stored under `key`, if any.
    fn storage_read(&self, key: &str) -> Option<Vec<u8>>;

    /// Store a blob under `key`, replacing any previous value.
    ///
    /// Returns `false` if the host could not persist the blob.
    fn storage_write(&self, key: &str, value: &[u8]) -> bool;

    /// Delete the blob under `key`. Returns `false` if absent.
    fn storage_delete(&self, key: &str) -> bool;
}

/// One captured audit record.
#[cfg(feature = "std")]
#[derive(Debug, Clone, serde::Serialize)]
pub struct AuditRecord {
    /// Record severity
    pub level: AuditLevel,
    /// Log message
    pub message: String,
    /// Attached payload, hex-encoded when rendered
    pub blob: Option<Vec<u8>>,
}

/// Reference host backed by in-memory storage.
///
/// Storage lives in a `BTreeMap`, the clock ticks monotonically from a
/// fixed epoch, and audit records are both captured for inspection and
/// forwarded to `tracing` as JSON lines. Cloning yields a handle onto the
/// same state, so a test can keep one while the verifier owns another.
#[cfg(feature = "std")]
#[derive(Clone)]
pub struct MemoryHost {
    inner: std::sync::Arc<MemoryHostState>,
}

#[cfg(feature = "std")]
struct MemoryHostState {
    storage: std::sync::Mutex<alloc::collections::BTreeMap<String, Vec<u8>>>,
    audit: std::sync::Mutex<Vec<AuditRecord>>,
    clock_ms: core::sync::atomic::AtomicU64,
}

#[cfg(feature = "std")]
impl MemoryHost {
    /// Host whose clock starts at a fixed epoch
    pub fn new() -> Self {
        Self::with_clock(1_700_000_000_000)
    }

    /// Host whose clock starts at `start_ms`
    pub fn with_clock(start_ms: u64) -> Self {
        Self {
            inner: std::sync::Arc::new(MemoryHostState {
                storage: std::sync::Mutex::new(alloc::collections::BTreeMap::new()),
                audit: std::sync::Mutex::new(Vec::new()),
                clock_ms: core::sync::atomic::AtomicU64::new(start_ms),
            }),
        }
    }

    /// Snapshot of the captured audit records
    pub fn audit_records(&self) -> Vec<AuditRecord> {
        self.inner.audit.lock().expect("audit lock poisoned").clone()
    }

    /// Number of blobs currently stored
    pub fn stored_blobs(&self) -> usize {
        self.inner.storage.lock().expect("storage lock poisoned").len()
    }
}

#[cfg(feature = "std")]
impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Host for MemoryHost {
    fn print_string(&self, message: &str) {
        tracing::info!(target: "sigilvm::host", "{message}");
    }

    fn print_error(&self, message: &str) {
        tracing::error!(target: "sigilvm::host", "{message}");
    }

    fn audit_log(&self, level: AuditLevel, message: &str, blob: Option<&[u8]>) {
        let record = AuditRecord {
            level,
            message: message.into(),
            blob: blob.map(|b| b.to_vec()),
        };

        if let Ok(line) = serde_json::to_string(&record) {
            match level {
                AuditLevel::Debug => tracing::debug!(target: "sigilvm::audit", "{line}"),
                AuditLevel::Info => tracing::info!(target: "sigilvm::audit", "{line}"),
                AuditLevel::Warn => tracing::warn!(target: "sigilvm::audit", "{line}"),
                AuditLevel::Error | AuditLevel::Critical => {
                    tracing::error!(target: "sigilvm::audit", "{line}");
                }
            }
        }

        self.inner.audit.lock().expect("audit lock poisoned").push(record);
    }

    fn timestamp_ms(&self) -> u64 {
        self.inner
            .clock_ms
            .fetch_add(1, core::sync::atomic::Ordering::SeqCst)
    }

    fn storage_read(&self, key: &str) -> Option<Vec<u8>> {
        self.inner
            .storage
            .lock()
            .expect("storage lock poisoned")
            .get(key)
            .cloned()
    }

    fn storage_write(&self, key: &str, value: &[u8]) -> bool {
        self.inner
            .storage
            .lock()
            .expect("storage lock poisoned")
            .insert(key.into(), value.to_vec());
        true
    }

    fn storage_delete(&self, key: &str) -> bool {
        self.inner
            .storage
            .lock()
            .expect("storage lock poisoned")
            .remove(key)
            .is_some()
    }
}
