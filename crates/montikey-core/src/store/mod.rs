//! In-memory key store with algorithm dispatch and a bounded audit trail.
//!
//! # Architecture
//!
//! One mutex guards both the key map and the audit log, so every operation
//! (including rotate's look-up, generate and insert) is a single critical
//! section and audit order matches execution order.
//!
//! ```text
//! KeyStore (Clone) ──► Arc<Mutex<KeyStoreInner>>
//!                          ├── keys: HashMap<id, DerivedKey>
//!                          └── audit: AuditLog (FIFO, capacity <= 1000)
//! ```
//!
//! "One store per process" is a caller convention: construct one and clone
//! it where it is needed.

mod audit;
mod dispatch;
mod error;

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

pub use audit::{AuditOperation, AuditRecord};
pub use error::StoreError;

use self::audit::AuditLog;
use crate::{
    env::Environment,
    key::{DerivedKey, KeyMetadata, SecurityContext},
    sync::lock,
};

/// Default and maximum number of audit records retained.
pub const DEFAULT_AUDIT_CAPACITY: usize = 1000;

/// Key id recorded for operations that do not target a key.
const SYSTEM_ID: &str = "SYSTEM";

/// Key id recorded when the caller supplied an empty id.
const NULL_ID: &str = "NULL";

/// Key store configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStoreConfig {
    /// Audit records retained before the oldest is evicted.
    ///
    /// Clamped to `1..=DEFAULT_AUDIT_CAPACITY`.
    pub audit_capacity: usize,
}

impl Default for KeyStoreConfig {
    fn default() -> Self {
        Self { audit_capacity: DEFAULT_AUDIT_CAPACITY }
    }
}

impl KeyStoreConfig {
    /// Capacity actually applied.
    pub fn effective_audit_capacity(&self) -> usize {
        self.audit_capacity.clamp(1, DEFAULT_AUDIT_CAPACITY)
    }
}

/// Thread-safe key store.
///
/// Clone shares the same underlying keys, audit log and security context.
/// A poisoned mutex is recovered rather than propagated.
#[derive(Clone)]
pub struct KeyStore<E: Environment> {
    env: E,
    inner: Arc<Mutex<KeyStoreInner>>,
    context: Arc<SecurityContext>,
}

struct KeyStoreInner {
    keys: HashMap<String, DerivedKey>,
    audit: AuditLog,
}

impl KeyStoreInner {
    fn record(
        &mut self,
        now: u64,
        operation: AuditOperation,
        key_id: &str,
        success: bool,
        details: impl Into<String>,
    ) {
        self.audit.push(AuditRecord {
            timestamp_millis: now,
            operation,
            key_id: key_id.to_string(),
            success,
            details: details.into(),
        });
    }

    /// Look up `key_id`, recording a `RETRIEVE` entry for either outcome.
    fn retrieve(&mut self, now: u64, key_id: &str) -> Result<DerivedKey, StoreError> {
        if key_id.is_empty() {
            self.record(now, AuditOperation::Retrieve, NULL_ID, false, "invalid key id");
            return Err(StoreError::invalid("key id is empty"));
        }

        if let Some(key) = self.keys.get(key_id) {
            let key = key.clone();
            self.record(now, AuditOperation::Retrieve, key_id, true, "key retrieved");
            tracing::debug!(key_id, "retrieved key");
            Ok(key)
        } else {
            self.record(now, AuditOperation::Retrieve, key_id, false, "key not found");
            tracing::warn!(key_id, "key not found");
            Err(StoreError::NotFound { key_id: key_id.to_string() })
        }
    }

    fn insert(&mut self, now: u64, key: DerivedKey) {
        let key_id = key.key_id().to_string();
        let details = format!(
            "key stored: algorithm={}, length={} bits",
            key.metadata().algorithm(),
            key.key_length_bits()
        );

        if let Some(mut replaced) = self.keys.insert(key_id.clone(), key) {
            replaced.clear();
        }

        self.record(now, AuditOperation::Store, &key_id, true, details);
        tracing::info!(key_id = %key_id, "stored key");
    }
}

impl<E: Environment> KeyStore<E> {
    /// Create a store with the default audit capacity.
    pub fn new(env: E) -> Self {
        Self::with_config(env, KeyStoreConfig::default())
    }

    /// Create a store with explicit configuration.
    ///
    /// Records an `INIT` entry against key id `SYSTEM`.
    pub fn with_config(env: E, config: KeyStoreConfig) -> Self {
        let now = env.now_millis();
        let capacity = config.effective_audit_capacity();

        let context = SecurityContext::with_prefix("KEY_STORE", now);
        context.log_operation(now, "key store initialized");

        let mut inner =
            KeyStoreInner { keys: HashMap::new(), audit: AuditLog::with_capacity(capacity) };
        inner.record(now, AuditOperation::Init, SYSTEM_ID, true, "key store initialized");

        tracing::info!(
            context_id = context.context_id(),
            audit_capacity = capacity,
            "key store initialized"
        );

        Self { env, inner: Arc::new(Mutex::new(inner)), context: Arc::new(context) }
    }

    /// Insert or overwrite a key by id. Last write wins.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the key has been cleared
    pub fn store(&self, key: DerivedKey) -> Result<(), StoreError> {
        let now = self.env.now_millis();
        let mut inner = lock(&self.inner);

        if key.is_cleared() {
            inner.record(now, AuditOperation::Store, key.key_id(), false, "key has been cleared");
            tracing::warn!(key_id = key.key_id(), "rejected cleared key");
            return Err(StoreError::invalid("key has been cleared"));
        }

        inner.insert(now, key);
        Ok(())
    }

    /// Copy of the key stored under `key_id`.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `key_id` is empty
    /// - `NotFound` if no key is stored under `key_id`
    pub fn retrieve(&self, key_id: &str) -> Result<DerivedKey, StoreError> {
        let now = self.env.now_millis();
        lock(&self.inner).retrieve(now, key_id)
    }

    /// Remove a key and wipe its secret.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `key_id` is empty
    /// - `NotFound` if no key is stored under `key_id`
    pub fn delete(&self, key_id: &str) -> Result<(), StoreError> {
        let now = self.env.now_millis();
        let mut inner = lock(&self.inner);

        if key_id.is_empty() {
            inner.record(now, AuditOperation::Delete, NULL_ID, false, "invalid key id");
            return Err(StoreError::invalid("key id is empty"));
        }

        match inner.keys.remove(key_id) {
            Some(mut key) => {
                key.clear();
                inner.record(now, AuditOperation::Delete, key_id, true, "key deleted");
                tracing::info!(key_id, "deleted key");
                Ok(())
            },
            None => {
                inner.record(now, AuditOperation::Delete, key_id, false, "key not found");
                tracing::warn!(key_id, "delete of unknown key");
                Err(StoreError::NotFound { key_id: key_id.to_string() })
            },
        }
    }

    /// Whether a key is stored under `key_id`.
    ///
    /// The answer may be stale as soon as this returns.
    pub fn has_key(&self, key_id: &str) -> bool {
        lock(&self.inner).keys.contains_key(key_id)
    }

    /// All stored key ids, sorted.
    pub fn list_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = lock(&self.inner).keys.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of stored keys.
    pub fn count(&self) -> usize {
        lock(&self.inner).keys.len()
    }

    /// Encrypt `plaintext` with the key stored under `key_id`.
    ///
    /// Output is `IV || ciphertext`; the IV is fresh environment randomness
    /// (16 bytes for AES, 8 for DES and 3DES).
    ///
    /// # Errors
    ///
    /// - `NotFound` / `InvalidInput` from the key look-up
    /// - `UnsupportedAlgorithm` for MIFARE Classic keys
    /// - `Primitive` / `Entropy` if the cipher or IV generation fails
    pub fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<Vec<u8>, StoreError> {
        let now = self.env.now_millis();
        let mut inner = lock(&self.inner);

        let result = inner.retrieve(now, key_id).and_then(|key| {
            dispatch::encrypt(&self.env, key.metadata().algorithm(), &key.key_bytes(), plaintext)
        });

        match &result {
            Ok(ciphertext) => {
                let details = format!("encrypted {} bytes", plaintext.len());
                inner.record(now, AuditOperation::Encrypt, key_id, true, details);
                tracing::debug!(key_id, output_len = ciphertext.len(), "encrypted");
            },
            Err(err) => {
                inner.record(now, AuditOperation::Encrypt, key_id, false, err.to_string());
                log_failure("encrypt", key_id, err);
            },
        }
        result
    }

    /// Decrypt `IV || ciphertext` with the key stored under `key_id`.
    ///
    /// # Errors
    ///
    /// - `NotFound` / `InvalidInput` from the key look-up
    /// - `InvalidInput` if `data` is shorter than the IV
    /// - `UnsupportedAlgorithm` for MIFARE Classic keys
    /// - `Primitive` on bad padding or key length
    pub fn decrypt(&self, key_id: &str, data: &[u8]) -> Result<Vec<u8>, StoreError> {
        let now = self.env.now_millis();
        let mut inner = lock(&self.inner);

        let result = inner
            .retrieve(now, key_id)
            .and_then(|key| dispatch::decrypt(key.metadata().algorithm(), &key.key_bytes(), data));

        match &result {
            Ok(plaintext) => {
                let details = format!("decrypted {} bytes", plaintext.len());
                inner.record(now, AuditOperation::Decrypt, key_id, true, details);
                tracing::debug!(key_id, "decrypted");
            },
            Err(err) => {
                inner.record(now, AuditOperation::Decrypt, key_id, false, err.to_string());
                log_failure("decrypt", key_id, err);
            },
        }
        result
    }

    /// Generate a successor for the key stored under `key_id`.
    ///
    /// The new key has a fresh random secret of the same length, the same
    /// source and algorithm, `version + 1`, description
    /// `"rotated from <key_id>"` and id `<key_id>_v<new version>`. It is
    /// stored and returned. The old entry is kept; callers delete it
    /// explicitly. Failures abort without mutating the key map.
    ///
    /// # Errors
    ///
    /// - `NotFound` / `InvalidInput` from the key look-up
    /// - `Entropy` if the new secret cannot be generated
    pub fn rotate(&self, key_id: &str) -> Result<DerivedKey, StoreError> {
        let now = self.env.now_millis();
        let mut inner = lock(&self.inner);

        let result = inner.retrieve(now, key_id).and_then(|old| self.successor(now, &old));

        match result {
            Ok(new_key) => {
                inner.insert(now, new_key.clone());
                let details = format!("new key: {}", new_key.key_id());
                inner.record(now, AuditOperation::Rotate, key_id, true, details);
                tracing::info!(key_id, new_key_id = new_key.key_id(), "rotated key");
                Ok(new_key)
            },
            Err(err) => {
                let audit_id = if key_id.is_empty() { NULL_ID } else { key_id };
                inner.record(now, AuditOperation::Rotate, audit_id, false, err.to_string());
                log_failure("rotate", key_id, &err);
                Err(err)
            },
        }
    }

    fn successor(&self, now: u64, old: &DerivedKey) -> Result<DerivedKey, StoreError> {
        let old_metadata = old.metadata();
        let version = old_metadata
            .version()
            .checked_add(1)
            .ok_or_else(|| StoreError::invalid("key version overflow"))?;

        let secret = self.env.random_vec(old.key_length_bits() / 8)?;
        let metadata = KeyMetadata::new(
            old_metadata.source(),
            old_metadata.algorithm(),
            format!("rotated from {}", old.key_id()),
            version,
        );

        Ok(DerivedKey::new(&secret, format!("{}_v{version}", old.key_id()), metadata, now)?)
    }

    /// Wipe every secret and empty the store.
    pub fn clear_all(&self) {
        let now = self.env.now_millis();
        let mut inner = lock(&self.inner);

        let cleared = inner.keys.len();
        for key in inner.keys.values_mut() {
            key.clear();
        }
        inner.keys.clear();

        let details = format!("cleared {cleared} keys");
        inner.record(now, AuditOperation::ClearAll, SYSTEM_ID, true, details);
        self.context.log_operation(now, "all keys cleared");
        tracing::info!(cleared, "cleared all keys");
    }

    /// Snapshot of the audit trail, oldest first.
    pub fn audit_log(&self) -> Vec<AuditRecord> {
        lock(&self.inner).audit.snapshot()
    }

    /// Plain-text audit report.
    ///
    /// ```text
    /// === Key Store Audit Log ===
    /// Total operations: <n>
    ///
    /// <record>
    /// ```
    pub fn export_audit_log(&self) -> String {
        lock(&self.inner).audit.export()
    }

    /// Empty the audit trail, then record the `CLEAR_LOG` itself.
    pub fn clear_audit_log(&self) {
        let now = self.env.now_millis();
        let mut inner = lock(&self.inner);
        inner.audit.clear();
        inner.record(now, AuditOperation::ClearLog, SYSTEM_ID, true, "audit log cleared");
        tracing::info!("audit log cleared");
    }

    /// Maximum audit records retained.
    pub fn audit_capacity(&self) -> usize {
        lock(&self.inner).audit.capacity()
    }

    /// Operation log for this store instance.
    pub fn security_context(&self) -> &SecurityContext {
        &self.context
    }
}

fn log_failure(operation: &'static str, key_id: &str, err: &StoreError) {
    match err {
        StoreError::Primitive(_) | StoreError::Entropy(_) => {
            tracing::error!(operation, key_id, error = %err, "primitive failure");
        },
        StoreError::UnsupportedAlgorithm { .. } => {
            tracing::warn!(operation, key_id, error = %err, "unsupported algorithm");
        },
        StoreError::InvalidInput { .. } | StoreError::NotFound { .. } => {
            tracing::debug!(operation, key_id, error = %err, "operation rejected");
        },
    }
}
