//! The key object handed between derivation, storage and transport

use std::fmt;

use thiserror::Error;
use zeroize::{Zeroize, Zeroizing};

use super::KeyMetadata;

/// Key construction failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// Secret or identifier was empty
    #[error("invalid key: {reason}")]
    InvalidInput {
        /// What was wrong with the input
        reason: &'static str,
    },
}

/// A secret plus its identity and provenance.
///
/// The secret is copied in on construction and copied out on every read, so
/// no holder of a returned buffer can mutate the stored value. Storage is
/// wiped on drop; [`clear`](Self::clear) wipes it early and keeps the length.
///
/// `Debug` output never contains secret bytes.
#[derive(Clone)]
pub struct DerivedKey {
    secret: Zeroizing<Vec<u8>>,
    key_id: String,
    metadata: KeyMetadata,
    created_at_millis: u64,
    cleared: bool,
}

impl DerivedKey {
    /// Build a key from secret bytes.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `secret` or `key_id` is empty
    pub fn new(
        secret: &[u8],
        key_id: impl Into<String>,
        metadata: KeyMetadata,
        created_at_millis: u64,
    ) -> Result<Self, KeyError> {
        if secret.is_empty() {
            return Err(KeyError::InvalidInput { reason: "key secret is empty" });
        }

        let key_id = key_id.into();
        if key_id.is_empty() {
            return Err(KeyError::InvalidInput { reason: "key id is empty" });
        }

        Ok(Self {
            secret: Zeroizing::new(secret.to_vec()),
            key_id,
            metadata,
            created_at_millis,
            cleared: false,
        })
    }

    /// Fresh copy of the secret bytes.
    pub fn key_bytes(&self) -> Zeroizing<Vec<u8>> {
        self.secret.clone()
    }

    /// Unique identifier
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Provenance metadata
    pub fn metadata(&self) -> &KeyMetadata {
        &self.metadata
    }

    /// Creation time in milliseconds since the Unix epoch
    pub fn created_at_millis(&self) -> u64 {
        self.created_at_millis
    }

    /// Secret length in bits. Unchanged by [`clear`](Self::clear).
    pub fn key_length_bits(&self) -> usize {
        self.secret.len() * 8
    }

    /// Insert or overwrite a metadata info entry.
    pub fn add_metadata_info(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.add_info(key, value);
    }

    /// Overwrite the secret with zeroes.
    ///
    /// The buffer keeps its length. A cleared key is rejected by the store.
    pub fn clear(&mut self) {
        self.secret.as_mut_slice().zeroize();
        self.cleared = true;
    }

    /// Whether [`clear`](Self::clear) has been called.
    pub fn is_cleared(&self) -> bool {
        self.cleared
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key_id", &self.key_id)
            .field("length_bits", &self.key_length_bits())
            .field("metadata", &self.metadata)
            .field("created_at_millis", &self.created_at_millis)
            .field("cleared", &self.cleared)
            .finish_non_exhaustive()
    }
}
