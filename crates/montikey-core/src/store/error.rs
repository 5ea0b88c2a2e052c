//! Key store errors

use montikey_crypto::PrimitiveError;
use thiserror::Error;

use crate::{
    env::EntropyError,
    key::{AlgorithmType, KeyError},
};

/// Errors from key store operations.
///
/// Every one of these is also written to the audit log before it is
/// returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Caller supplied an empty id, a cleared key or a truncated ciphertext
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// What was wrong with the input
        reason: String,
    },

    /// No key with this id is stored
    #[error("key not found: {key_id}")]
    NotFound {
        /// The id that was looked up
        key_id: String,
    },

    /// Key's algorithm has no cipher dispatch
    #[error("unsupported algorithm: {algorithm}")]
    UnsupportedAlgorithm {
        /// The algorithm tag on the key
        algorithm: AlgorithmType,
    },

    /// Cipher primitive rejected the operation
    #[error("primitive failure: {0}")]
    Primitive(#[from] PrimitiveError),

    /// Environment could not supply randomness
    #[error("primitive failure: {0}")]
    Entropy(#[from] EntropyError),
}

impl StoreError {
    /// Returns true if retrying the same call can never succeed.
    ///
    /// `NotFound` may clear once the key is stored; entropy failures may be
    /// transient. Everything else is determined by the inputs.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::InvalidInput { .. } | Self::UnsupportedAlgorithm { .. } => true,
            Self::Primitive(err) => err.is_fatal(),
            Self::NotFound { .. } | Self::Entropy(_) => false,
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput { reason: reason.into() }
    }
}

impl From<KeyError> for StoreError {
    fn from(err: KeyError) -> Self {
        match err {
            KeyError::InvalidInput { reason } => Self::invalid(reason),
        }
    }
}
