//! Transport errors

use montikey_core::{KeyError, UnknownTag};
use thiserror::Error;

/// Result alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors from parsing or importing transported keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Text does not start with the `MONTI-KEY:` prefix
    #[error("missing MONTI-KEY header")]
    MissingHeader,

    /// A required line was absent
    #[error("missing required field: {field}")]
    MissingField {
        /// Field name (`ID`, `CHECKSUM` or `DATA`)
        field: &'static str,
    },

    /// Timestamp was not a non-negative integer
    #[error("invalid timestamp: {value:?}")]
    InvalidTimestamp {
        /// The rejected text
        value: String,
    },

    /// Compact form had the wrong number of `|`-separated fields
    #[error("expected {expected} fields, got {actual}")]
    FieldCount {
        /// Required field count
        expected: usize,
        /// Fields present
        actual: usize,
    },

    /// Decoded bytes do not match the checksum
    #[error("checksum mismatch for key {key_id}")]
    ChecksumMismatch {
        /// Key whose data failed verification
        key_id: String,
    },

    /// Metadata entry could not be interpreted
    #[error("invalid metadata {key}={value:?}")]
    InvalidMetadata {
        /// Metadata key
        key: &'static str,
        /// The rejected value
        value: String,
    },

    /// Algorithm or source tag not recognized
    #[error(transparent)]
    UnknownTag(#[from] UnknownTag),

    /// Decoded data could not form a key
    #[error(transparent)]
    InvalidKey(#[from] KeyError),
}
