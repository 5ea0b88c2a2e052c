//! Error types for derivation and cipher primitives

use thiserror::Error;

/// Errors from the key derivation engine.
///
/// These are the explicit "unavailable" outcomes: a derivation that cannot
/// produce key bytes says why instead of returning an empty buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KdfError {
    /// Requested key length was zero
    #[error("invalid key length: {requested} bytes")]
    InvalidLength {
        /// Requested key length in bytes
        requested: usize,
    },

    /// Input material was empty where material is required
    #[error("empty input for {operation}")]
    EmptyInput {
        /// Derivation that rejected the input
        operation: &'static str,
    },

    /// No factors were supplied to a multi-factor operation
    #[error("no factors provided for {operation}")]
    NoFactors {
        /// Derivation that rejected the input
        operation: &'static str,
    },

    /// Stretching was requested with zero iterations
    #[error("invalid iteration count: {iterations}")]
    InvalidIterations {
        /// Requested iteration count
        iterations: u32,
    },
}

/// Errors from the underlying cipher primitives.
///
/// Callers treat these as opaque failures. Nothing partial is ever returned
/// alongside one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrimitiveError {
    /// Key length not accepted by the cipher
    #[error("invalid {cipher} key length: {actual} bytes")]
    InvalidKeyLength {
        /// Cipher name
        cipher: &'static str,
        /// Length that was supplied
        actual: usize,
    },

    /// IV length does not match the cipher block size
    #[error("invalid IV length: expected {expected}, got {actual}")]
    InvalidIvLength {
        /// Required IV length
        expected: usize,
        /// Length that was supplied
        actual: usize,
    },

    /// Decryption produced invalid padding (wrong key or corrupted data)
    #[error("{cipher} decryption failed: bad padding")]
    Padding {
        /// Cipher name
        cipher: &'static str,
    },
}

impl PrimitiveError {
    /// Returns true if retrying with the same inputs can never succeed.
    ///
    /// Every primitive failure is deterministic in its inputs, so all of them
    /// are fatal for the call that produced them.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::InvalidKeyLength { .. } | Self::InvalidIvLength { .. } | Self::Padding { .. } => {
                true
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kdf_error_display() {
        let err = KdfError::InvalidLength { requested: 0 };
        assert_eq!(err.to_string(), "invalid key length: 0 bytes");

        let err = KdfError::NoFactors { operation: "combine_keys" };
        assert_eq!(err.to_string(), "no factors provided for combine_keys");
    }

    #[test]
    fn primitive_error_display() {
        let err = PrimitiveError::InvalidKeyLength { cipher: "AES", actual: 7 };
        assert_eq!(err.to_string(), "invalid AES key length: 7 bytes");

        let err = PrimitiveError::InvalidIvLength { expected: 16, actual: 8 };
        assert_eq!(err.to_string(), "invalid IV length: expected 16, got 8");
    }

    #[test]
    fn primitive_errors_are_fatal() {
        assert!(PrimitiveError::Padding { cipher: "DES" }.is_fatal());
    }
}
