//! CLI errors

use montikey_core::{DeriveError, EntropyError, KeyError, StoreError};
use montikey_crypto::KdfError;
use montikey_proto::TransportError;
use thiserror::Error;

/// Anything a command can fail with.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument was not valid hex
    #[error("invalid hex argument: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Argument was well-formed but unusable
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong
        reason: String,
    },

    /// Key derivation failed
    #[error(transparent)]
    Kdf(#[from] KdfError),

    /// Classifier or deriver failed
    #[error(transparent)]
    Derive(#[from] DeriveError),

    /// Key could not be constructed
    #[error(transparent)]
    Key(#[from] KeyError),

    /// Key store operation failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Environment could not supply randomness
    #[error(transparent)]
    Entropy(#[from] EntropyError),

    /// Transport text could not be parsed or imported
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Reading input or writing output failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument { reason: reason.into() }
    }
}
