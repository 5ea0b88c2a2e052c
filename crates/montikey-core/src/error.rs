//! Errors from environment-backed key derivation

use montikey_crypto::KdfError;
use thiserror::Error;

use crate::{
    env::EntropyError,
    key::KeyError,
    sources::{CellularFactor, SourceUnavailable},
};

/// Errors from deriving keys out of entropy sources or intercepted data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeriveError {
    /// A factor's source is missing or refused to produce material
    #[error("{factor} unavailable: {reason}")]
    Unavailable {
        /// Factor that was requested
        factor: CellularFactor,
        /// Why the source could not supply it
        reason: SourceUnavailable,
    },

    /// Derivation engine rejected the input
    #[error(transparent)]
    Kdf(#[from] KdfError),

    /// Derived bytes could not form a key
    #[error(transparent)]
    Key(#[from] KeyError),

    /// Environment could not supply randomness
    #[error(transparent)]
    Entropy(#[from] EntropyError),
}

impl DeriveError {
    /// Returns true if retrying can never succeed.
    ///
    /// An unavailable source may come back (permission granted, radio
    /// attached) and entropy failures may be transient.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Unavailable { .. } | Self::Entropy(_) => false,
            Self::Kdf(_) | Self::Key(_) => true,
        }
    }
}
