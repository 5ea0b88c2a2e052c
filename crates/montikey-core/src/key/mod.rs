//! Key model: the secret, its provenance metadata, and per-subsystem
//! operation logs.

mod context;
mod derived;
mod metadata;

pub use context::SecurityContext;
pub use derived::{DerivedKey, KeyError};
pub use metadata::{AlgorithmType, KeyMetadata, KeySource, UnknownTag};
