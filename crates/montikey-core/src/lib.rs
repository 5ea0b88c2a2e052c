//! Key lifecycle for MontiKey.
//!
//! Turns raw material from untrusted channels into [`DerivedKey`]s, keeps them
//! in an explicitly owned [`KeyStore`], and classifies intercepted payloads as
//! candidate key material.
//!
//! # Architecture
//!
//! ```text
//! EntropySource ─► CellularKeyDeriver ──┐
//!                                       ├─► DerivedKey ─► KeyStore ─► encrypt/decrypt
//! payload ─► InterceptionClassifier ────┘                    │
//!                                                            └─► AuditLog
//! ```
//!
//! Time and randomness come from an injected [`Environment`], so the same code
//! runs against the OS in production and against a seeded simulation in
//! tests.
//!
//! # Security
//!
//! Encryption is CBC without authentication, and several entropy sources are
//! low-entropy identifiers. Both are properties of the key material this crate
//! manages, not something it hides.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod classifier;
pub mod env;
pub mod error;
pub mod key;
pub mod sources;
pub mod store;
mod sync;

pub use classifier::{
    CANDIDATE_KEY_LENGTHS, ClassifierEvent, ClassifierListener, Direction,
    InterceptionClassifier, classify_length,
};
pub use env::{EntropyError, Environment};
pub use error::DeriveError;
pub use key::{
    AlgorithmType, DerivedKey, KeyError, KeyMetadata, KeySource, SecurityContext, UnknownTag,
};
pub use sources::{
    CellularFactor, CellularKeyDeriver, EntropySource, IdentifierSource, SignalStrengthSource,
    SourceUnavailable, UnavailableSource,
};
pub use store::{
    AuditOperation, AuditRecord, DEFAULT_AUDIT_CAPACITY, KeyStore, KeyStoreConfig, StoreError,
};
