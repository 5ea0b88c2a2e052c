//! Deterministic simulation harness for MontiKey testing.
//!
//! [`SimEnv`] replaces the wall clock and OS randomness with a virtual clock
//! and a seeded RNG, so every key, IV and audit timestamp in a test is
//! reproducible from its seed. Entropy failure can be switched on to exercise
//! error paths.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference implementation of the key store.
//! Operations are applied to both the model and a real [`KeyStore`], and
//! their observable outcomes are compared.
//!
//! [`KeyStore`]: montikey_core::KeyStore

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod listener;
pub mod model;
pub mod sim_env;

pub use listener::RecordingListener;
pub use model::{ModelOutcome, StoreModel, StoreOperation, apply_to_store};
pub use sim_env::SimEnv;
