//! Environment abstraction for deterministic testing.
//!
//! Decouples key lifecycle logic from system resources (wall clock,
//! randomness). Production uses the OS clock and RNG; simulation uses a
//! virtual clock and a seeded RNG so every derived key, IV and audit timestamp
//! is reproducible.

use thiserror::Error;
use zeroize::Zeroizing;

/// Randomness could not be produced.
///
/// Surfaces as a primitive failure at the store boundary. Never retried
/// internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("entropy unavailable: {reason}")]
pub struct EntropyError {
    /// Why the source failed
    pub reason: String,
}

impl EntropyError {
    /// Create an entropy error with a reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// Abstract environment providing wall-clock time and randomness.
///
/// # Invariants
///
/// Implementations MUST guarantee:
///
/// - `now_millis()` never goes backwards within one environment
/// - `random_bytes()` uses cryptographically secure entropy in production
/// - a failed `random_bytes()` leaves no partially random output the caller
///   could mistake for success
pub trait Environment: Clone + Send + Sync + 'static {
    /// Milliseconds since the Unix epoch.
    ///
    /// Used for key creation timestamps, audit records and key identifiers.
    fn now_millis(&self) -> u64;

    /// Fills the provided buffer with random bytes.
    ///
    /// # Invariants
    ///
    /// - Given the same RNG seed, this produces the same sequence of bytes
    fn random_bytes(&self, buffer: &mut [u8]) -> Result<(), EntropyError>;

    /// Allocates `len` random bytes in a buffer that is wiped on drop.
    fn random_vec(&self, len: usize) -> Result<Zeroizing<Vec<u8>>, EntropyError> {
        let mut bytes = Zeroizing::new(vec![0u8; len]);
        self.random_bytes(&mut bytes)?;
        Ok(bytes)
    }
}

#[cfg(test)]
pub(crate) mod test_env {
    //! Minimal deterministic environment for unit tests inside this crate.

    use std::sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    };

    use super::{EntropyError, Environment};

    /// Fixed clock, counter-based "randomness".
    #[derive(Clone, Default)]
    pub(crate) struct TestEnv {
        now: Arc<AtomicU64>,
        counter: Arc<AtomicU64>,
        fail_entropy: Arc<AtomicBool>,
    }

    impl TestEnv {
        pub(crate) fn at(millis: u64) -> Self {
            let env = Self::default();
            env.now.store(millis, Ordering::SeqCst);
            env
        }

        pub(crate) fn advance(&self, millis: u64) {
            self.now.fetch_add(millis, Ordering::SeqCst);
        }

        pub(crate) fn set_entropy_failure(&self, fail: bool) {
            self.fail_entropy.store(fail, Ordering::SeqCst);
        }
    }

    impl Environment for TestEnv {
        fn now_millis(&self) -> u64 {
            self.now.load(Ordering::SeqCst)
        }

        fn random_bytes(&self, buffer: &mut [u8]) -> Result<(), EntropyError> {
            if self.fail_entropy.load(Ordering::SeqCst) {
                return Err(EntropyError::new("entropy disabled"));
            }
            for byte in buffer.iter_mut() {
                *byte = (self.counter.fetch_add(1, Ordering::SeqCst) % 251) as u8 ^ 0x5A;
            }
            Ok(())
        }
    }
}
