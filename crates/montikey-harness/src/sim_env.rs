//! Simulated environment with virtual time and seeded randomness

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use montikey_core::{EntropyError, Environment};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Seed used by [`SimEnv::new`].
pub const DEFAULT_SEED: u64 = 0x4D4F_4E54_494B_4559;

/// Virtual clock start used by [`SimEnv::new`] (2023-11-14T22:13:20Z).
pub const DEFAULT_START_MILLIS: u64 = 1_700_000_000_000;

/// Deterministic environment for tests.
///
/// Clone shares the clock, RNG and failure switch, so a test can hold one
/// handle while the store holds another.
///
/// # Invariants
///
/// - The clock only moves when [`advance`](Self::advance) is called
/// - Same seed, same sequence of random bytes
#[derive(Clone)]
pub struct SimEnv {
    rng: Arc<Mutex<ChaCha20Rng>>,
    now_millis: Arc<AtomicU64>,
    fail_entropy: Arc<AtomicBool>,
}

impl SimEnv {
    /// Environment with [`DEFAULT_SEED`] at [`DEFAULT_START_MILLIS`].
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    /// Environment with a specific seed at [`DEFAULT_START_MILLIS`].
    pub fn with_seed(seed: u64) -> Self {
        Self::with_seed_at(seed, DEFAULT_START_MILLIS)
    }

    /// Environment with a specific seed and clock start.
    pub fn with_seed_at(seed: u64, start_millis: u64) -> Self {
        Self {
            rng: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))),
            now_millis: Arc::new(AtomicU64::new(start_millis)),
            fail_entropy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Move the virtual clock forward.
    pub fn advance(&self, millis: u64) {
        self.now_millis.fetch_add(millis, Ordering::SeqCst);
    }

    /// Make every subsequent `random_bytes` call fail (or succeed again).
    pub fn set_entropy_failure(&self, fail: bool) {
        tracing::debug!(fail, "simulated entropy failure toggled");
        self.fail_entropy.store(fail, Ordering::SeqCst);
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SimEnv {
    fn now_millis(&self) -> u64 {
        self.now_millis.load(Ordering::SeqCst)
    }

    fn random_bytes(&self, buffer: &mut [u8]) -> Result<(), EntropyError> {
        if self.fail_entropy.load(Ordering::SeqCst) {
            return Err(EntropyError::new("simulated entropy failure"));
        }
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
        Ok(())
    }
}
