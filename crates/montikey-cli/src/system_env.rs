//! Production Environment implementation using system time and RNG.
//!
//! `SystemEnv` reads the wall clock and the OS cryptographic RNG. Output is
//! not reproducible; use the harness `SimEnv` where determinism matters.

use std::time::{SystemTime, UNIX_EPOCH};

use montikey_core::{EntropyError, Environment};

/// Production environment using the system clock and getrandom.
///
/// # Security
///
/// getrandom provides OS-level cryptographic randomness (`getrandom(2)` or
/// `/dev/urandom` on Linux, `BCryptGenRandom` on Windows). An RNG failure is
/// reported as [`EntropyError`] and surfaces through whichever operation
/// needed the bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    /// Milliseconds since the Unix epoch. A clock set before 1970 reads as 0.
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
    }

    fn random_bytes(&self, buffer: &mut [u8]) -> Result<(), EntropyError> {
        getrandom::fill(buffer).map_err(|err| EntropyError::new(err.to_string()))
    }
}
