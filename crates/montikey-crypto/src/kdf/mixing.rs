//! Key mixing: random injection, XOR combination and stretching

use zeroize::{Zeroize, Zeroizing};

use super::derivation::derive_key_of_length;
use crate::{error::KdfError, primitives::sha256};

/// Number of random bytes needed to cover `random_bits` bits.
pub fn random_len_for_bits(random_bits: u32) -> usize {
    random_bits.div_ceil(8) as usize
}

/// XOR caller-provided random bytes into the low-order bytes of `key`.
///
/// Mixing only, never length-extending: the first `min(random.len(),
/// key.len())` bytes are XORed and the rest pass through unchanged. Use
/// [`random_len_for_bits`] to size `random`.
pub fn inject_random_component(key: &[u8], random: &[u8]) -> Zeroizing<Vec<u8>> {
    let mut result = Zeroizing::new(key.to_vec());
    for (byte, noise) in result.iter_mut().zip(random) {
        *byte ^= noise;
    }
    result
}

/// XOR-fold all keys into a buffer sized to the longest input.
///
/// Shorter keys only affect their overlapping prefix.
///
/// # Errors
///
/// - `NoFactors` if `keys` is empty
pub fn combine_keys<K: AsRef<[u8]>>(keys: &[K]) -> Result<Zeroizing<Vec<u8>>, KdfError> {
    if keys.is_empty() {
        return Err(KdfError::NoFactors { operation: "combine_keys" });
    }

    let max_len = keys.iter().map(|k| k.as_ref().len()).max().unwrap_or(0);
    let mut combined = Zeroizing::new(vec![0u8; max_len]);

    for key in keys {
        for (acc, byte) in combined.iter_mut().zip(key.as_ref()) {
            *acc ^= byte;
        }
    }

    Ok(combined)
}

/// Stretch key material with an iterated SHA-256 chain.
///
/// Applies SHA-256 `iterations` times with no per-round re-mixing of the
/// input, then fits the result with [`derive_key_of_length`]. This is a bare
/// hash chain, not a salted password KDF.
///
/// # Errors
///
/// - `InvalidIterations` if `iterations` is zero
/// - `InvalidLength` if `key_len` is zero
pub fn stretch_key(
    input: &[u8],
    iterations: u32,
    key_len: usize,
) -> Result<Zeroizing<Vec<u8>>, KdfError> {
    if iterations == 0 {
        return Err(KdfError::InvalidIterations { iterations });
    }
    if key_len == 0 {
        return Err(KdfError::InvalidLength { requested: key_len });
    }

    let mut stretched = sha256(input);
    for _ in 1..iterations {
        let next = sha256(&stretched);
        stretched.zeroize();
        stretched = next;
    }

    let key = derive_key_of_length(&stretched, key_len);
    stretched.zeroize();
    key
}
