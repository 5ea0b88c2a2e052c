//! Hash-based key derivation

use zeroize::{Zeroize, Zeroizing};

use crate::{error::KdfError, primitives::sha256};

/// MIFARE Classic keys are 6 bytes (48 bits)
pub const MIFARE_KEY_LEN: usize = 6;

/// Fit `hash` to exactly `key_len` bytes.
///
/// Truncates when `hash` is long enough. Otherwise the output starts with
/// `hash` and is extended by hash-chaining: each following chunk is
/// `SHA256(previous chunk)`, and the final chunk contributes only the bytes
/// still needed.
///
/// ```text
/// hash || SHA256(hash) || SHA256(SHA256(hash)) || ...   truncated to key_len
/// ```
///
/// Deterministic for the same `(hash, key_len)`.
///
/// # Errors
///
/// - `InvalidLength` if `key_len` is zero
/// - `EmptyInput` if `hash` is empty and extension would be needed
pub fn derive_key_of_length(hash: &[u8], key_len: usize) -> Result<Zeroizing<Vec<u8>>, KdfError> {
    if key_len == 0 {
        return Err(KdfError::InvalidLength { requested: key_len });
    }

    if hash.len() >= key_len {
        return Ok(Zeroizing::new(hash[..key_len].to_vec()));
    }

    if hash.is_empty() {
        return Err(KdfError::EmptyInput { operation: "derive_key_of_length" });
    }

    let mut extended = Zeroizing::new(Vec::with_capacity(key_len));
    let mut current = Zeroizing::new(hash.to_vec());

    while extended.len() < key_len {
        let copy_len = current.len().min(key_len - extended.len());
        extended.extend_from_slice(&current[..copy_len]);

        if extended.len() < key_len {
            let next = sha256(&current);
            current.zeroize();
            current.extend_from_slice(&next);
        }
    }

    debug_assert_eq!(extended.len(), key_len);
    Ok(extended)
}

/// Derive a key from several input factors.
///
/// Factors are concatenated byte-for-byte in call order (order is
/// significant), hashed with SHA-256, and fitted with
/// [`derive_key_of_length`]. Empty factors contribute nothing and are skipped
/// without error. The concatenation buffer is wiped before returning.
///
/// # Errors
///
/// - `NoFactors` if `factors` is empty
/// - `InvalidLength` if `key_len` is zero
pub fn derive_key_from_factors<F: AsRef<[u8]>>(
    factors: &[F],
    key_len: usize,
) -> Result<Zeroizing<Vec<u8>>, KdfError> {
    if factors.is_empty() {
        return Err(KdfError::NoFactors { operation: "derive_key_from_factors" });
    }

    let total: usize = factors.iter().map(|f| f.as_ref().len()).sum();
    let mut combined = Zeroizing::new(Vec::with_capacity(total));
    for factor in factors {
        combined.extend_from_slice(factor.as_ref());
    }

    let mut hash = sha256(&combined);
    combined.zeroize();

    let key = derive_key_of_length(&hash, key_len);
    hash.zeroize();
    key
}

/// Derive a key from string data (device identifiers, phone numbers).
///
/// # Errors
///
/// - `EmptyInput` if `data` is empty
/// - `InvalidLength` if `key_len` is zero
pub fn derive_key_from_string(data: &str, key_len: usize) -> Result<Zeroizing<Vec<u8>>, KdfError> {
    if data.is_empty() {
        return Err(KdfError::EmptyInput { operation: "derive_key_from_string" });
    }

    let mut hash = sha256(data.as_bytes());
    let key = derive_key_of_length(&hash, key_len);
    hash.zeroize();
    key
}

/// Derive a key from an integer reading (signal strength and similar).
///
/// The value is hashed as its 4-byte big-endian encoding.
pub fn derive_key_from_int(value: i32, key_len: usize) -> Result<Zeroizing<Vec<u8>>, KdfError> {
    let hash = sha256(&value.to_be_bytes());
    derive_key_of_length(&hash, key_len)
}

/// Derive a 6-byte MIFARE Classic key: SHA-256 truncated to 6 bytes.
///
/// # Errors
///
/// - `EmptyInput` if `data` is empty
pub fn derive_mifare_key(data: &[u8]) -> Result<Zeroizing<Vec<u8>>, KdfError> {
    if data.is_empty() {
        return Err(KdfError::EmptyInput { operation: "derive_mifare_key" });
    }

    let mut hash = sha256(data);
    let key = Zeroizing::new(hash[..MIFARE_KEY_LEN].to_vec());
    hash.zeroize();
    Ok(key)
}

/// Build a derivation context label: `<purpose>_v<version>`.
pub fn create_context(purpose: &str, version: u32) -> String {
    format!("{purpose}_v{version}")
}

/// Derive a key bound to a context label.
///
/// Equivalent to `derive_key_from_factors(&[data, context], key_len)`.
pub fn derive_key_with_context(
    data: &[u8],
    context: &str,
    key_len: usize,
) -> Result<Zeroizing<Vec<u8>>, KdfError> {
    derive_key_from_factors(&[data, context.as_bytes()], key_len)
}
