//! Truncated SHA-256 integrity checksum

use montikey_crypto::{sha256, to_hex_upper};

/// Checksum length in hex characters (8 bytes of digest).
pub const CHECKSUM_LEN: usize = 16;

/// First 8 bytes of SHA-256 over `data`, as uppercase hex.
pub fn calculate_checksum(data: &[u8]) -> String {
    to_hex_upper(&sha256(data)[..CHECKSUM_LEN / 2])
}

/// Recompute and compare. Comparison is case-sensitive.
pub fn verify_checksum(data: &[u8], checksum: &str) -> bool {
    calculate_checksum(data) == checksum
}
