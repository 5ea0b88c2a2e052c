//! Byte to Braille text codec

use zeroize::Zeroizing;

/// First code point of the Unicode Braille Patterns block.
pub const BRAILLE_BASE: u32 = 0x2800;

/// Map each byte `b` to the character `U+2800 + b`.
pub fn encode_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| char::from_u32(BRAILLE_BASE + u32::from(b)).unwrap_or_default())
        .collect()
}

/// Inverse of [`encode_bytes`].
///
/// Each code point maps to `(code point - 0x2800) mod 256`. Total: any text
/// decodes to something, but only text produced by [`encode_bytes`] decodes
/// faithfully.
pub fn decode_text(text: &str) -> Zeroizing<Vec<u8>> {
    let bytes = text
        .chars()
        .map(|symbol| {
            let offset = i64::from(u32::from(symbol)) - i64::from(BRAILLE_BASE);
            offset.rem_euclid(256) as u8
        })
        .collect();
    Zeroizing::new(bytes)
}
