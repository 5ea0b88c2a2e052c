//! Transport projection of a key

use std::collections::BTreeMap;

use zeroize::Zeroizing;

use crate::{checksum::verify_checksum, codec::decode_text};

/// A key prepared for text transport.
///
/// Metadata is ordered so formatting is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedKey {
    /// Identifier of the encoded key
    pub key_id: String,
    /// Key bytes as Braille text
    pub encoded_text: String,
    /// 16 uppercase hex characters
    pub checksum: String,
    /// Encoding time in milliseconds since the Unix epoch
    pub timestamp_millis: u64,
    /// Free-form string metadata
    pub metadata: BTreeMap<String, String>,
}

impl EncodedKey {
    /// Key bytes recovered from the encoded text.
    pub fn decoded_bytes(&self) -> Zeroizing<Vec<u8>> {
        decode_text(&self.encoded_text)
    }

    /// Whether the decoded bytes match the carried checksum.
    pub fn is_intact(&self) -> bool {
        verify_checksum(&self.decoded_bytes(), &self.checksum)
    }
}
