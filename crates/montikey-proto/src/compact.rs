//! Single-line compact form: `id|checksum|timestamp|data`

use std::collections::BTreeMap;

use crate::{
    encoded::EncodedKey,
    errors::{Result, TransportError},
};

/// Field separator of the compact form.
pub const COMPACT_SEPARATOR: char = '|';

const COMPACT_FIELDS: usize = 4;

/// Render `id|checksum|timestamp|data`. Metadata is dropped.
pub fn format_compact(key: &EncodedKey) -> String {
    format!(
        "{}{COMPACT_SEPARATOR}{}{COMPACT_SEPARATOR}{}{COMPACT_SEPARATOR}{}",
        key.key_id, key.checksum, key.timestamp_millis, key.encoded_text
    )
}

/// Parse the compact form.
///
/// Splits on every `|`, so an id containing `|` cannot round-trip.
///
/// # Errors
///
/// - `FieldCount` unless there are exactly four fields
/// - `InvalidTimestamp` if the third field is not a non-negative integer
pub fn parse_compact(text: &str) -> Result<EncodedKey> {
    let fields: Vec<&str> = text.split(COMPACT_SEPARATOR).collect();
    let [key_id, checksum, timestamp, encoded_text] = fields.as_slice() else {
        return Err(TransportError::FieldCount { expected: COMPACT_FIELDS, actual: fields.len() });
    };

    let timestamp_millis = timestamp
        .parse()
        .map_err(|_| TransportError::InvalidTimestamp { value: (*timestamp).to_string() })?;

    Ok(EncodedKey {
        key_id: (*key_id).to_string(),
        encoded_text: (*encoded_text).to_string(),
        checksum: (*checksum).to_string(),
        timestamp_millis,
        metadata: BTreeMap::new(),
    })
}
