//! Line-oriented transmission block

use std::collections::BTreeMap;

use crate::{
    encoded::EncodedKey,
    errors::{Result, TransportError},
};

/// First line of every block.
pub const TRANSMISSION_HEADER: &str = "MONTI-KEY:v1";

/// Last line of every block.
pub const TRANSMISSION_FOOTER: &str = "END-MONTI-KEY";

/// Prefix a block must start with to be parsed.
const HEADER_PREFIX: &str = "MONTI-KEY:";

/// Render the transmission block. Metadata lines are sorted by key.
pub fn format_transmission(key: &EncodedKey) -> String {
    let mut block = String::new();
    block.push_str(TRANSMISSION_HEADER);
    block.push('\n');
    push_line(&mut block, "ID:", &key.key_id);
    push_line(&mut block, "CHECKSUM:", &key.checksum);
    push_line(&mut block, "TIMESTAMP:", &key.timestamp_millis.to_string());
    for (name, value) in &key.metadata {
        block.push_str("META:");
        block.push_str(name);
        block.push('=');
        block.push_str(value);
        block.push('\n');
    }
    push_line(&mut block, "DATA:", &key.encoded_text);
    block.push_str(TRANSMISSION_FOOTER);
    block.push('\n');
    block
}

fn push_line(block: &mut String, prefix: &str, value: &str) {
    block.push_str(prefix);
    block.push_str(value);
    block.push('\n');
}

/// Parse a transmission block.
///
/// Lines are split on `\n` and matched by prefix; unknown lines (including
/// the version header and footer) are skipped and a repeated field keeps its
/// last value. `TIMESTAMP` defaults to 0 when absent. `META` lines split on
/// the first `=`; lines without one are ignored.
///
/// # Errors
///
/// - `MissingHeader` if `text` does not start with `MONTI-KEY:`
/// - `MissingField` if `ID`, `CHECKSUM` or `DATA` is absent
/// - `InvalidTimestamp` if `TIMESTAMP` is not a non-negative integer
pub fn parse_transmission(text: &str) -> Result<EncodedKey> {
    if !text.starts_with(HEADER_PREFIX) {
        return Err(TransportError::MissingHeader);
    }

    let mut key_id = None;
    let mut checksum = None;
    let mut timestamp_millis = 0u64;
    let mut encoded_text = None;
    let mut metadata = BTreeMap::new();

    for line in text.split('\n') {
        if let Some(value) = line.strip_prefix("ID:") {
            key_id = Some(value);
        } else if let Some(value) = line.strip_prefix("CHECKSUM:") {
            checksum = Some(value);
        } else if let Some(value) = line.strip_prefix("TIMESTAMP:") {
            timestamp_millis = value
                .parse()
                .map_err(|_| TransportError::InvalidTimestamp { value: value.to_string() })?;
        } else if let Some(entry) = line.strip_prefix("META:") {
            if let Some((name, value)) = entry.split_once('=') {
                metadata.insert(name.to_string(), value.to_string());
            }
        } else if let Some(value) = line.strip_prefix("DATA:") {
            encoded_text = Some(value);
        }
    }

    let key_id = key_id.ok_or(TransportError::MissingField { field: "ID" })?;
    let checksum = checksum.ok_or(TransportError::MissingField { field: "CHECKSUM" })?;
    let encoded_text = encoded_text.ok_or(TransportError::MissingField { field: "DATA" })?;

    Ok(EncodedKey {
        key_id: key_id.to_string(),
        encoded_text: encoded_text.to_string(),
        checksum: checksum.to_string(),
        timestamp_millis,
        metadata,
    })
}
