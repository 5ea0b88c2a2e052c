//! MontiKey transport encoding.
//!
//! Serializes keys for channels that only carry printable text.
//!
//! # Transmission Format
//!
//! ```text
//! MONTI-KEY:v1
//! ID:<key id>
//! CHECKSUM:<16 uppercase hex chars>
//! TIMESTAMP:<millis>
//! META:<k>=<v>          (zero or more, sorted by key)
//! DATA:<braille text>
//! END-MONTI-KEY
//! ```
//!
//! Every line, including the last, ends with `\n`. The compact form
//! `id|checksum|timestamp|data` carries no metadata.
//!
//! Key bytes map one-to-one onto the Braille Patterns block (`U+2800 + b`),
//! so the encoded text is always exactly as many characters as the key has
//! bytes.
//!
//! # Integrity
//!
//! The checksum is the first 8 bytes of SHA-256 over the key. It detects
//! corruption, not tampering: anyone who can alter the data can recompute it.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod checksum;
mod codec;
mod compact;
mod encoded;
mod encoder;
mod errors;
mod transmission;

pub use checksum::{CHECKSUM_LEN, calculate_checksum, verify_checksum};
pub use codec::{BRAILLE_BASE, decode_text, encode_bytes};
pub use compact::{COMPACT_SEPARATOR, format_compact, parse_compact};
pub use encoded::EncodedKey;
pub use encoder::KeyEncoder;
pub use errors::{Result, TransportError};
pub use transmission::{
    TRANSMISSION_FOOTER, TRANSMISSION_HEADER, format_transmission, parse_transmission,
};
