//! Fuzz target for the Braille codec
//!
//! - Bytes survive encode/decode exactly
//! - Decoding arbitrary text yields one byte per code point

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use montikey_proto::{calculate_checksum, decode_text, encode_bytes, verify_checksum};

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    bytes: &'a [u8],
    text: &'a str,
}

fuzz_target!(|input: Input<'_>| {
    let encoded = encode_bytes(input.bytes);
    let decoded = decode_text(&encoded);
    assert_eq!(&decoded[..], input.bytes);
    assert!(verify_checksum(&decoded, &calculate_checksum(input.bytes)));

    assert_eq!(decode_text(input.text).len(), input.text.chars().count());
});
