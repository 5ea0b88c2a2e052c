//! Property tests for the transport encoding.
//!
//! These verify the invariants the transport relies on:
//! - Every byte maps to one Braille code point and back
//! - A transmission block or compact line carries all of its fields intact
//! - Any single-byte change is caught by the checksum
//! - Parsers reject malformed input with an error instead of panicking

use std::collections::BTreeMap;

use montikey_core::{AlgorithmType, DerivedKey, Environment, KeyMetadata, KeySource};
use montikey_harness::SimEnv;
use montikey_proto::{
    BRAILLE_BASE, CHECKSUM_LEN, EncodedKey, KeyEncoder, TransportError, calculate_checksum,
    decode_text, encode_bytes, format_compact, format_transmission, parse_compact,
    parse_transmission, verify_checksum,
};
use proptest::prelude::*;

fn encoded_key() -> impl Strategy<Value = EncodedKey> {
    (
        "[A-Za-z0-9_]{1,24}",
        prop::collection::vec(any::<u8>(), 1..64),
        any::<u64>(),
        prop::collection::btree_map("[a-z_]{1,10}", "[A-Za-z0-9 _.=,-]{0,20}", 0..5),
    )
        .prop_map(|(key_id, bytes, timestamp_millis, metadata)| EncodedKey {
            key_id,
            encoded_text: encode_bytes(&bytes),
            checksum: calculate_checksum(&bytes),
            timestamp_millis,
            metadata,
        })
}

proptest! {
    #[test]
    fn prop_codec_round_trip(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let text = encode_bytes(&bytes);

        prop_assert_eq!(text.chars().count(), bytes.len());
        let braille = BRAILLE_BASE..BRAILLE_BASE + 256;
        prop_assert!(text.chars().all(|c| braille.contains(&(c as u32))));
        prop_assert_eq!(&decode_text(&text)[..], &bytes[..]);
    }

    #[test]
    fn prop_decode_never_panics(text in any::<String>()) {
        let decoded = decode_text(&text);
        prop_assert_eq!(decoded.len(), text.chars().count());
    }

    #[test]
    fn prop_checksum_shape(bytes in prop::collection::vec(any::<u8>(), 0..128)) {
        let checksum = calculate_checksum(&bytes);

        prop_assert_eq!(checksum.len(), CHECKSUM_LEN);
        prop_assert!(checksum.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
        prop_assert!(verify_checksum(&bytes, &checksum));
        if checksum.chars().any(|c| c.is_ascii_alphabetic()) {
            // Comparison is case-sensitive
            prop_assert!(!verify_checksum(&bytes, &checksum.to_lowercase()));
        }
    }

    #[test]
    fn prop_checksum_catches_byte_change(
        bytes in prop::collection::vec(any::<u8>(), 1..128),
        index in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let checksum = calculate_checksum(&bytes);
        let mut tampered = bytes.clone();
        tampered[index.index(bytes.len())] ^= flip;

        prop_assert!(!verify_checksum(&tampered, &checksum));
    }

    #[test]
    fn prop_transmission_round_trip(key in encoded_key()) {
        let parsed = parse_transmission(&format_transmission(&key)).unwrap();
        prop_assert_eq!(&parsed, &key);
        prop_assert!(parsed.is_intact());
    }

    #[test]
    fn prop_compact_round_trip_drops_metadata(key in encoded_key()) {
        let parsed = parse_compact(&format_compact(&key)).unwrap();

        prop_assert_eq!(&parsed.key_id, &key.key_id);
        prop_assert_eq!(&parsed.checksum, &key.checksum);
        prop_assert_eq!(parsed.timestamp_millis, key.timestamp_millis);
        prop_assert_eq!(&parsed.encoded_text, &key.encoded_text);
        prop_assert!(parsed.metadata.is_empty());
    }

    #[test]
    fn prop_parsers_never_panic(text in any::<String>()) {
        let _ = parse_transmission(&text);
        let _ = parse_compact(&text);
    }
}

#[test]
fn transmission_requires_header() {
    let result = parse_transmission("ID:k\nCHECKSUM:00\nDATA:\u{2801}\n");
    assert_eq!(result, Err(TransportError::MissingHeader));
}

#[test]
fn transmission_requires_id_checksum_and_data() {
    for (text, field) in [
        ("MONTI-KEY:v1\nCHECKSUM:00\nDATA:\u{2801}\n", "ID"),
        ("MONTI-KEY:v1\nID:k\nDATA:\u{2801}\n", "CHECKSUM"),
        ("MONTI-KEY:v1\nID:k\nCHECKSUM:00\n", "DATA"),
    ] {
        assert_eq!(parse_transmission(text), Err(TransportError::MissingField { field }));
    }
}

#[test]
fn transmission_rejects_negative_timestamp() {
    let text = "MONTI-KEY:v1\nID:k\nCHECKSUM:00\nTIMESTAMP:-5\nDATA:\u{2801}\nEND-MONTI-KEY\n";
    assert!(matches!(parse_transmission(text), Err(TransportError::InvalidTimestamp { .. })));
}

#[test]
fn transmission_accepts_future_versions_and_defaults() {
    let text = "MONTI-KEY:v2\nID:k\nCHECKSUM:00\nMETA:broken\nMETA:a=b=c\nDATA:\u{2801}\n";
    let parsed = parse_transmission(text).unwrap();

    assert_eq!(parsed.timestamp_millis, 0);
    assert_eq!(parsed.metadata, BTreeMap::from([("a".to_string(), "b=c".to_string())]));
}

#[test]
fn compact_field_count_is_exact() {
    assert_eq!(
        parse_compact("a|b|c"),
        Err(TransportError::FieldCount { expected: 4, actual: 3 })
    );
    assert_eq!(
        parse_compact("a|b|1|d|e"),
        Err(TransportError::FieldCount { expected: 4, actual: 5 })
    );
}

#[test]
fn encoder_import_round_trip() {
    let env = SimEnv::new();
    let encoder = KeyEncoder::new(env.clone());
    env.advance(1_000);
    let metadata =
        KeyMetadata::new(KeySource::WirelessIntercept, AlgorithmType::TripleDes, "ble", 4);
    let key = DerivedKey::new(&[0x3C; 24], "BLE_1", metadata, 7).unwrap();

    let wire = encoder.format_transmission(&encoder.encode_key(&key));
    let imported = encoder.import_key(&encoder.parse_transmission(&wire).unwrap()).unwrap();

    assert_eq!(imported.key_bytes(), key.key_bytes());
    assert_eq!(imported.key_id(), "BLE_1");
    assert_eq!(imported.metadata().algorithm(), AlgorithmType::TripleDes);
    assert_eq!(imported.metadata().source(), KeySource::WirelessIntercept);
    assert_eq!(imported.metadata().version(), 4);
    assert_eq!(imported.created_at_millis(), env.now_millis());
}
