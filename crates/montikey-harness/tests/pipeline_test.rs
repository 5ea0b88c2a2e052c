//! End-to-end key pipeline under simulation.
//!
//! ```text
//! payload ─► classifier ─► sender store ─► encoder ─► wire text
//!                                                        │
//! receiver store ◄─ import ◄─ checksum ◄─ parse ◄────────┘
//! ```
//!
//! The sender encrypts with the intercepted key; the receiver must decrypt
//! the same ciphertext with the key it rebuilt from the wire.

use std::sync::Arc;

use montikey_core::{
    AlgorithmType, CellularFactor, CellularKeyDeriver, ClassifierEvent, Direction, Environment,
    IdentifierSource, InterceptionClassifier, KeyStore,
};
use montikey_harness::{RecordingListener, SimEnv};
use montikey_proto::{KeyEncoder, TransportError};

fn intercept(env: &SimEnv, payload: &[u8]) -> montikey_core::DerivedKey {
    let classifier = InterceptionClassifier::new(env.clone());
    let recorder = Arc::new(RecordingListener::new());
    classifier.add_listener(recorder.clone());

    classifier.observe("lock-ctrl", payload, Direction::Write);

    match recorder.events().into_iter().nth(1) {
        Some(ClassifierEvent::KeyIntercepted(key)) => key,
        other => panic!("expected intercepted key, got {other:?}"),
    }
}

#[test]
fn intercepted_key_travels_over_transmission_block() {
    let env = SimEnv::new();
    let sender = KeyStore::new(env.clone());
    let receiver = KeyStore::new(env.clone());
    let encoder = KeyEncoder::new(env.clone());

    let key = intercept(&env, &[0x5C; 32]);
    let key_id = key.key_id().to_string();
    sender.store(key.clone()).unwrap();
    let ciphertext = sender.encrypt(&key_id, b"open sesame").unwrap();

    env.advance(250);
    let wire = encoder.format_transmission(&encoder.encode_key(&key));
    let parsed = encoder.parse_transmission(&wire).unwrap();
    assert!(encoder.verify_checksum(&parsed, &key.key_bytes()));

    let imported = encoder.import_key(&parsed).unwrap();
    assert_eq!(imported.metadata().algorithm(), AlgorithmType::Aes256);
    receiver.store(imported).unwrap();

    assert_eq!(receiver.decrypt(&key_id, &ciphertext).unwrap(), b"open sesame");
}

#[test]
fn compact_form_imports_with_default_metadata() {
    let env = SimEnv::new();
    let encoder = KeyEncoder::new(env.clone());
    let key = intercept(&env, &[0x11; 16]);

    let line = encoder.format_compact(&encoder.encode_key(&key));
    let imported = encoder.import_key(&encoder.parse_compact(&line).unwrap()).unwrap();

    assert_eq!(imported.key_bytes(), key.key_bytes());
    assert_eq!(imported.metadata().algorithm(), AlgorithmType::Aes128);
    assert_eq!(imported.metadata().version(), 1);
}

#[test]
fn tampered_wire_text_is_refused() {
    let env = SimEnv::new();
    let encoder = KeyEncoder::new(env.clone());
    let key = intercept(&env, &[0x22; 16]);

    let wire = encoder.format_transmission(&encoder.encode_key(&key));
    // Flip the first data symbol to a different Braille pattern
    let tampered = wire.replacen("DATA:\u{2822}", "DATA:\u{2823}", 1);
    assert_ne!(tampered, wire);

    let parsed = encoder.parse_transmission(&tampered).unwrap();
    assert!(!parsed.is_intact());
    assert_eq!(
        encoder.import_key(&parsed).unwrap_err(),
        TransportError::ChecksumMismatch { key_id: key.key_id().to_string() }
    );
}

#[test]
fn rotated_cellular_key_round_trips() {
    let env = SimEnv::with_seed(42);
    let deriver = CellularKeyDeriver::new(env.clone())
        .with_source(CellularFactor::Imei, IdentifierSource::new("imei", "356938035643809"));
    let store = KeyStore::new(env.clone());
    let encoder = KeyEncoder::new(env.clone());

    let base = deriver.derive_from(CellularFactor::Imei, 16).unwrap();
    let base_id = base.key_id().to_string();
    store.store(base).unwrap();
    env.advance(1_000);
    let rotated = store.rotate(&base_id).unwrap();

    let wire = encoder.format_transmission(&encoder.encode_key(&rotated));
    let imported = encoder.import_key(&encoder.parse_transmission(&wire).unwrap()).unwrap();

    assert_eq!(imported.key_id(), format!("{base_id}_v2"));
    assert_eq!(imported.metadata().version(), 2);
    assert_eq!(imported.key_bytes(), rotated.key_bytes());
}

#[test]
fn same_seed_same_wire_text() {
    let wire = |seed| {
        let env = SimEnv::with_seed(seed);
        let deriver = CellularKeyDeriver::new(env.clone())
            .with_source(CellularFactor::Imei, IdentifierSource::new("imei", "490154203237518"));
        let encoder = KeyEncoder::new(env.clone());
        let base = deriver.derive_from(CellularFactor::Imei, 16).unwrap();
        let hybrid = deriver.inject_random_component(&base, 128).unwrap();
        encoder.format_compact(&encoder.encode_key(&hybrid))
    };

    assert_eq!(wire(3), wire(3));
    assert_ne!(wire(3), wire(4));
}

#[test]
fn transmission_block_snapshot() {
    let env = SimEnv::new();
    let encoder = KeyEncoder::new(env.clone());
    let payload: Vec<u8> = (0x41..=0x50).collect();
    let key = intercept(&env, &payload);

    assert_eq!(env.now_millis(), 1_700_000_000_000);
    insta::assert_snapshot!(encoder.format_transmission(&encoder.encode_key(&key)), @r"
    MONTI-KEY:v1
    ID:WIRELESS_lock-ctr_1700000000000
    CHECKSUM:E7E8B89C2721D290
    TIMESTAMP:1700000000000
    META:algorithm=AES_128
    META:length=128
    META:source=WIRELESS_INTERCEPT
    META:version=1
    DATA:⡁⡂⡃⡄⡅⡆⡇⡈⡉⡊⡋⡌⡍⡎⡏⡐
    END-MONTI-KEY
    ");
}
