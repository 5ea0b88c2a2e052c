//! Key store behaviour under load and across threads.
//!
//! Covers:
//! - Audit log never exceeds its capacity and evicts oldest first
//! - Every symmetric algorithm round-trips every plaintext length
//! - IVs are fresh per encryption
//! - Concurrent store/retrieve from many threads loses nothing

use std::{sync::Arc, thread};

use montikey_core::{
    AlgorithmType, AuditOperation, DEFAULT_AUDIT_CAPACITY, DerivedKey, Environment, KeyMetadata,
    KeySource, KeyStore, KeyStoreConfig, StoreError,
};
use montikey_harness::SimEnv;
use proptest::prelude::*;

fn random_key(env: &SimEnv, id: &str, algorithm: AlgorithmType) -> DerivedKey {
    let secret = env.random_vec(algorithm.key_len()).unwrap();
    let metadata = KeyMetadata::new(KeySource::Manual, algorithm, "test key", 1);
    DerivedKey::new(&secret, id, metadata, env.now_millis()).unwrap()
}

#[test]
fn audit_log_is_capped_at_default_capacity() {
    let env = SimEnv::new();
    let store = KeyStore::new(env.clone());
    store.store(random_key(&env, "k", AlgorithmType::Aes128)).unwrap();

    for i in 0..1_500u64 {
        env.advance(1);
        let _ = store.retrieve(if i % 2 == 0 { "k" } else { "missing" });
    }

    let log = store.audit_log();
    assert_eq!(log.len(), DEFAULT_AUDIT_CAPACITY);
    // INIT and STORE were evicted long ago
    assert!(log.iter().all(|r| r.operation == AuditOperation::Retrieve));
    assert!(log.windows(2).all(|w| w[0].timestamp_millis < w[1].timestamp_millis));
    assert_eq!(log.last().map(|r| r.key_id.as_str()), Some("missing"));
}

#[test]
fn configured_capacity_is_clamped() {
    let env = SimEnv::new();
    let zero = KeyStore::with_config(env.clone(), KeyStoreConfig { audit_capacity: 0 });
    let huge = KeyStore::with_config(env, KeyStoreConfig { audit_capacity: 50_000 });

    assert_eq!(zero.audit_capacity(), 1);
    assert_eq!(huge.audit_capacity(), DEFAULT_AUDIT_CAPACITY);
}

#[test]
fn round_trip_all_algorithms_and_boundary_lengths() {
    let env = SimEnv::with_seed(42);
    let store = KeyStore::new(env.clone());
    let algorithms = [
        AlgorithmType::Aes128,
        AlgorithmType::Aes256,
        AlgorithmType::Des,
        AlgorithmType::TripleDes,
    ];

    for algorithm in algorithms {
        let id = algorithm.to_string();
        store.store(random_key(&env, &id, algorithm)).unwrap();

        for len in [0usize, 1, 7, 8, 15, 16, 17, 1000] {
            let plaintext: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let ciphertext = store.encrypt(&id, &plaintext).unwrap();
            assert_eq!(store.decrypt(&id, &ciphertext).unwrap(), plaintext, "{algorithm} {len}");
        }
    }
}

#[test]
fn encryption_uses_fresh_iv() {
    let env = SimEnv::new();
    let store = KeyStore::new(env.clone());
    store.store(random_key(&env, "k", AlgorithmType::Aes256)).unwrap();

    let first = store.encrypt("k", b"same plaintext").unwrap();
    let second = store.encrypt("k", b"same plaintext").unwrap();

    assert_ne!(first[..16], second[..16]);
    assert_ne!(first, second);
}

#[test]
fn encrypt_without_entropy_fails_and_is_audited() {
    let env = SimEnv::new();
    let store = KeyStore::new(env.clone());
    store.store(random_key(&env, "k", AlgorithmType::Aes128)).unwrap();

    env.set_entropy_failure(true);
    let result = store.encrypt("k", b"data");

    assert!(matches!(result, Err(StoreError::Entropy(_))));
    let last = store.audit_log().pop().unwrap();
    assert_eq!(last.operation, AuditOperation::Encrypt);
    assert!(!last.success);
}

#[test]
fn rotate_without_entropy_leaves_store_unchanged() {
    let env = SimEnv::new();
    let store = KeyStore::new(env.clone());
    store.store(random_key(&env, "k", AlgorithmType::Aes128)).unwrap();

    env.set_entropy_failure(true);
    assert!(store.rotate("k").is_err());
    assert_eq!(store.list_ids(), vec!["k".to_string()]);
}

#[test]
fn concurrent_stores_are_all_visible() {
    let env = SimEnv::new();
    let store = KeyStore::new(env.clone());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let store = store.clone();
            let env = env.clone();
            thread::spawn(move || {
                for i in 0..25 {
                    let id = format!("t{t}_k{i}");
                    store.store(random_key(&env, &id, AlgorithmType::Aes128)).unwrap();
                    assert!(store.retrieve(&id).is_ok());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.count(), 200);
    // INIT + 200 STORE + 200 RETRIEVE
    assert_eq!(store.audit_log().len(), 401);
}

#[test]
fn clones_share_security_context() {
    let store = Arc::new(KeyStore::new(SimEnv::new()));
    let clone = (*store).clone();

    store.clear_all();
    assert_eq!(
        clone.security_context().operations(),
        store.security_context().operations()
    );
}

proptest! {
    #[test]
    fn prop_round_trip_any_plaintext(
        seed in any::<u64>(),
        plaintext in prop::collection::vec(any::<u8>(), 0..300),
        selector in 0usize..4,
    ) {
        let algorithm = [
            AlgorithmType::Aes128,
            AlgorithmType::Aes256,
            AlgorithmType::Des,
            AlgorithmType::TripleDes,
        ][selector];
        let env = SimEnv::with_seed(seed);
        let store = KeyStore::new(env.clone());
        store.store(random_key(&env, "k", algorithm)).unwrap();

        let ciphertext = store.encrypt("k", &plaintext).unwrap();
        let iv_len = if matches!(algorithm, AlgorithmType::Aes128 | AlgorithmType::Aes256) {
            16
        } else {
            8
        };
        prop_assert_eq!((ciphertext.len() - iv_len) % iv_len, 0);
        prop_assert!(ciphertext.len() > plaintext.len());
        prop_assert_eq!(store.decrypt("k", &ciphertext).unwrap(), plaintext);
    }

    #[test]
    fn prop_rotation_increments_version(rotations in 1u32..6) {
        let env = SimEnv::new();
        let store = KeyStore::new(env.clone());
        store.store(random_key(&env, "base", AlgorithmType::Aes256)).unwrap();

        let mut current = "base".to_string();
        for expected in 2..=rotations + 1 {
            let next = store.rotate(&current).unwrap();
            prop_assert_eq!(next.metadata().version(), expected);
            prop_assert_eq!(next.key_length_bits(), 256);
            prop_assert_eq!(next.metadata().description(), format!("rotated from {current}"));
            current = next.key_id().to_string();
        }

        prop_assert_eq!(store.count() as u32, rotations + 1);
    }
}
