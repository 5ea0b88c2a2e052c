//! Fuzz target comparing the key store against its reference model
//!
//! # Invariants
//!
//! - Every operation reports the outcome the model predicts
//! - Stored ids match the model after every step
//! - Audit log length is `min(records appended, capacity)`
//! - Encrypt/decrypt never returns different plaintext

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use montikey_core::{KeyStore, KeyStoreConfig};
use montikey_harness::{ModelOutcome, SimEnv, StoreModel, StoreOperation, apply_to_store};

#[derive(Debug, Arbitrary)]
struct Scenario {
    seed: u64,
    audit_capacity: u16,
    operations: Vec<StoreOperation>,
}

fuzz_target!(|scenario: Scenario| {
    let config = KeyStoreConfig { audit_capacity: usize::from(scenario.audit_capacity) };
    let store = KeyStore::with_config(SimEnv::with_seed(scenario.seed), config);
    let mut model = StoreModel::new(store.audit_capacity());

    for op in scenario.operations.iter().take(256) {
        let expected = model.apply(op);
        let actual = apply_to_store(&store, op);

        assert_ne!(actual, ModelOutcome::Mismatch, "{op:?}");
        assert_eq!(actual, expected, "{op:?}");
        assert_eq!(store.list_ids(), model.ids());
        assert_eq!(store.audit_log().len(), model.audit_len());
    }
});
