//! Reference model of the key store.
//!
//! The model tracks only what the store makes observable: which ids are
//! present, the version and algorithm behind each id, and how many audit
//! records have been appended. [`StoreOperation`] derives `Arbitrary` so the
//! same operation stream can be driven from proptest or a fuzzer.

use std::collections::BTreeMap;

use arbitrary::Arbitrary;
use montikey_core::{
    AlgorithmType, DerivedKey, Environment, KeyMetadata, KeySource, KeyStore, StoreError,
};

/// Number of distinct ids operations address.
pub const SLOT_COUNT: u8 = 8;

/// One operation against the key store.
#[derive(Debug, Clone, PartialEq, Eq, Arbitrary)]
pub enum StoreOperation {
    /// Store a fresh key in a slot
    Store {
        /// Slot index (reduced modulo [`SLOT_COUNT`])
        slot: u8,
        /// Selects the algorithm and key length
        algorithm: u8,
    },
    /// Retrieve a slot
    Retrieve {
        /// Slot index
        slot: u8,
    },
    /// Delete a slot
    Delete {
        /// Slot index
        slot: u8,
    },
    /// Rotate a slot
    Rotate {
        /// Slot index
        slot: u8,
    },
    /// Encrypt then decrypt through a slot's key
    RoundTrip {
        /// Slot index
        slot: u8,
        /// Data to encrypt
        plaintext: Vec<u8>,
    },
    /// Wipe everything
    ClearAll,
}

impl StoreOperation {
    fn slot_id(slot: u8) -> String {
        format!("key_{}", slot % SLOT_COUNT)
    }
}

fn algorithm_for(selector: u8) -> AlgorithmType {
    match selector % 5 {
        0 => AlgorithmType::Aes128,
        1 => AlgorithmType::Aes256,
        2 => AlgorithmType::Des,
        3 => AlgorithmType::TripleDes,
        _ => AlgorithmType::MifareClassic,
    }
}

/// Observable result of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelOutcome {
    /// Operation succeeded
    Ok,
    /// Id was not present
    NotFound,
    /// Key algorithm cannot encrypt
    Unsupported,
    /// Round trip decrypted to something other than the plaintext
    Mismatch,
    /// Any other error
    Failed,
}

impl From<&StoreError> for ModelOutcome {
    fn from(err: &StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFound,
            StoreError::UnsupportedAlgorithm { .. } => Self::Unsupported,
            _ => Self::Failed,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ModelKey {
    algorithm: AlgorithmType,
    version: u32,
}

/// Reference implementation of the key store.
#[derive(Debug, Clone)]
pub struct StoreModel {
    keys: BTreeMap<String, ModelKey>,
    audit_appended: usize,
    audit_capacity: usize,
}

impl StoreModel {
    /// Model of a freshly constructed store with the given audit capacity.
    pub fn new(audit_capacity: usize) -> Self {
        // INIT record
        Self { keys: BTreeMap::new(), audit_appended: 1, audit_capacity }
    }

    /// Ids the store should hold, sorted.
    pub fn ids(&self) -> Vec<String> {
        self.keys.keys().cloned().collect()
    }

    /// Length the audit log should have.
    pub fn audit_len(&self) -> usize {
        self.audit_appended.min(self.audit_capacity)
    }

    /// Version the key under `id` should carry.
    pub fn version(&self, id: &str) -> Option<u32> {
        self.keys.get(id).map(|key| key.version)
    }

    /// Apply an operation and return the outcome the store should report.
    pub fn apply(&mut self, op: &StoreOperation) -> ModelOutcome {
        match op {
            StoreOperation::Store { slot, algorithm } => {
                let key = ModelKey { algorithm: algorithm_for(*algorithm), version: 1 };
                self.keys.insert(StoreOperation::slot_id(*slot), key);
                self.audit_appended += 1;
                ModelOutcome::Ok
            },
            StoreOperation::Retrieve { slot } => {
                self.audit_appended += 1;
                self.presence(*slot)
            },
            StoreOperation::Delete { slot } => {
                self.audit_appended += 1;
                match self.keys.remove(&StoreOperation::slot_id(*slot)) {
                    Some(_) => ModelOutcome::Ok,
                    None => ModelOutcome::NotFound,
                }
            },
            StoreOperation::Rotate { slot } => {
                let id = StoreOperation::slot_id(*slot);
                match self.keys.get(&id).copied() {
                    Some(old) => {
                        let version = old.version + 1;
                        self.keys.insert(format!("{id}_v{version}"), ModelKey { version, ..old });
                        // RETRIEVE, STORE, ROTATE
                        self.audit_appended += 3;
                        ModelOutcome::Ok
                    },
                    None => {
                        self.audit_appended += 2;
                        ModelOutcome::NotFound
                    },
                }
            },
            StoreOperation::RoundTrip { slot, .. } => {
                match self.keys.get(&StoreOperation::slot_id(*slot)) {
                    Some(key) if key.algorithm == AlgorithmType::MifareClassic => {
                        self.audit_appended += 2;
                        ModelOutcome::Unsupported
                    },
                    Some(_) => {
                        // RETRIEVE, ENCRYPT, RETRIEVE, DECRYPT
                        self.audit_appended += 4;
                        ModelOutcome::Ok
                    },
                    None => {
                        self.audit_appended += 2;
                        ModelOutcome::NotFound
                    },
                }
            },
            StoreOperation::ClearAll => {
                self.keys.clear();
                self.audit_appended += 1;
                ModelOutcome::Ok
            },
        }
    }

    fn presence(&self, slot: u8) -> ModelOutcome {
        if self.keys.contains_key(&StoreOperation::slot_id(slot)) {
            ModelOutcome::Ok
        } else {
            ModelOutcome::NotFound
        }
    }
}

/// Apply an operation to a real store and report its outcome.
pub fn apply_to_store<E: Environment>(store: &KeyStore<E>, op: &StoreOperation) -> ModelOutcome {
    let result = match op {
        StoreOperation::Store { slot, algorithm } => {
            let algorithm = algorithm_for(*algorithm);
            let metadata = KeyMetadata::new(KeySource::Manual, algorithm, "model", 1);
            let secret = vec![slot.wrapping_add(1); algorithm.key_len()];
            DerivedKey::new(&secret, StoreOperation::slot_id(*slot), metadata, 0)
                .map_err(StoreError::from)
                .and_then(|key| store.store(key))
        },
        StoreOperation::Retrieve { slot } => {
            store.retrieve(&StoreOperation::slot_id(*slot)).map(|_| ())
        },
        StoreOperation::Delete { slot } => store.delete(&StoreOperation::slot_id(*slot)),
        StoreOperation::Rotate { slot } => {
            store.rotate(&StoreOperation::slot_id(*slot)).map(|_| ())
        },
        StoreOperation::RoundTrip { slot, plaintext } => {
            let id = StoreOperation::slot_id(*slot);
            match store.encrypt(&id, plaintext).and_then(|ct| store.decrypt(&id, &ct)) {
                Ok(decrypted) if decrypted == *plaintext => Ok(()),
                Ok(_) => return ModelOutcome::Mismatch,
                Err(err) => Err(err),
            }
        },
        StoreOperation::ClearAll => {
            store.clear_all();
            Ok(())
        },
    };

    match result {
        Ok(()) => ModelOutcome::Ok,
        Err(err) => ModelOutcome::from(&err),
    }
}
