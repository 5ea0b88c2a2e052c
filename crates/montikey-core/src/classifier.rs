//! Interception classifier.
//!
//! Watches payloads observed on short-range wireless characteristics and flags
//! the ones whose length matches a known key size.
//!
//! # Heuristic
//!
//! | Payload length | Candidate algorithm |
//! |----------------|---------------------|
//! | 6              | MIFARE Classic      |
//! | 16             | AES-128             |
//! | 24             | AES-128 (fallback)  |
//! | 32             | AES-256             |
//!
//! The payload itself becomes the key material. Any payload of a matching
//! length is flagged, so false positives are expected; consumers treat
//! `KeyIntercepted` as advisory.
//!
//! # Listeners
//!
//! [`InterceptionClassifier::observe`] returns its events and also delivers
//! them synchronously to registered listeners in registration order. Delivery
//! iterates a snapshot of the listener list, so a listener may register or
//! remove listeners while handling an event.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex, RwLock},
};

use montikey_crypto::{derive_key_of_length, derive_mifare_key};
use zeroize::Zeroizing;

use crate::{
    env::Environment,
    error::DeriveError,
    key::{AlgorithmType, DerivedKey, KeyMetadata, KeySource, SecurityContext},
    sync::{lock, read, write},
};

/// Payload lengths treated as candidate key material.
pub const CANDIDATE_KEY_LENGTHS: [usize; 4] = [6, 16, 24, 32];

/// Candidate algorithm for a payload of `len` bytes, if any.
pub fn classify_length(len: usize) -> Option<AlgorithmType> {
    match len {
        6 => Some(AlgorithmType::MifareClassic),
        32 => Some(AlgorithmType::Aes256),
        16 | 24 => Some(AlgorithmType::Aes128),
        _ => None,
    }
}

/// Whether a payload was read from or written to the characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Value read or notified by the peripheral
    Read,
    /// Value written by the central
    Write,
}

/// Outcome of observing one payload.
#[derive(Debug, Clone)]
pub enum ClassifierEvent {
    /// A non-empty payload was seen
    PatternObserved {
        /// Characteristic or device the payload came from
        source_id: String,
        /// Read or write
        direction: Direction,
        /// Payload length in bytes
        len: usize,
    },

    /// Payload length matched a key size
    KeyIntercepted(DerivedKey),

    /// A candidate could not be turned into a key
    Error {
        /// Characteristic or device the payload came from
        source_id: String,
        /// What went wrong
        message: String,
    },
}

/// Receives classifier events.
///
/// Called synchronously on the observing thread. Must not block for long.
pub trait ClassifierListener: Send + Sync {
    /// Handle one event.
    fn on_event(&self, event: &ClassifierEvent);
}

/// Length-based key candidate detector.
pub struct InterceptionClassifier<E: Environment> {
    env: E,
    context: SecurityContext,
    listeners: RwLock<Vec<Arc<dyn ClassifierListener>>>,
    intercepted: Mutex<HashMap<String, Zeroizing<Vec<u8>>>>,
}

impl<E: Environment> InterceptionClassifier<E> {
    /// Create a classifier with no listeners.
    pub fn new(env: E) -> Self {
        let now = env.now_millis();
        let context = SecurityContext::with_prefix("WIRELESS", now);
        context.log_operation(now, "interception classifier initialized");
        Self {
            env,
            context,
            listeners: RwLock::new(Vec::new()),
            intercepted: Mutex::new(HashMap::new()),
        }
    }

    /// Register a listener.
    ///
    /// Returns false if this exact listener (same allocation) is already
    /// registered.
    pub fn add_listener(&self, listener: Arc<dyn ClassifierListener>) -> bool {
        let mut listeners = write(&self.listeners);
        if listeners.iter().any(|existing| Arc::ptr_eq(existing, &listener)) {
            return false;
        }
        listeners.push(listener);
        true
    }

    /// Unregister a listener. Returns false if it was not registered.
    pub fn remove_listener(&self, listener: &Arc<dyn ClassifierListener>) -> bool {
        let mut listeners = write(&self.listeners);
        let before = listeners.len();
        listeners.retain(|existing| !Arc::ptr_eq(existing, listener));
        listeners.len() != before
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        read(&self.listeners).len()
    }

    /// Classify one payload.
    ///
    /// Empty payloads are ignored and produce no events. Otherwise the
    /// payload is retained as the latest value for its source (`<source_id>`
    /// for reads, `<source_id>_write` for writes), a `PatternObserved` event
    /// is raised, and a `KeyIntercepted` event follows when the length is a
    /// candidate key size.
    pub fn observe(
        &self,
        source_id: &str,
        payload: &[u8],
        direction: Direction,
    ) -> Vec<ClassifierEvent> {
        if payload.is_empty() {
            tracing::trace!(source_id, "ignored empty payload");
            return Vec::new();
        }

        let now = self.env.now_millis();
        let slot = match direction {
            Direction::Read => source_id.to_string(),
            Direction::Write => format!("{source_id}_write"),
        };
        lock(&self.intercepted).insert(slot, Zeroizing::new(payload.to_vec()));
        let operation = format!("observed {} bytes from {source_id}", payload.len());
        self.context.log_operation(now, &operation);

        let mut events = vec![ClassifierEvent::PatternObserved {
            source_id: source_id.to_string(),
            direction,
            len: payload.len(),
        }];

        if let Some(algorithm) = classify_length(payload.len()) {
            match intercepted_key(source_id, payload, algorithm, now) {
                Ok(key) => {
                    tracing::info!(
                        source_id,
                        key_id = key.key_id(),
                        %algorithm,
                        "candidate key intercepted"
                    );
                    tracing::warn!(source_id, "length-only match, may be a false positive");
                    events.push(ClassifierEvent::KeyIntercepted(key));
                },
                Err(err) => {
                    tracing::error!(source_id, error = %err, "failed to build intercepted key");
                    events.push(ClassifierEvent::Error {
                        source_id: source_id.to_string(),
                        message: err.to_string(),
                    });
                },
            }
        }

        self.dispatch(&events);
        events
    }

    fn dispatch(&self, events: &[ClassifierEvent]) {
        let snapshot: Vec<Arc<dyn ClassifierListener>> = read(&self.listeners).clone();
        for event in events {
            for listener in &snapshot {
                listener.on_event(event);
            }
        }
    }

    /// Copy of the latest payload per source slot.
    pub fn intercepted_data(&self) -> BTreeMap<String, Zeroizing<Vec<u8>>> {
        lock(&self.intercepted).iter().map(|(slot, data)| (slot.clone(), data.clone())).collect()
    }

    /// Wipe all retained payloads.
    pub fn clear_intercepted_data(&self) {
        lock(&self.intercepted).clear();
    }

    /// Derive an AES key from intercepted bytes.
    ///
    /// `bits == 256` selects AES-256, anything else AES-128. Key bytes are
    /// `data` fitted to `bits / 8` bytes.
    ///
    /// # Errors
    ///
    /// - `Kdf` if `data` is empty or `bits / 8` is zero
    pub fn derive_aes_key(&self, data: &[u8], bits: u32) -> Result<DerivedKey, DeriveError> {
        let algorithm = if bits == 256 { AlgorithmType::Aes256 } else { AlgorithmType::Aes128 };
        let secret = derive_key_of_length(data, (bits / 8) as usize)?;

        let now = self.env.now_millis();
        let metadata = KeyMetadata::new(
            KeySource::WirelessIntercept,
            algorithm,
            format!("AES-{bits} key derived from intercepted data"),
            1,
        );
        let key = DerivedKey::new(&secret, format!("WIRELESS_AES{bits}_{now}"), metadata, now)?;
        self.context.log_operation(now, &format!("derived AES-{bits} key"));
        Ok(key)
    }

    /// Derive a 6-byte MIFARE Classic key from intercepted bytes.
    ///
    /// # Errors
    ///
    /// - `Kdf` if `data` is empty
    pub fn derive_mifare_key(&self, data: &[u8]) -> Result<DerivedKey, DeriveError> {
        let secret = derive_mifare_key(data)?;

        let now = self.env.now_millis();
        let metadata = KeyMetadata::new(
            KeySource::WirelessIntercept,
            AlgorithmType::MifareClassic,
            "MIFARE key derived from intercepted data",
            1,
        );
        let key = DerivedKey::new(&secret, format!("WIRELESS_MIFARE_{now}"), metadata, now)?;
        self.context.log_operation(now, "derived MIFARE key");
        Ok(key)
    }

    /// Drop all listeners and retained payloads.
    pub fn cleanup(&self) {
        write(&self.listeners).clear();
        self.clear_intercepted_data();
        self.context.log_operation(self.env.now_millis(), "cleanup");
        tracing::debug!("interception classifier cleaned up");
    }

    /// Operation log for this classifier.
    pub fn security_context(&self) -> &SecurityContext {
        &self.context
    }
}

fn intercepted_key(
    source_id: &str,
    payload: &[u8],
    algorithm: AlgorithmType,
    now: u64,
) -> Result<DerivedKey, DeriveError> {
    let prefix: String = source_id.chars().take(8).collect();

    let mut metadata = KeyMetadata::new(
        KeySource::WirelessIntercept,
        algorithm,
        format!("intercepted from {source_id}"),
        1,
    );
    metadata.add_info("source_id", source_id);
    metadata.add_info("timestamp", now.to_string());

    Ok(DerivedKey::new(payload, format!("WIRELESS_{prefix}_{now}"), metadata, now)?)
}
