//! Classifier listener that records everything it sees

use std::sync::{Mutex, PoisonError};

use montikey_core::{ClassifierEvent, ClassifierListener};

/// Records every classifier event in delivery order.
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<ClassifierEvent>>,
}

impl RecordingListener {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events.
    pub fn events(&self) -> Vec<ClassifierEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Ids of recorded `KeyIntercepted` events.
    pub fn intercepted_ids(&self) -> Vec<String> {
        self.events()
            .iter()
            .filter_map(|event| match event {
                ClassifierEvent::KeyIntercepted(key) => Some(key.key_id().to_string()),
                _ => None,
            })
            .collect()
    }
}

impl ClassifierListener for RecordingListener {
    fn on_event(&self, event: &ClassifierEvent) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(event.clone());
    }
}
