//! Append-only operation log scoped to one subsystem instance

use std::sync::Mutex;

use crate::sync::lock;

/// Named, timestamped operation log.
///
/// Entries render as `"<millis>: <operation>"` in append order. After
/// [`lock`](Self::lock) further entries are silently dropped; locking is
/// terminal.
#[derive(Debug)]
pub struct SecurityContext {
    context_id: String,
    created_at_millis: u64,
    log: Mutex<ContextLog>,
}

#[derive(Debug, Default)]
struct ContextLog {
    operations: Vec<String>,
    locked: bool,
}

impl SecurityContext {
    /// Create a context with an explicit identifier.
    pub fn new(context_id: impl Into<String>, created_at_millis: u64) -> Self {
        Self {
            context_id: context_id.into(),
            created_at_millis,
            log: Mutex::new(ContextLog::default()),
        }
    }

    /// Create a context named `<prefix>_<created_at_millis>`.
    pub fn with_prefix(prefix: &str, created_at_millis: u64) -> Self {
        Self::new(format!("{prefix}_{created_at_millis}"), created_at_millis)
    }

    /// Context identifier
    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    /// Creation time in milliseconds since the Unix epoch
    pub fn created_at_millis(&self) -> u64 {
        self.created_at_millis
    }

    /// Append an operation. No-op once locked.
    pub fn log_operation(&self, at_millis: u64, operation: &str) {
        let mut log = lock(&self.log);
        if !log.locked {
            log.operations.push(format!("{at_millis}: {operation}"));
        }
    }

    /// Snapshot of all entries.
    pub fn operations(&self) -> Vec<String> {
        lock(&self.log).operations.clone()
    }

    /// Stop accepting entries.
    pub fn lock(&self) {
        lock(&self.log).locked = true;
    }

    /// Whether [`lock`](Self::lock) has been called
    pub fn is_locked(&self) -> bool {
        lock(&self.log).locked
    }

    /// Milliseconds since creation, saturating at zero.
    pub fn age_millis(&self, now_millis: u64) -> u64 {
        now_millis.saturating_sub(self.created_at_millis)
    }
}
