//! Bounded audit trail owned by the key store

use std::{collections::VecDeque, fmt};

/// Operation recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditOperation {
    /// Store construction
    Init,
    /// Insert or overwrite a key
    Store,
    /// Look up a key
    Retrieve,
    /// Remove a key
    Delete,
    /// Encrypt with a stored key
    Encrypt,
    /// Decrypt with a stored key
    Decrypt,
    /// Replace a key with a fresh successor
    Rotate,
    /// Wipe every key
    ClearAll,
    /// Empty the audit trail
    ClearLog,
}

impl AuditOperation {
    /// Name as rendered in audit records.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::Store => "STORE",
            Self::Retrieve => "RETRIEVE",
            Self::Delete => "DELETE",
            Self::Encrypt => "ENCRYPT",
            Self::Decrypt => "DECRYPT",
            Self::Rotate => "ROTATE",
            Self::ClearAll => "CLEAR_ALL",
            Self::ClearLog => "CLEAR_LOG",
        }
    }
}

impl fmt::Display for AuditOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit entry.
///
/// Renders as `<ts> [SUCCESS|FAILURE] <OPERATION> - <key_id>: <details>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    /// Milliseconds since the Unix epoch
    pub timestamp_millis: u64,
    /// What was attempted
    pub operation: AuditOperation,
    /// Key the operation targeted (`SYSTEM`, `NULL` or `ALL` for non-key
    /// operations)
    pub key_id: String,
    /// Whether the operation succeeded
    pub success: bool,
    /// Free-text outcome
    pub details: String,
}

impl fmt::Display for AuditRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success { "SUCCESS" } else { "FAILURE" };
        write!(
            f,
            "{} [{}] {} - {}: {}",
            self.timestamp_millis, status, self.operation, self.key_id, self.details
        )
    }
}

/// FIFO of audit records with a hard capacity.
///
/// Pushing into a full log evicts the oldest record first.
#[derive(Debug)]
pub(crate) struct AuditLog {
    records: VecDeque<AuditRecord>,
    capacity: usize,
}

impl AuditLog {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self { records: VecDeque::with_capacity(capacity), capacity }
    }

    pub(crate) fn push(&mut self, record: AuditRecord) {
        while self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
        debug_assert!(self.records.len() <= self.capacity);
    }

    pub(crate) fn snapshot(&self) -> Vec<AuditRecord> {
        self.records.iter().cloned().collect()
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Plain-text report: header, count, then one record per line.
    pub(crate) fn export(&self) -> String {
        let mut report = String::from("=== Key Store Audit Log ===\n");
        report.push_str(&format!("Total operations: {}\n\n", self.records.len()));
        for record in &self.records {
            report.push_str(&record.to_string());
            report.push('\n');
        }
        report
    }
}
