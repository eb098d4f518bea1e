//! The primary's authoritative log.

use std::sync::Mutex;

use beryl_types::{LogEntry, SeqNo};

/// Ordered log plus the monotonic sequence counter, under one mutex.
///
/// [`Ledger::assign`] is the only writer in the system; serializing it is
/// what gives Beryl its global total order. The log is append-only: no
/// holes, no mutation, no removal, and `next seq == len + 1` at all times.
#[derive(Debug, Default)]
pub struct Ledger {
    log: Mutex<Vec<LogEntry>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the next sequence number to `payload` and appends the entry.
    ///
    /// Once this returns, the message is part of the total order regardless
    /// of what happens to the client that submitted it.
    pub fn assign(&self, payload: String) -> LogEntry {
        let mut log = self.log.lock().unwrap();
        let entry = LogEntry::new(SeqNo::new(log.len() as u64 + 1), payload);
        log.push(entry.clone());
        entry
    }

    /// Copy of the payloads in sequence order.
    pub fn snapshot(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .map(|entry| entry.payload.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.log.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
