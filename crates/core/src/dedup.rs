//! Content-addressed deduplication ledger.

use std::collections::HashSet;

/// Set of content hashes already emitted.
///
/// Insert-once: the first record for a hash wins and later duplicates are
/// discarded. Not synchronized; a single consumer owns it.
#[derive(Debug, Default, Clone)]
pub struct DedupLedger {
    seen: HashSet<String>,
}

impl DedupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self, hash: &str) -> bool {
        self.seen.contains(hash)
    }

    pub fn record(&mut self, hash: impl Into<String>) {
        self.seen.insert(hash.into());
    }

    /// Record `hash` and report whether it was new.
    pub fn admit(&mut self, hash: &str) -> bool {
        if self.seen(hash) {
            return false;
        }
        self.record(hash);
        true
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_hash_wins() {
        let mut ledger = DedupLedger::new();
        assert!(ledger.is_empty());
        assert!(ledger.admit("aa"));
        assert!(!ledger.admit("aa"));
        assert!(ledger.admit("bb"));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn seen_and_record_are_independent_steps() {
        let mut ledger = DedupLedger::new();
        assert!(!ledger.seen("cc"));
        ledger.record("cc");
        ledger.record("cc");
        assert!(ledger.seen("cc"));
        assert_eq!(ledger.len(), 1);
    }
}
