//! Content-hash deduplication.
//!
//! The map is seeded incrementally as files are copied, so a duplicate
//! later in the scan order is caught even when it never appeared earlier
//! in an explicit pre-pass. Lookup key is the *source* hash, computed
//! before any copy happens.

use std::collections::HashMap;

/// Maps a content hash to the `dst_rel` of the first copy seen for it.
#[derive(Debug, Default)]
pub struct DedupeIndex {
    seen: HashMap<String, String>,
}

impl DedupeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an existing copy for `hash`. Returns the `dst_rel` it was
    /// stored under, if any.
    pub fn lookup(&self, hash: &str) -> Option<&str> {
        self.seen.get(hash).map(|s| s.as_str())
    }

    /// Record that `hash` now lives at `dst_rel`. A later `record` for the
    /// same hash is ignored -- the first copy stays canonical.
    pub fn record(&mut self, hash: String, dst_rel: String) {
        self.seen.entry(hash).or_insert(dst_rel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_writer_wins_on_repeated_record() {
        let mut idx = DedupeIndex::new();
        idx.record("h1".into(), "RAW/a.NEF".into());
        idx.record("h1".into(), "RAW/b.NEF".into());
        assert_eq!(idx.lookup("h1"), Some("RAW/a.NEF"));
    }

    #[test]
    fn unknown_hash_has_no_entry() {
        let idx = DedupeIndex::new();
        assert_eq!(idx.lookup("missing"), None);
    }
}
