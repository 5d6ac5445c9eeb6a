use std::collections::{HashSet, VecDeque};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Hard cap on tracked fingerprints.
const MAX_TRACKED: usize = 1000;
/// How many of the most recent fingerprints survive a trim.
const TRIM_TO: usize = 500;
/// Fixed prefix length of a fingerprint.
const FINGERPRINT_LEN: usize = 32;

/// Derive a fixed-length fingerprint from raw message text.
///
/// Deterministic for identical text; collisions are acceptable since
/// this drives best-effort dedup, not security.
pub fn fingerprint(text: &str) -> String {
    let mut encoded = STANDARD.encode(text.as_bytes());
    encoded.truncate(FINGERPRINT_LEN);
    encoded
}

/// Insertion-ordered set of message fingerprints with a bounded size.
///
/// Membership checks never refresh recency. When the set grows past the
/// hard cap it is bulk-trimmed down to the most recently inserted
/// entries, not evicted one at a time.
pub struct DedupSet {
    seen: HashSet<String>,
    order: VecDeque<String>,
}

impl DedupSet {
    pub fn new() -> Self {
        Self {
            seen: HashSet::new(),
            order: VecDeque::new(),
        }
    }

    pub fn contains(&self, fp: &str) -> bool {
        self.seen.contains(fp)
    }

    /// Record a fingerprint. Returns false if it was already present.
    pub fn insert(&mut self, fp: String) -> bool {
        if !self.seen.insert(fp.clone()) {
            return false;
        }
        self.order.push_back(fp);
        if self.order.len() > MAX_TRACKED {
            self.trim();
        }
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    fn trim(&mut self) {
        while self.order.len() > TRIM_TO {
            if let Some(old) = self.order.pop_front() {
                self.seen.remove(&old);
            }
        }
    }
}

impl Default for DedupSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_deterministic_and_fixed_length() {
        let a = fingerprint("Your OTP for +12025550199 is 834921");
        let b = fingerprint("Your OTP for +12025550199 is 834921");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert_ne!(a, fingerprint("a completely different message body"));
    }

    #[test]
    fn test_short_text_yields_short_fingerprint() {
        // Texts shorter than the prefix just encode fully.
        let fp = fingerprint("hi");
        assert!(!fp.is_empty());
        assert!(fp.len() <= 32);
    }

    #[test]
    fn test_duplicate_insert_is_rejected() {
        let mut set = DedupSet::new();
        let fp = fingerprint("same message");
        assert!(set.insert(fp.clone()));
        assert!(set.contains(&fp));
        assert!(!set.insert(fp));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_trim_keeps_most_recent_500() {
        let mut set = DedupSet::new();
        let fps: Vec<String> = (0..1001).map(|i| fingerprint(&format!("message {i}"))).collect();

        for fp in &fps {
            assert!(set.insert(fp.clone()));
            assert!(set.len() <= 1000);
        }

        // The 1001st insert pushed the set over the cap and triggered a
        // bulk trim down to the most recent 500.
        assert_eq!(set.len(), 500);
        for fp in &fps[..501] {
            assert!(!set.contains(fp));
        }
        for fp in &fps[501..] {
            assert!(set.contains(fp));
        }
    }
}
