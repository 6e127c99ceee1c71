//! Ordered, append-only conversation log.

use chrono::{DateTime, Utc};

/// One displayable exchange. Insertion order is display order; the core
/// never reorders or deduplicates (a retransmission shows up twice).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub sender_uid: String,
    pub receiver_uid: String,
    pub plaintext: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// O(1) amortized; never mutates or removes existing entries.
    pub fn append(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    /// Ordered read-only view for rendering.
    pub fn iter(&self) -> impl Iterator<Item = &TranscriptEntry> {
        self.entries.iter()
    }

    pub fn snapshot(&self) -> Vec<TranscriptEntry> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: u32) -> TranscriptEntry {
        TranscriptEntry {
            sender_uid: "bob".into(),
            receiver_uid: "alice".into(),
            plaintext: format!("msg {n}"),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn preserves_insertion_order() {
        let mut t = Transcript::new();
        for n in 0..5 {
            t.append(entry(n));
        }
        let texts: Vec<_> = t.iter().map(|e| e.plaintext.as_str()).collect();
        assert_eq!(texts, ["msg 0", "msg 1", "msg 2", "msg 3", "msg 4"]);
    }

    #[test]
    fn keeps_duplicates() {
        let mut t = Transcript::new();
        t.append(entry(1));
        t.append(entry(1));
        assert_eq!(t.len(), 2);
    }
}
