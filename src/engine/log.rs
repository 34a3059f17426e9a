//! Bounded, insertion-ordered trade activity log.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display bound on retained entries.
pub const TRADE_LOG_CAP: usize = 20;

/// Classification of a trade log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    /// Lifecycle message.
    Info,
    /// A winning trade.
    Profit,
    /// A losing trade.
    Loss,
    /// The terminal target-reached message.
    Success,
}

/// One timestamped log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeLogEntry {
    /// When the entry was appended.
    pub at: DateTime<Utc>,
    /// Entry classification.
    pub kind: LogKind,
    /// Display text.
    pub message: String,
}

/// Append-only, strictly time-ordered log that retains only the most
/// recent [`TRADE_LOG_CAP`] entries (oldest evicted first).
///
/// The eviction bound is a display/memory limit, not a correctness rule,
/// so the total appended count is tracked separately for day accounting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeLog {
    entries: VecDeque<TradeLogEntry>,
    total_appended: u64,
}

impl TradeLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry, evicting the oldest beyond the cap.
    pub fn append(&mut self, kind: LogKind, message: impl Into<String>, at: DateTime<Utc>) {
        self.entries.push_back(TradeLogEntry {
            at,
            kind,
            message: message.into(),
        });
        self.total_appended += 1;
        while self.entries.len() > TRADE_LOG_CAP {
            self.entries.pop_front();
        }
    }

    /// Retained entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &TradeLogEntry> {
        self.entries.iter()
    }

    /// Number of retained entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count of all entries ever appended, including evicted ones.
    #[must_use]
    pub const fn total_appended(&self) -> u64 {
        self.total_appended
    }

    /// The most recent entry, if any.
    #[must_use]
    pub fn last(&self) -> Option<&TradeLogEntry> {
        self.entries.back()
    }

    /// Drops all entries and resets the appended counter.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.total_appended = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let mut log = TradeLog::new();
        let now = Utc::now();
        log.append(LogKind::Info, "first", now);
        log.append(LogKind::Profit, "second", now);

        let messages: Vec<_> = log.entries().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
        assert_eq!(log.last().unwrap().kind, LogKind::Profit);
    }

    #[test]
    fn test_cap_evicts_oldest_first() {
        let mut log = TradeLog::new();
        let now = Utc::now();
        for n in 0..TRADE_LOG_CAP + 7 {
            log.append(LogKind::Info, format!("entry-{n}"), now);
        }

        assert_eq!(log.len(), TRADE_LOG_CAP);
        assert_eq!(log.total_appended(), (TRADE_LOG_CAP + 7) as u64);

        // The retained window is the most recent entries, in order.
        let messages: Vec<_> = log.entries().map(|e| e.message.as_str()).collect();
        assert_eq!(messages[0], "entry-7");
        assert_eq!(messages[TRADE_LOG_CAP - 1], format!("entry-{}", TRADE_LOG_CAP + 6));
    }

    #[test]
    fn test_clear() {
        let mut log = TradeLog::new();
        log.append(LogKind::Info, "x", Utc::now());
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.total_appended(), 0);
    }
}
