use std::{collections::VecDeque, fmt};

use serde::Serialize;

pub const DEFAULT_LOG_CAPACITY: usize = 20;
pub const BOOT_MESSAGE: &str = "System initialized. Monitoring daemon active...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    Info,
    Success,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Success => "SUCCESS",
            LogLevel::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub tick: u64,
    pub level: LogLevel,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "> T+{:03} [{}] {}",
            self.tick,
            self.level.as_str(),
            self.message
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    appended: u64,
}

impl SessionLog {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            appended: 0,
        }
    }

    /// Fresh log holding only the boot line.
    pub fn booted(capacity: usize) -> Self {
        let mut log = Self::with_capacity(capacity);
        log.entries.push_front(LogEntry {
            tick: 0,
            level: LogLevel::Info,
            message: BOOT_MESSAGE.to_string(),
        });
        log.appended = 1;
        log
    }

    /// Prepends an entry, evicting the oldest once capacity is reached.
    pub fn push(&mut self, tick: u64, level: LogLevel, message: impl Into<String>) {
        let entry = LogEntry {
            tick,
            level,
            message: message.into(),
        };
        match level {
            LogLevel::Error => {
                tracing::warn!(target: "drill::log", tick, message = %entry.message, "session.log")
            }
            LogLevel::Info | LogLevel::Success => {
                tracing::info!(target: "drill::log", tick, level = level.as_str(), message = %entry.message, "session.log")
            }
        }
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
        self.appended += 1;
    }

    /// Total entries ever appended, including evicted ones.
    pub fn appended(&self) -> u64 {
        self.appended
    }

    /// Entries appended after `mark` (a prior [`appended`](Self::appended)
    /// value) that are still retained, oldest first.
    pub fn since(&self, mark: u64) -> Vec<&LogEntry> {
        let fresh = self.appended.saturating_sub(mark).min(self.entries.len() as u64) as usize;
        self.entries.iter().take(fresh).rev().collect()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    /// Entries newest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::booted(DEFAULT_LOG_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn since_returns_fresh_entries_in_order() {
        let mut log = SessionLog::booted(3);
        let mark = log.appended();
        log.push(1, LogLevel::Info, "a");
        log.push(1, LogLevel::Info, "a");
        log.push(2, LogLevel::Success, "b");
        let fresh: Vec<_> = log.since(mark).iter().map(|e| e.message.as_str()).collect();
        assert_eq!(fresh, ["a", "a", "b"]);

        log.push(3, LogLevel::Error, "c");
        assert_eq!(log.appended(), 5);
        assert_eq!(log.since(mark).len(), 3);
        assert!(log.since(log.appended()).is_empty());
    }

    #[test]
    fn newest_entry_comes_first() {
        let mut log = SessionLog::with_capacity(4);
        log.push(1, LogLevel::Info, "first");
        log.push(2, LogLevel::Error, "second");
        let messages: Vec<_> = log.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, ["second", "first"]);
    }

    #[test]
    fn appending_past_capacity_evicts_oldest() {
        let mut log = SessionLog::booted(DEFAULT_LOG_CAPACITY);
        for tick in 1..=25 {
            log.push(tick, LogLevel::Info, format!("event {tick}"));
        }
        assert_eq!(log.len(), DEFAULT_LOG_CAPACITY);
        assert_eq!(log.latest().map(|e| e.tick), Some(25));
        assert_eq!(log.iter().last().map(|e| e.tick), Some(6));
        assert!(log.iter().all(|e| e.message != BOOT_MESSAGE));
    }

    #[test]
    fn entries_render_with_tick_and_level() {
        let mut log = SessionLog::with_capacity(2);
        log.push(7, LogLevel::Success, "MITIGATED: Gossip Storm resolved via LIMIT_GOSSIP.");
        insta::assert_snapshot!(
            log.lines().join("\n"),
            @"> T+007 [SUCCESS] MITIGATED: Gossip Storm resolved via LIMIT_GOSSIP."
        );
    }
}
