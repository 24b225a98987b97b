//! Bounded in-memory diagnostics log.
//!
//! [`DiagnosticsLog`] keeps the most recent entries (default 1000) so they can
//! be inspected or exported after the fact, for example to attach to a bug
//! report about a failed upload. It is an explicitly constructed handle:
//! clones share the same buffer, and nothing reaches it through a global.
//!
//! Every recorded entry is also emitted through `tracing` at the matching
//! level, so the buffer never replaces the regular log pipeline.
//!
//! # Example
//!
//! ```rust
//! use shelfsight_common::{DiagnosticLevel, DiagnosticsFilter, DiagnosticsLog};
//!
//! let log = DiagnosticsLog::new(2);
//! log.info("VIDEO_UPLOAD", "file selected", None);
//! log.warn("VIDEO_UPLOAD", "large file", None);
//! log.error("VIDEO_VALIDATOR", "rejected", None);
//!
//! assert_eq!(log.len(), 2);
//! let errors = log.entries(&DiagnosticsFilter::level(DiagnosticLevel::Error));
//! assert_eq!(errors[0].message, "rejected");
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Default number of retained entries.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Level of a diagnostics entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DiagnosticLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        })
    }
}

/// One retained entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub level: DiagnosticLevel,
    pub category: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Selection criteria for [`DiagnosticsLog::entries`]. Unset fields match
/// everything; set fields must all match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticsFilter {
    pub level: Option<DiagnosticLevel>,
    pub category: Option<String>,
    pub since: Option<DateTime<Utc>>,
}

impl DiagnosticsFilter {
    pub fn level(level: DiagnosticLevel) -> Self {
        Self { level: Some(level), ..Self::default() }
    }

    pub fn category(category: impl Into<String>) -> Self {
        Self { category: Some(category.into()), ..Self::default() }
    }

    #[must_use]
    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    fn matches(&self, entry: &DiagnosticEntry) -> bool {
        self.level.map_or(true, |level| entry.level == level)
            && self.category.as_deref().map_or(true, |category| entry.category == category)
            && self.since.map_or(true, |since| entry.timestamp >= since)
    }
}

/// Aggregate counts over the retained entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsStats {
    pub total: usize,
    pub capacity: usize,
    pub by_level: BTreeMap<DiagnosticLevel, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub errors: usize,
    pub warnings: usize,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

/// Shared handle over a bounded diagnostics buffer.
#[derive(Debug, Clone)]
pub struct DiagnosticsLog {
    entries: Arc<Mutex<VecDeque<DiagnosticEntry>>>,
    capacity: usize,
}

impl Default for DiagnosticsLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl DiagnosticsLog {
    /// Create a buffer retaining at most `capacity` entries (clamped to 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))), capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn debug(&self, category: &str, message: &str, data: Option<Value>) {
        self.record(DiagnosticLevel::Debug, category, message, data);
    }

    pub fn info(&self, category: &str, message: &str, data: Option<Value>) {
        self.record(DiagnosticLevel::Info, category, message, data);
    }

    pub fn warn(&self, category: &str, message: &str, data: Option<Value>) {
        self.record(DiagnosticLevel::Warn, category, message, data);
    }

    pub fn error(&self, category: &str, message: &str, data: Option<Value>) {
        self.record(DiagnosticLevel::Error, category, message, data);
    }

    /// Append an entry, evicting the oldest one when the buffer is full.
    pub fn record(&self, level: DiagnosticLevel, category: &str, message: &str, data: Option<Value>) {
        emit_tracing(level, category, message, data.as_ref());

        let entry = DiagnosticEntry {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            level,
            category: category.to_string(),
            message: message.to_string(),
            data,
        };

        let mut entries = self.entries.lock();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Entries matching `filter`, oldest first.
    pub fn entries(&self, filter: &DiagnosticsFilter) -> Vec<DiagnosticEntry> {
        self.entries.lock().iter().filter(|entry| filter.matches(entry)).cloned().collect()
    }

    pub fn stats(&self) -> DiagnosticsStats {
        let entries = self.entries.lock();
        let mut stats = DiagnosticsStats {
            total: entries.len(),
            capacity: self.capacity,
            oldest: entries.front().map(|entry| entry.timestamp),
            newest: entries.back().map(|entry| entry.timestamp),
            ..DiagnosticsStats::default()
        };

        for entry in entries.iter() {
            *stats.by_level.entry(entry.level).or_default() += 1;
            *stats.by_category.entry(entry.category.clone()).or_default() += 1;
            match entry.level {
                DiagnosticLevel::Error => stats.errors += 1,
                DiagnosticLevel::Warn => stats.warnings += 1,
                DiagnosticLevel::Debug | DiagnosticLevel::Info => {}
            }
        }

        stats
    }

    /// Pretty-printed JSON array of every retained entry.
    ///
    /// # Errors
    /// Returns the serializer error if an entry's `data` cannot be encoded.
    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        let entries = self.entries.lock();
        let snapshot: Vec<&DiagnosticEntry> = entries.iter().collect();
        serde_json::to_string_pretty(&snapshot)
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
        tracing::debug!("diagnostics log cleared");
    }
}

fn emit_tracing(level: DiagnosticLevel, category: &str, message: &str, data: Option<&Value>) {
    let data = data.map(ToString::to_string).unwrap_or_default();
    match level {
        DiagnosticLevel::Debug => tracing::debug!(category, data = %data, "{message}"),
        DiagnosticLevel::Info => tracing::info!(category, data = %data, "{message}"),
        DiagnosticLevel::Warn => tracing::warn!(category, data = %data, "{message}"),
        DiagnosticLevel::Error => tracing::error!(category, data = %data, "{message}"),
    }
}
