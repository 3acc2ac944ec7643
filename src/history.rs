//! Poll and command history for diagnostics.

use std::collections::HashMap;
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::runtime::Instant;

/// What the entity asked the device to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    Connect,
    Poll,
    TurnOn,
    TurnOff,
}

/// How a device call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOutcome {
    Success,
    Timeout,
    Failure,
}

/// A recorded device call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub kind: EventKind,
    pub outcome: EventOutcome,
    /// Seconds since history creation
    pub timestamp: f64,
}

/// Bounded record of the device calls an entity made.
#[derive(Debug, Clone)]
pub struct EventHistory {
    counts: HashMap<(EventKind, EventOutcome), usize>,
    last_error: Option<String>,
    start_time: Instant,
    entries: VecDeque<HistoryEntry>,
    max_entries: usize,
}

impl Default for EventHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHistory {
    pub const DEFAULT_MAX_ENTRIES: usize = 100;

    pub fn new() -> Self {
        Self {
            counts: HashMap::new(),
            last_error: None,
            start_time: Instant::now(),
            entries: VecDeque::new(),
            max_entries: Self::DEFAULT_MAX_ENTRIES,
        }
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            max_entries,
            ..Self::new()
        }
    }

    pub fn record(&mut self, kind: EventKind, outcome: EventOutcome) {
        *self.counts.entry((kind, outcome)).or_default() += 1;

        self.entries.push_back(HistoryEntry {
            kind,
            outcome,
            timestamp: self.start_time.elapsed().as_secs_f64(),
        });

        if self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }

    /// Record a failed call together with its error message.
    pub fn record_error(&mut self, kind: EventKind, outcome: EventOutcome, error: &str) {
        self.record(kind, outcome);
        self.last_error = Some(format!("{kind}: {error}"));
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn count(&self, kind: EventKind, outcome: EventOutcome) -> usize {
        self.counts.get(&(kind, outcome)).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.counts.clear();
        self.entries.clear();
        self.last_error = None;
    }

    pub fn summary(&self) -> HistorySummary {
        let total = |outcome: EventOutcome| {
            self.counts
                .iter()
                .filter(|((_, o), _)| *o == outcome)
                .map(|(_, n)| n)
                .sum::<usize>()
        };
        HistorySummary {
            successes: total(EventOutcome::Success),
            timeouts: total(EventOutcome::Timeout),
            failures: total(EventOutcome::Failure),
            total_entries: self.entries.len(),
            last_error: self.last_error.clone(),
        }
    }
}

/// Summary of event history for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySummary {
    pub successes: usize,
    pub timeouts: usize,
    pub failures: usize,
    pub total_entries: usize,
    pub last_error: Option<String>,
}
