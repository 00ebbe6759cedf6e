//! Repeated events (e.g. trades) and their mutually exclusive status categories

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status category of a repeated event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Completed event with a realized outcome
    Closed,
    /// Event still in progress; its outcome is unrealized
    Open,
}

impl EventStatus {
    /// Category name used in observation counts
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Closed => "closed",
            EventStatus::Open => "open",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One occurrence of a repeated-event type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Provider identifier of the event
    pub id: String,
    /// Status category
    pub status: EventStatus,
    /// Realized return for closed events, mark-to-market return for open ones
    pub return_pct: f64,
    /// When the event started
    pub opened_at: DateTime<Utc>,
    /// When the event completed (closed events only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    /// Adapter that reported the event
    #[serde(default)]
    pub source: String,
}

/// Events partitioned into closed and open categories
///
/// The only constructor is [`EventSet::partition`], so a statistic computed
/// from one side can never include events of the other.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventSet {
    closed: Vec<Event>,
    open: Vec<Event>,
}

impl EventSet {
    /// Partition events by status; duplicate event ids keep the first report
    pub fn partition(events: impl IntoIterator<Item = Event>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let mut set = Self::default();
        for event in events {
            if !seen.insert(event.id.clone()) {
                continue;
            }
            match event.status {
                EventStatus::Closed => set.closed.push(event),
                EventStatus::Open => set.open.push(event),
            }
        }
        set.closed
            .sort_by(|a, b| a.closed_at.unwrap_or(a.opened_at).cmp(&b.closed_at.unwrap_or(b.opened_at)));
        set.open.sort_by(|a, b| a.opened_at.cmp(&b.opened_at));
        set
    }

    /// Event ids reported with more than one status, with the statuses seen
    ///
    /// [`EventSet::partition`] keeps the first report of such an id; callers
    /// use this to surface the conflict instead of resolving it silently.
    pub fn status_conflicts(events: &[Event]) -> Vec<(String, Vec<EventStatus>)> {
        let mut statuses: std::collections::BTreeMap<&str, Vec<EventStatus>> =
            std::collections::BTreeMap::new();
        for event in events {
            let seen = statuses.entry(event.id.as_str()).or_default();
            if !seen.contains(&event.status) {
                seen.push(event.status);
            }
        }
        statuses
            .into_iter()
            .filter(|(_, seen)| seen.len() > 1)
            .map(|(id, seen)| (id.to_string(), seen))
            .collect()
    }

    /// Closed events, ordered by close time
    pub fn closed(&self) -> &[Event] {
        &self.closed
    }

    /// Open events, ordered by open time
    pub fn open(&self) -> &[Event] {
        &self.open
    }

    /// Events of one category
    pub fn of(&self, status: EventStatus) -> &[Event] {
        match status {
            EventStatus::Closed => &self.closed,
            EventStatus::Open => &self.open,
        }
    }

    /// Whether no events were observed
    pub fn is_empty(&self) -> bool {
        self.closed.is_empty() && self.open.is_empty()
    }
}
