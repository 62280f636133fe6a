//! Session activity log - Recent lifecycle events shown in the History view

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

/// Number of entries kept in memory
pub const ACTIVITY_CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    StatusChecked,
    StatusUnavailable,
    CommandIssued,
    CommandSucceeded,
    CommandFailed,
    CommandRejected,
}

impl ActivityKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::StatusChecked => "Status",
            Self::StatusUnavailable => "Status unavailable",
            Self::CommandIssued => "Command",
            Self::CommandSucceeded => "Success",
            Self::CommandFailed => "Failure",
            Self::CommandRejected => "Rejected",
        }
    }

    pub fn is_problem(&self) -> bool {
        matches!(
            self,
            Self::StatusUnavailable | Self::CommandFailed | Self::CommandRejected
        )
    }
}

#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub at: DateTime<Utc>,
    pub kind: ActivityKind,
    pub message: String,
}

/// Bounded, newest-first record of what the controller did this session
#[derive(Debug, Default)]
pub struct ActivityLog {
    entries: VecDeque<ActivityEntry>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: ActivityKind, message: impl Into<String>) {
        self.entries.push_front(ActivityEntry {
            at: Utc::now(),
            kind,
            message: message.into(),
        });
        self.entries.truncate(ACTIVITY_CAPACITY);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActivityEntry> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
