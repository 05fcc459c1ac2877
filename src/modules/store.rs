use chrono::{DateTime, Local};
use std::collections::HashSet;

use crate::modules::feed::FetchError;

#[derive(Debug, Clone)]
pub struct NotificationRecord {
    pub id: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Local>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationFilter {
    #[default]
    All,
    Unread,
    Read,
}

impl NotificationFilter {
    pub fn next(self) -> Self {
        match self {
            NotificationFilter::All => NotificationFilter::Unread,
            NotificationFilter::Unread => NotificationFilter::Read,
            NotificationFilter::Read => NotificationFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NotificationFilter::All => "all",
            NotificationFilter::Unread => "unread",
            NotificationFilter::Read => "read",
        }
    }

    fn matches(self, record: &NotificationRecord) -> bool {
        match self {
            NotificationFilter::All => true,
            NotificationFilter::Unread => !record.read,
            NotificationFilter::Read => record.read,
        }
    }
}

/// In-memory notification state. All mutation happens on the event-loop
/// task; at most one fetch may be outstanding at a time.
pub struct NotificationStore {
    records: Vec<NotificationRecord>,
    filter: NotificationFilter,
    open: bool,
    fetching: bool,
    last_error: Option<String>,
    last_synced: Option<DateTime<Local>>,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            filter: NotificationFilter::All,
            open: false,
            fetching: false,
            last_error: None,
            last_synced: None,
        }
    }

    /// Marks a fetch outstanding. Returns false when one already is, in which
    /// case the caller must drop the request rather than start a second fetch.
    pub fn begin_fetch(&mut self) -> bool {
        if self.fetching {
            return false;
        }
        self.fetching = true;
        true
    }

    /// Applies a finished fetch. On success the snapshot is replaced wholesale
    /// and the number of previously unseen unread records is returned; on
    /// failure the entire state except `last_error` is left untouched.
    pub fn complete_fetch(
        &mut self,
        outcome: Result<Vec<NotificationRecord>, FetchError>,
    ) -> usize {
        self.fetching = false;
        match outcome {
            Ok(records) => {
                let fresh = {
                    let known: HashSet<&str> =
                        self.records.iter().map(|r| r.id.as_str()).collect();
                    records
                        .iter()
                        .filter(|r| !r.read && !known.contains(r.id.as_str()))
                        .count()
                };
                self.records = records;
                self.last_synced = Some(Local::now());
                self.last_error = None;
                fresh
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                0
            }
        }
    }

    pub fn unread_count(&self) -> usize {
        self.records.iter().filter(|r| !r.read).count()
    }

    pub fn set_filter(&mut self, filter: NotificationFilter) {
        self.filter = filter;
    }

    pub fn cycle_filter(&mut self) {
        self.filter = self.filter.next();
    }

    pub fn filter(&self) -> NotificationFilter {
        self.filter
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn toggle_read(&mut self, id: &str) -> Option<bool> {
        let record = self.records.iter_mut().find(|r| r.id == id)?;
        record.read = !record.read;
        Some(record.read)
    }

    pub fn mark_all_read(&mut self) -> usize {
        let mut changed = 0;
        for record in self.records.iter_mut() {
            if !record.read {
                record.read = true;
                changed += 1;
            }
        }
        changed
    }

    pub fn records(&self) -> &[NotificationRecord] {
        &self.records
    }

    pub fn visible(&self) -> Vec<&NotificationRecord> {
        self.records
            .iter()
            .filter(|r| self.filter.matches(r))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn fetching(&self) -> bool {
        self.fetching
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_synced(&self) -> Option<DateTime<Local>> {
        self.last_synced
    }
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}
