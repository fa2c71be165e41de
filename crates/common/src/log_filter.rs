//! Client-side log filtering
//!
//! Filters an already-loaded table of log entries by level, source and an
//! inclusive date range without asking the backend again. Visibility is a
//! boolean on each entry; [`apply_filter`] only ever flips that flag.
//!
//! Predicates run in a fixed order (level, source, from, to) and each one
//! only hides rows that are still visible, so they combine as a logical AND.
//! Entries whose timestamp could not be parsed are excluded whenever a date
//! bound is active.
//!
//! # Example
//!
//! ```
//! use common::log_filter::{FilterCriteria, LogEntry, apply_filter};
//! use protocol::LogLevel;
//!
//! let mut entries = vec![
//!     LogEntry::new(1, "2024-03-01 10:00:00", LogLevel::Error, "usbip", "bind failed"),
//!     LogEntry::new(2, "2024-03-01 11:00:00", LogLevel::Info, "system", "started"),
//! ];
//! let criteria = FilterCriteria::from_form("error", "all", "", "").unwrap();
//! let outcome = apply_filter(&criteria, &mut entries);
//! assert_eq!(outcome.visible_count, 1);
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use protocol::{LogLevel, LogRecord};
use std::collections::BTreeSet;
use thiserror::Error;

/// Timestamp layouts the backend has been seen to render
const TIMESTAMP_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
];

/// Date layouts accepted in the filter form
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d.%m.%Y"];

/// Errors from building [`FilterCriteria`] out of form input
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("Unknown log level: {0}")]
    UnknownLevel(String),

    #[error("Invalid {field} date '{value}', expected YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },

    #[error("Date range is empty: {from} is after {to}")]
    EmptyRange { from: NaiveDate, to: NaiveDate },
}

/// Parse a backend timestamp; `None` when no known layout matches
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| parse_date(raw).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// One row of the log table
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub id: u64,
    /// Timestamp exactly as the backend rendered it
    pub timestamp: String,
    pub level: LogLevel,
    pub source: String,
    pub message: String,
    parsed: Option<NaiveDateTime>,
    visible: bool,
}

impl LogEntry {
    pub fn new(id: u64, timestamp: &str, level: LogLevel, source: &str, message: &str) -> Self {
        Self {
            id,
            timestamp: timestamp.to_string(),
            level,
            source: source.to_string(),
            message: message.to_string(),
            parsed: parse_timestamp(timestamp),
            visible: true,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

impl From<LogRecord> for LogEntry {
    fn from(record: LogRecord) -> Self {
        let parsed = parse_timestamp(&record.timestamp);
        Self {
            id: record.id,
            timestamp: record.timestamp,
            level: record.level,
            source: record.source.unwrap_or_default(),
            message: record.message,
            parsed,
            visible: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LevelFilter {
    #[default]
    All,
    Only(LogLevel),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SourceFilter {
    #[default]
    All,
    Only(String),
}

/// User-selected predicates; rebuilt from the form on every run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub level: LevelFilter,
    pub source: SourceFilter,
    /// Inclusive, from 00:00:00
    pub date_from: Option<NaiveDate>,
    /// Inclusive, through the end of the day
    pub date_to: Option<NaiveDate>,
}

impl FilterCriteria {
    /// Criteria that keep every entry
    pub fn all() -> Self {
        Self::default()
    }

    /// Build criteria from raw form values
    ///
    /// Empty strings and "all" mean no restriction. Dates must be
    /// `YYYY-MM-DD` (or `DD.MM.YYYY`); anything else is rejected instead of
    /// being compared as an invalid date.
    pub fn from_form(
        level: &str,
        source: &str,
        date_from: &str,
        date_to: &str,
    ) -> Result<Self, FilterError> {
        let level = match level.trim() {
            l if l.is_empty() || l.eq_ignore_ascii_case("all") => LevelFilter::All,
            l => LevelFilter::Only(
                l.parse::<LogLevel>()
                    .map_err(|_| FilterError::UnknownLevel(l.to_string()))?,
            ),
        };

        let source = match source.trim() {
            s if s.is_empty() || s.eq_ignore_ascii_case("all") => SourceFilter::All,
            s => SourceFilter::Only(s.to_string()),
        };

        let date_from = form_date("from", date_from)?;
        let date_to = form_date("to", date_to)?;
        if let (Some(from), Some(to)) = (date_from, date_to) {
            if from > to {
                return Err(FilterError::EmptyRange { from, to });
            }
        }

        Ok(Self {
            level,
            source,
            date_from,
            date_to,
        })
    }

    /// True when no predicate is active
    pub fn is_unrestricted(&self) -> bool {
        *self == Self::all()
    }
}

fn form_date(field: &'static str, raw: &str) -> Result<Option<NaiveDate>, FilterError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    parse_date(raw)
        .map(Some)
        .ok_or_else(|| FilterError::InvalidDate {
            field,
            value: raw.to_string(),
        })
}

/// Result of one filter pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    pub visible_count: usize,
    pub total: usize,
}

/// Recompute visibility of every entry and count the survivors
pub fn apply_filter(criteria: &FilterCriteria, entries: &mut [LogEntry]) -> FilterOutcome {
    for entry in entries.iter_mut() {
        entry.visible = true;
    }

    if let LevelFilter::Only(level) = &criteria.level {
        hide_unless(entries, |e| &e.level == level);
    }

    if let SourceFilter::Only(source) = &criteria.source {
        hide_unless(entries, |e| &e.source == source);
    }

    if let Some(from) = criteria.date_from {
        hide_unless(entries, |e| e.parsed.is_some_and(|ts| ts.date() >= from));
    }

    if let Some(to) = criteria.date_to {
        hide_unless(entries, |e| e.parsed.is_some_and(|ts| ts.date() <= to));
    }

    FilterOutcome {
        visible_count: entries.iter().filter(|e| e.visible).count(),
        total: entries.len(),
    }
}

fn hide_unless(entries: &mut [LogEntry], keep: impl Fn(&LogEntry) -> bool) {
    for entry in entries.iter_mut().filter(|e| e.visible) {
        if !keep(&*entry) {
            entry.visible = false;
        }
    }
}

/// Log entries for one loaded view plus the last filter applied to them
#[derive(Debug, Clone, Default)]
pub struct LogTable {
    entries: Vec<LogEntry>,
    criteria: FilterCriteria,
    outcome: FilterOutcome,
}

impl LogTable {
    /// Replace the table contents and re-apply the current criteria
    pub fn load(&mut self, records: Vec<LogRecord>) {
        self.entries = records.into_iter().map(LogEntry::from).collect();
        self.outcome = apply_filter(&self.criteria, &mut self.entries);
    }

    pub fn apply(&mut self, criteria: FilterCriteria) -> FilterOutcome {
        self.criteria = criteria;
        self.outcome = apply_filter(&self.criteria, &mut self.entries);
        self.outcome
    }

    pub fn clear_filter(&mut self) -> FilterOutcome {
        self.apply(FilterCriteria::all())
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn visible(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(|e| e.visible)
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn outcome(&self) -> FilterOutcome {
        self.outcome
    }

    /// Distinct non-empty sources, sorted, for the source selector
    pub fn sources(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| !e.source.is_empty())
            .map(|e| e.source.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
