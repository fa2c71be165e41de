//! Common utilities for usbip-console
//!
//! This crate holds the state that lives between the backend client and the
//! terminal UI: the toast notification queue, client-side log filtering,
//! the clock abstraction both of them expire against, error handling and
//! logging setup.

pub mod clock;
pub mod error;
pub mod log_filter;
pub mod logging;
pub mod notifications;
pub mod test_utils;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use log_filter::{
    FilterCriteria, FilterError, FilterOutcome, LevelFilter, LogEntry, LogTable, SourceFilter,
    apply_filter,
};
pub use logging::setup_logging;
pub use notifications::{Notification, NotificationId, NotificationQueue, Notifier, notify};
