//! Toast notification queue
//!
//! Short-lived status messages tagged with a [`Severity`]. Each message owns
//! its own expiry deadline, so one toast expiring or being dismissed never
//! touches another. Display order is FIFO.
//!
//! The process-wide queue is reached through [`Notifier::global`], created
//! on first use. Background tasks post to it with [`notify`]; the UI reads it
//! on every frame and calls [`Notifier::expire`] on each tick.
//!
//! # Example
//!
//! ```
//! use common::clock::ManualClock;
//! use common::notifications::NotificationQueue;
//! use protocol::Severity;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let clock = ManualClock::new();
//! let mut queue = NotificationQueue::new(Arc::new(clock.clone()));
//! queue.notify("Device attached", Severity::Success);
//! assert_eq!(queue.len(), 1);
//!
//! clock.advance(Duration::from_millis(5000));
//! queue.expire();
//! assert!(queue.is_empty());
//! ```

use crate::clock::{Clock, SystemClock};
use protocol::Severity;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::{Duration, Instant};
use tracing::debug;

/// How long a toast stays on screen unless configured otherwise
pub const DEFAULT_TTL: Duration = Duration::from_millis(5000);

/// Identity of one toast; never reused within a process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationId(pub u64);

/// A live toast
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub severity: Severity,
    pub created_at: Instant,
    pub ttl: Duration,
}

impl Notification {
    pub fn expires_at(&self) -> Instant {
        self.created_at + self.ttl
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at()
    }

    /// Time left before expiry (zero once expired)
    pub fn remaining(&self, now: Instant) -> Duration {
        self.expires_at().saturating_duration_since(now)
    }
}

/// FIFO queue of toasts with independent expiry
#[derive(Debug)]
pub struct NotificationQueue {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    next_id: u64,
    items: VecDeque<Notification>,
}

impl NotificationQueue {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            ttl: DEFAULT_TTL,
            next_id: 1,
            items: VecDeque::new(),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Change the display duration for toasts created from now on
    pub fn set_ttl(&mut self, ttl: Duration) {
        self.ttl = ttl;
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Append a toast and start its expiry
    ///
    /// Control characters in `message` are replaced with spaces so text
    /// coming from the backend cannot emit terminal escape sequences.
    pub fn notify(&mut self, message: &str, severity: Severity) -> NotificationId {
        let id = NotificationId(self.next_id);
        self.next_id += 1;

        let message = sanitize(message);
        debug!("Notification {} [{}]: {}", id.0, severity, message);

        self.items.push_back(Notification {
            id,
            message,
            severity,
            created_at: self.clock.now(),
            ttl: self.ttl,
        });
        id
    }

    /// Remove a toast before it expires
    ///
    /// Returns false if it already expired or was dismissed.
    pub fn dismiss(&mut self, id: NotificationId) -> bool {
        let now = self.clock.now();
        match self.items.iter().position(|n| n.id == id) {
            Some(pos) => self.items.remove(pos).is_some_and(|n| !n.is_expired(now)),
            None => false,
        }
    }

    /// Dismiss the oldest toast still on screen
    pub fn dismiss_oldest(&mut self) -> Option<NotificationId> {
        self.expire();
        self.items.pop_front().map(|n| n.id)
    }

    /// Drop every toast whose deadline has passed; returns how many
    pub fn expire(&mut self) -> usize {
        let now = self.clock.now();
        let before = self.items.len();
        self.items.retain(|n| !n.is_expired(now));
        before - self.items.len()
    }

    /// Toasts currently on screen, oldest first
    pub fn visible(&self) -> impl Iterator<Item = &Notification> {
        let now = self.clock.now();
        self.items.iter().filter(move |n| !n.is_expired(now))
    }

    /// Number of toasts currently on screen
    pub fn len(&self) -> usize {
        self.visible().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop everything; ids keep increasing so stale ids stay invalid
    pub fn reset(&mut self) {
        self.items.clear();
    }
}

fn sanitize(message: &str) -> String {
    message
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Shared handle to a [`NotificationQueue`]
///
/// Cheap to clone; every clone refers to the same queue.
#[derive(Debug, Clone)]
pub struct Notifier {
    inner: Arc<Mutex<NotificationQueue>>,
}

impl Notifier {
    pub fn new(queue: NotificationQueue) -> Self {
        Self {
            inner: Arc::new(Mutex::new(queue)),
        }
    }

    /// The process-wide queue, created on first use
    pub fn global() -> &'static Notifier {
        static GLOBAL: OnceLock<Notifier> = OnceLock::new();
        GLOBAL.get_or_init(|| Notifier::new(NotificationQueue::new(Arc::new(SystemClock))))
    }

    fn lock(&self) -> MutexGuard<'_, NotificationQueue> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn notify(&self, message: &str, severity: Severity) -> NotificationId {
        self.lock().notify(message, severity)
    }

    pub fn dismiss(&self, id: NotificationId) -> bool {
        self.lock().dismiss(id)
    }

    pub fn dismiss_oldest(&self) -> Option<NotificationId> {
        self.lock().dismiss_oldest()
    }

    pub fn expire(&self) -> usize {
        self.lock().expire()
    }

    /// Copy of the toasts on screen, oldest first
    pub fn snapshot(&self) -> Vec<Notification> {
        self.lock().visible().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn set_ttl(&self, ttl: Duration) {
        self.lock().set_ttl(ttl);
    }

    pub fn reset(&self) {
        self.lock().reset();
    }
}

/// Post a toast to the process-wide queue
pub fn notify(message: &str, severity: Severity) {
    Notifier::global().notify(message, severity);
}

/// Clear the process-wide queue
pub fn reset() {
    Notifier::global().reset();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn queue() -> (ManualClock, NotificationQueue) {
        let clock = ManualClock::new();
        let queue = NotificationQueue::new(Arc::new(clock.clone()));
        (clock, queue)
    }

    #[test]
    fn test_fifo_order() {
        let (_clock, mut queue) = queue();
        queue.notify("first", Severity::Info);
        queue.notify("second", Severity::Warning);
        queue.notify("third", Severity::Danger);

        let messages: Vec<&str> = queue.visible().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_independent_expiry() {
        let (clock, mut queue) = queue();
        queue.notify("early", Severity::Info);
        clock.advance(Duration::from_millis(3000));
        queue.notify("late", Severity::Info);

        clock.advance(Duration::from_millis(2000));
        assert_eq!(queue.expire(), 1);
        let remaining: Vec<&str> = queue.visible().map(|n| n.message.as_str()).collect();
        assert_eq!(remaining, vec!["late"]);

        clock.advance(Duration::from_millis(3000));
        assert_eq!(queue.expire(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_expired_hidden_before_sweep() {
        let (clock, mut queue) = queue();
        queue.notify("gone", Severity::Success);
        clock.advance(DEFAULT_TTL);
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_dismiss_is_idempotent() {
        let (_clock, mut queue) = queue();
        let a = queue.notify("a", Severity::Info);
        let b = queue.notify("b", Severity::Info);

        assert!(queue.dismiss(a));
        assert!(!queue.dismiss(a));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.visible().next().map(|n| n.id), Some(b));
    }

    #[test]
    fn test_dismiss_after_expiry_returns_false() {
        let (clock, mut queue) = queue();
        let id = queue.notify("late dismiss", Severity::Info);
        clock.advance(DEFAULT_TTL + Duration::from_millis(1));
        assert!(!queue.dismiss(id));
    }

    #[test]
    fn test_dismiss_oldest() {
        let (_clock, mut queue) = queue();
        let first = queue.notify("one", Severity::Info);
        queue.notify("two", Severity::Info);
        assert_eq!(queue.dismiss_oldest(), Some(first));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_ids_survive_reset() {
        let (_clock, mut queue) = queue();
        let before = queue.notify("x", Severity::Info);
        queue.reset();
        let after = queue.notify("y", Severity::Info);
        assert!(after > before);
        assert!(!queue.dismiss(before));
    }

    #[test]
    fn test_sanitize_strips_control_characters() {
        let (_clock, mut queue) = queue();
        queue.notify("bad\x1b[31m red\nline", Severity::Danger);
        let message = &queue.visible().next().unwrap().message;
        assert!(!message.contains('\x1b'));
        assert!(!message.contains('\n'));
        assert!(message.contains("red"));
    }

    #[test]
    fn test_custom_ttl() {
        let (clock, queue) = queue();
        let mut queue = queue.with_ttl(Duration::from_millis(100));
        queue.notify("short", Severity::Info);
        clock.advance(Duration::from_millis(99));
        assert_eq!(queue.len(), 1);
        clock.advance(Duration::from_millis(1));
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_notifier_clones_share_queue() {
        let clock = ManualClock::new();
        let notifier = Notifier::new(NotificationQueue::new(Arc::new(clock)));
        let other = notifier.clone();
        other.notify("shared", Severity::Info);
        assert_eq!(notifier.len(), 1);
        notifier.reset();
        assert!(other.is_empty());
    }
}
