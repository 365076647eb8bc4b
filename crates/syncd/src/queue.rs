//! Handoff queue between the driver callback and the notification worker.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

/// A field-value pair.
pub type FieldValue = (String, String);

/// A raw notification as received from the driver.
///
/// `key` carries the notification name and `op` its serialized payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyOpFieldsValues {
    pub key: String,
    pub op: String,
    pub fvs: Vec<FieldValue>,
}

impl KeyOpFieldsValues {
    pub fn new(key: impl Into<String>, op: impl Into<String>, fvs: Vec<FieldValue>) -> Self {
        Self {
            key: key.into(),
            op: op.into(),
            fvs,
        }
    }

    /// Creates an item with no extra fields.
    pub fn notification(name: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::new(name, payload, Vec::new())
    }

    /// Notification name.
    pub fn name(&self) -> &str {
        &self.key
    }

    /// Serialized notification payload.
    pub fn payload(&self) -> &str {
        &self.op
    }

    pub fn get_field(&self, field: &str) -> Option<&str> {
        self.fvs
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, v)| v.as_str())
    }
}

/// Unbounded FIFO of pending notifications.
///
/// Enqueue never blocks on the consumer: the lock is only held for the
/// push or pop itself.
#[derive(Debug, Default)]
pub struct NotificationQueue {
    items: Mutex<VecDeque<KeyOpFieldsValues>>,
    enqueued_total: AtomicU64,
    dequeued_total: AtomicU64,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, item: KeyOpFieldsValues) {
        self.items.lock().push_back(item);
        self.enqueued_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Pops the oldest item, if any.
    pub fn try_dequeue(&self) -> Option<KeyOpFieldsValues> {
        let item = self.items.lock().pop_front();
        if item.is_some() {
            self.dequeued_total.fetch_add(1, Ordering::Relaxed);
        }
        item
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Drops every pending item, returning how many were discarded.
    pub fn clear(&self) -> usize {
        let mut items = self.items.lock();
        let dropped = items.len();
        items.clear();
        dropped
    }

    pub fn enqueued_total(&self) -> u64 {
        self.enqueued_total.load(Ordering::Relaxed)
    }

    pub fn dequeued_total(&self) -> u64 {
        self.dequeued_total.load(Ordering::Relaxed)
    }
}
