//! Outgoing notification channel.

use crate::error::{Result, SyncdError};
use crate::queue::FieldValue;
use log::warn;
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// A notification as it leaves the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedNotification {
    pub name: String,
    pub payload: String,
    pub fields: Vec<FieldValue>,
}

impl PublishedNotification {
    pub fn new(name: impl Into<String>, payload: impl Into<String>, fields: Vec<FieldValue>) -> Self {
        Self {
            name: name.into(),
            payload: payload.into(),
            fields,
        }
    }
}

/// Sink for republished notifications.
pub trait NotificationProducer: Send + Sync {
    fn send(&self, name: &str, payload: &str, fields: &[FieldValue]) -> Result<()>;
}

/// Publishes onto a tokio unbounded channel.
///
/// The pipeline runs on a plain thread, so sending never awaits.
#[derive(Debug, Clone)]
pub struct ChannelProducer {
    tx: mpsc::UnboundedSender<PublishedNotification>,
}

impl ChannelProducer {
    pub fn new(tx: mpsc::UnboundedSender<PublishedNotification>) -> Self {
        Self { tx }
    }

    /// Creates a producer together with the receiving half.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PublishedNotification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl NotificationProducer for ChannelProducer {
    fn send(&self, name: &str, payload: &str, fields: &[FieldValue]) -> Result<()> {
        let notification = PublishedNotification::new(name, payload, fields.to_vec());
        self.tx.send(notification).map_err(|_| {
            warn!("Failed to publish {} notification - receiver dropped", name);
            SyncdError::Publish(format!("{} receiver dropped", name))
        })
    }
}

/// Keeps every published notification in memory.
#[derive(Debug, Default)]
pub struct RecordingProducer {
    sent: Mutex<Vec<PublishedNotification>>,
}

impl RecordingProducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<PublishedNotification> {
        self.sent.lock().clone()
    }

    pub fn sent_named(&self, name: &str) -> Vec<PublishedNotification> {
        self.sent
            .lock()
            .iter()
            .filter(|n| n.name == name)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

impl NotificationProducer for RecordingProducer {
    fn send(&self, name: &str, payload: &str, fields: &[FieldValue]) -> Result<()> {
        self.sent
            .lock()
            .push(PublishedNotification::new(name, payload, fields.to_vec()));
        Ok(())
    }
}
