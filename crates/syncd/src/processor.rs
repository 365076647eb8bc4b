//! Notification router and republisher.
//!
//! Every raw notification goes through the same steps:
//!
//! 1. decode the payload into a [`NotificationEvent`]
//! 2. translate every RID it carries into a VID
//! 3. for FDB batches, validate the referenced ids and apply each entry to
//!    the ASIC view
//! 4. re-serialize and publish the translated event
//!
//! Errors never leave [`NotificationProcessor::sync_process_notification`]:
//! they are logged, counted and the notification is dropped.

use crate::asic_store::AsicStateStore;
use crate::config::ProcessorConfig;
use crate::error::{Result, SyncdError};
use crate::fdb::{check_fdb_event_entry, contains_flush_event, ApplyOutcome, FdbApplier};
use crate::producer::NotificationProducer;
use crate::queue::{FieldValue, KeyOpFieldsValues};
use crate::translator::VidTranslator;
use log::{debug, error, info, warn};
use sonic_sai::notification::SWITCH_NOTIFICATION_NAME_FDB_EVENT;
use sonic_sai::{
    deserialize_notification, serialize_fdb_entry, serialize_notification, AttrSchema,
    DeadlockEntry, FdbEntryEvent, NotificationEvent, ObjectType, PortStatusEntry, RawSaiObjectId,
    SwitchOperStatus, SwitchOid, SAI_NULL_OBJECT_ID,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Processing counters.
#[derive(Debug, Default)]
pub struct ProcessorStats {
    pub processed: AtomicU64,
    pub republished: AtomicU64,
    pub decode_errors: AtomicU64,
    pub unknown_notifications: AtomicU64,
    pub validation_failures: AtomicU64,
    pub entry_errors: AtomicU64,
    pub publish_errors: AtomicU64,
    pub store_creates: AtomicU64,
    pub store_removes: AtomicU64,
    pub store_flushes: AtomicU64,
}

/// Point-in-time copy of [`ProcessorStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub processed: u64,
    pub republished: u64,
    pub decode_errors: u64,
    pub unknown_notifications: u64,
    pub validation_failures: u64,
    pub entry_errors: u64,
    pub publish_errors: u64,
    pub store_creates: u64,
    pub store_removes: u64,
    pub store_flushes: u64,
}

impl ProcessorStats {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        StatsSnapshot {
            processed: load(&self.processed),
            republished: load(&self.republished),
            decode_errors: load(&self.decode_errors),
            unknown_notifications: load(&self.unknown_notifications),
            validation_failures: load(&self.validation_failures),
            entry_errors: load(&self.entry_errors),
            publish_errors: load(&self.publish_errors),
            store_creates: load(&self.store_creates),
            store_removes: load(&self.store_removes),
            store_flushes: load(&self.store_flushes),
        }
    }
}

/// Decodes, translates, applies and republishes switch notifications.
pub struct NotificationProcessor {
    producer: Arc<dyn NotificationProducer>,
    store: Arc<dyn AsicStateStore>,
    translator: Arc<dyn VidTranslator>,
    schema: AttrSchema,
    config: ProcessorConfig,
    stats: ProcessorStats,
}

impl NotificationProcessor {
    pub fn new(
        producer: Arc<dyn NotificationProducer>,
        store: Arc<dyn AsicStateStore>,
        translator: Arc<dyn VidTranslator>,
    ) -> Self {
        Self {
            producer,
            store,
            translator,
            schema: AttrSchema::builtin(),
            config: ProcessorConfig::default(),
            stats: ProcessorStats::default(),
        }
    }

    pub fn with_config(mut self, config: ProcessorConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the attribute schema used to decode and store FDB attributes.
    pub fn with_schema(mut self, schema: AttrSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Processes one raw notification on the calling thread.
    pub fn sync_process_notification(&self, item: &KeyOpFieldsValues) {
        ProcessorStats::bump(&self.stats.processed);

        if let Err(e) = self.handle_notification(item.name(), item.payload()) {
            match e {
                SyncdError::UnknownEventKind(_) => {
                    ProcessorStats::bump(&self.stats.unknown_notifications)
                }
                SyncdError::Decode(_) => ProcessorStats::bump(&self.stats.decode_errors),
                SyncdError::Publish(_) => ProcessorStats::bump(&self.stats.publish_errors),
                _ => {}
            }
            error!(
                "dropped {} notification: {} (payload: {})",
                item.name(),
                e,
                self.config.truncate_payload(item.payload())
            );
        }
    }

    /// Decodes a notification and routes it to its handler.
    pub fn handle_notification(&self, name: &str, payload: &str) -> Result<()> {
        let event = deserialize_notification(name, payload, &self.schema)?;

        match event {
            NotificationEvent::SwitchStateChange {
                switch_id,
                oper_status,
            } => self.process_on_switch_state_change(switch_id, oper_status),
            NotificationEvent::FdbEvent { entries } => {
                if contains_flush_event(&entries) {
                    info!(
                        "got fdb flush event: {}",
                        self.config.truncate_payload(payload)
                    );
                }
                self.process_on_fdb_event(entries)
            }
            NotificationEvent::QueueDeadlock { entries } => {
                self.process_on_queue_deadlock_event(entries)
            }
            NotificationEvent::PortStateChange { entries } => {
                self.process_on_port_state_change(entries)
            }
            NotificationEvent::SwitchShutdownRequest { switch_id } => {
                self.process_on_switch_shutdown_request(switch_id)
            }
        }
    }

    fn translate_switch(&self, switch_id: SwitchOid) -> SwitchOid {
        switch_id.with_raw(
            self.translator
                .translate(switch_id.as_raw(), SAI_NULL_OBJECT_ID),
        )
    }

    pub fn process_on_switch_state_change(
        &self,
        switch_id: SwitchOid,
        oper_status: SwitchOperStatus,
    ) -> Result<()> {
        let event = NotificationEvent::SwitchStateChange {
            switch_id: self.translate_switch(switch_id),
            oper_status,
        };
        self.republish(&event)
    }

    pub fn process_on_switch_shutdown_request(&self, switch_id: SwitchOid) -> Result<()> {
        let event = NotificationEvent::SwitchShutdownRequest {
            switch_id: self.translate_switch(switch_id),
        };
        self.republish(&event)
    }

    /// Translates, validates and applies an FDB batch.
    ///
    /// Every entry is applied even when the batch fails validation; only
    /// the republish is suppressed.
    pub fn process_on_fdb_event(&self, mut entries: Vec<FdbEntryEvent>) -> Result<()> {
        info!("fdb event count: {}", entries.len());

        let mut valid = true;
        let mut applier = FdbApplier::new(
            self.store.as_ref(),
            &self.schema,
            self.config.notifications.dedup_flush_scopes,
        );

        for (i, entry) in entries.iter_mut().enumerate() {
            valid &= check_fdb_event_entry(self.translator.as_ref(), &self.schema, entry);

            debug!("fdb {}: type: {}", i, entry.event_type);

            let unresolved = self.translate_fdb_entry(entry);

            match applier.apply(entry, &unresolved) {
                Ok(outcome) => self.count_outcome(outcome),
                Err(e) => {
                    ProcessorStats::bump(&self.stats.entry_errors);
                    error!(
                        "failed to apply fdb entry {}: {}",
                        serialize_fdb_entry(&entry.fdb_entry),
                        e
                    );
                }
            }
        }

        if !valid {
            ProcessorStats::bump(&self.stats.validation_failures);
            return Err(SyncdError::ValidationFailure(format!(
                "{} notification contains unknown ids and was not sent",
                SWITCH_NOTIFICATION_NAME_FDB_EVENT
            )));
        }

        self.republish(&NotificationEvent::FdbEvent { entries })
    }

    /// Rewrites an entry to VIDs and returns the RIDs that had none.
    fn translate_fdb_entry(&self, entry: &mut FdbEntryEvent) -> Vec<RawSaiObjectId> {
        let mut unresolved = Vec::new();
        let fdb = &mut entry.fdb_entry;

        let switch_rid = fdb.switch_id.as_raw();
        match self.translator.try_translate(switch_rid) {
            Some(vid) => fdb.switch_id = fdb.switch_id.with_raw(vid),
            None => {
                unresolved.push(switch_rid);
                fdb.switch_id = SwitchOid::NULL;
            }
        }

        let bv_rid = fdb.bv_id;
        fdb.bv_id = self.translator.try_translate(bv_rid).unwrap_or_else(|| {
            unresolved.push(bv_rid);
            SAI_NULL_OBJECT_ID
        });

        unresolved.extend(self.translator.translate_attribute_list(
            ObjectType::FdbEntry,
            fdb.switch_id,
            &mut entry.attributes,
        ));
        unresolved
    }

    fn count_outcome(&self, outcome: ApplyOutcome) {
        match outcome {
            ApplyOutcome::Created => ProcessorStats::bump(&self.stats.store_creates),
            ApplyOutcome::Removed { .. } => ProcessorStats::bump(&self.stats.store_removes),
            ApplyOutcome::Flushed { .. } => ProcessorStats::bump(&self.stats.store_flushes),
            ApplyOutcome::SkippedNullKey | ApplyOutcome::FlushDeduplicated => {}
        }
    }

    pub fn process_on_queue_deadlock_event(&self, mut entries: Vec<DeadlockEntry>) -> Result<()> {
        debug!("queue deadlock notification count: {}", entries.len());

        for entry in entries.iter_mut() {
            let vid = self
                .translator
                .translate(entry.queue_id.as_raw(), SAI_NULL_OBJECT_ID);
            entry.queue_id = entry.queue_id.with_raw(vid);
        }

        self.republish(&NotificationEvent::QueueDeadlock { entries })
    }

    /// Port ids that are not known (yet, or any more) become null. Ports are
    /// removed concurrently with link events, so this is not an error.
    pub fn process_on_port_state_change(&self, mut entries: Vec<PortStatusEntry>) -> Result<()> {
        debug!("port notification count: {}", entries.len());

        let mut translated_to_null = false;
        for entry in entries.iter_mut() {
            let rid = entry.port_id;
            info!("Port RID {} state change notification", rid);

            let vid = match self.translator.try_translate(rid.as_raw()) {
                Some(vid) => vid,
                None => {
                    warn!("Port RID {} translated to null VID", rid);
                    translated_to_null = true;
                    SAI_NULL_OBJECT_ID
                }
            };
            entry.port_id = rid.with_raw(vid);

            info!("Port VID {} state change notification", entry.port_id);
        }

        if translated_to_null && !self.config.notifications.republish_null_port_events {
            return Err(SyncdError::TranslationMiss(
                "port state change with unknown port not republished".to_string(),
            ));
        }

        self.republish(&NotificationEvent::PortStateChange { entries })
    }

    fn republish(&self, event: &NotificationEvent) -> Result<()> {
        let payload = serialize_notification(event, &self.schema)?;
        self.send_notification(event.name(), &payload, &[])?;
        ProcessorStats::bump(&self.stats.republished);
        Ok(())
    }

    /// Publishes a notification on the outgoing channel.
    pub fn send_notification(&self, name: &str, payload: &str, fields: &[FieldValue]) -> Result<()> {
        info!("{} {}", name, self.config.truncate_payload(payload));

        self.producer.send(name, payload, fields)?;

        debug!("notification send successful");
        Ok(())
    }
}
