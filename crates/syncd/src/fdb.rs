//! FDB event validation and ASIC view application.

use crate::asic_store::AsicStateStore;
use crate::error::{Result, SyncdError};
use crate::translator::VidTranslator;
use log::{debug, error, warn};
use sonic_sai::attribute::serialize_attr_list;
use sonic_sai::{
    fdb_entry_attr, serialize_fdb_entry, serialize_object_meta_key, AttrSchema, AttrValue,
    AttrValueType, Attribute, BridgePortOid, FdbEntryEvent, FdbEntryType, FdbEventType,
    FdbFlushEntryType, ObjectMetaKey, ObjectType, RawSaiObjectId, SwitchOid, SAI_NULL_OBJECT_ID,
};
use std::collections::HashSet;

/// Returns true if any entry of the batch is a flush marker (all-zero MAC).
pub fn contains_flush_event(entries: &[FdbEntryEvent]) -> bool {
    entries.iter().any(|e| e.fdb_entry.mac_address.is_zero())
}

/// Entry type carried by an event, if it carries a recognized one.
pub fn fdb_entry_type(event: &FdbEntryEvent) -> Option<FdbEntryType> {
    let entry_type = event.entry_type().and_then(FdbEntryType::from_s32);
    if entry_type.is_none() {
        debug!(
            "no fdb entry type on {}",
            serialize_fdb_entry(&event.fdb_entry)
        );
    }
    entry_type
}

/// Flush scope of a flushed entry: only static entries flush static rows.
pub fn flush_entry_type(event: &FdbEntryEvent) -> FdbFlushEntryType {
    match fdb_entry_type(event) {
        Some(FdbEntryType::Static) => FdbFlushEntryType::Static,
        _ => FdbFlushEntryType::Dynamic,
    }
}

/// Checks that every id an FDB entry references is already known locally.
///
/// Drivers may report objects not discovered yet, or plain garbage. Either
/// way the entry must not be forwarded, but the check never aborts: every
/// failing id is logged so the batch can be correlated with driver logs.
pub fn check_fdb_event_entry(
    translator: &dyn VidTranslator,
    schema: &AttrSchema,
    event: &FdbEntryEvent,
) -> bool {
    let entry = &event.fdb_entry;
    let mut result = true;

    let bv_known = if entry.bv_id == SAI_NULL_OBJECT_ID {
        event.event_type == FdbEventType::Flushed
    } else {
        translator.exists(entry.bv_id, true)
    };
    if !bv_known {
        error!(
            "bv_id RID 0x{:x} is not present on local ASIC DB: {}",
            entry.bv_id,
            serialize_fdb_entry(entry)
        );
        result = false;
    }

    if entry.switch_id.is_null() || !translator.exists(entry.switch_id.as_raw(), false) {
        error!(
            "switch_id RID 0x{:x} is not present on local ASIC DB: {}",
            entry.switch_id.as_raw(),
            serialize_fdb_entry(entry)
        );
        result = false;
    }

    for attr in &event.attributes {
        let meta = match schema.get(ObjectType::FdbEntry, attr.id) {
            Ok(meta) => meta,
            Err(e) => {
                error!("{}", e);
                continue;
            }
        };

        if meta.value_type != AttrValueType::ObjectId {
            continue;
        }

        if let AttrValue::ObjectId(rid) = attr.value {
            if !translator.exists(rid, true) {
                warn!(
                    "RID 0x{:x} on {} is not present on local ASIC DB",
                    rid, meta.attr_id_name
                );
                result = false;
            }
        }
    }

    result
}

/// Scope of one flush directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlushScope {
    pub switch_id: SwitchOid,
    pub bridge_port_id: BridgePortOid,
    pub bv_id: RawSaiObjectId,
    pub entry_type: FdbFlushEntryType,
}

impl FlushScope {
    pub fn of(event: &FdbEntryEvent) -> Self {
        Self {
            switch_id: event.fdb_entry.switch_id,
            bridge_port_id: BridgePortOid::from_raw_unchecked(
                event.bridge_port_id().unwrap_or(SAI_NULL_OBJECT_ID),
            ),
            bv_id: event.fdb_entry.bv_id,
            entry_type: flush_entry_type(event),
        }
    }
}

/// What the applier did with one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Switch or bridge id is null; nothing written.
    SkippedNullKey,
    Removed { existed: bool },
    Flushed { removed: usize },
    /// Same scope was already flushed earlier in this batch.
    FlushDeduplicated,
    Created,
}

/// Applies translated FDB entries of one batch to the ASIC view.
pub struct FdbApplier<'a> {
    store: &'a dyn AsicStateStore,
    schema: &'a AttrSchema,
    dedup_flush: bool,
    flushed: HashSet<FlushScope>,
}

impl<'a> FdbApplier<'a> {
    pub fn new(store: &'a dyn AsicStateStore, schema: &'a AttrSchema, dedup_flush: bool) -> Self {
        Self {
            store,
            schema,
            dedup_flush,
            flushed: HashSet::new(),
        }
    }

    /// Applies one entry. The ids of `event` must already be VIDs;
    /// `unresolved` lists the RIDs that translated to null on the way.
    ///
    /// Flushes, learns and moves that reference an unresolved id are
    /// refused, since a null id would widen the flush scope or persist a
    /// dangling reference. Removal by a known key still goes through.
    ///
    /// A learned or moved entry without a type attribute gets a dynamic one
    /// appended to `event`, so the republished event carries it too.
    pub fn apply(
        &mut self,
        event: &mut FdbEntryEvent,
        unresolved: &[RawSaiObjectId],
    ) -> Result<ApplyOutcome> {
        let meta_key = ObjectMetaKey::fdb_entry(event.fdb_entry);

        if event.fdb_entry.has_null_key() && event.event_type != FdbEventType::Flushed {
            warn!(
                "skipped to put into db: {}",
                serialize_fdb_entry(&event.fdb_entry)
            );
            return Ok(ApplyOutcome::SkippedNullKey);
        }

        match event.event_type {
            FdbEventType::Aged => {
                debug!(
                    "remove fdb entry {} for {}",
                    serialize_object_meta_key(&meta_key),
                    event.event_type
                );
                let existed = self.store.remove(&meta_key)?;
                Ok(ApplyOutcome::Removed { existed })
            }
            FdbEventType::Flushed => {
                Self::check_resolved(event, unresolved)?;
                let scope = FlushScope::of(event);
                if self.dedup_flush && !self.flushed.insert(scope) {
                    debug!("flush scope {:?} already processed in this batch", scope);
                    return Ok(ApplyOutcome::FlushDeduplicated);
                }
                let removed = self.store.flush(
                    scope.switch_id,
                    scope.bridge_port_id,
                    scope.bv_id,
                    scope.entry_type,
                )?;
                Ok(ApplyOutcome::Flushed { removed })
            }
            FdbEventType::Learned | FdbEventType::Move => {
                Self::check_resolved(event, unresolved)?;
                if !event.has_attr(fdb_entry_attr::TYPE) {
                    event.attributes.push(Attribute::new(
                        fdb_entry_attr::TYPE,
                        AttrValue::Int32(FdbEntryType::Dynamic.as_s32()),
                    ));
                }

                let fields = serialize_attr_list(self.schema, ObjectType::FdbEntry, &event.attributes)
                    .map_err(SyncdError::from)?;
                self.store.create(&meta_key, &fields)?;
                Ok(ApplyOutcome::Created)
            }
            FdbEventType::Other(code) => Err(SyncdError::UnsupportedEventSubtype(format!(
                "fdb event type {} on {}",
                code,
                serialize_fdb_entry(&event.fdb_entry)
            ))),
        }
    }

    fn check_resolved(event: &FdbEntryEvent, unresolved: &[RawSaiObjectId]) -> Result<()> {
        if unresolved.is_empty() {
            return Ok(());
        }
        let rids: Vec<String> = unresolved.iter().map(|rid| format!("0x{:x}", rid)).collect();
        Err(SyncdError::TranslationMiss(format!(
            "{} on {} {} not applied",
            rids.join(", "),
            event.event_type,
            serialize_fdb_entry(&event.fdb_entry)
        )))
    }
}
