//! Persisted ASIC state view.
//!
//! The store itself (Redis ASIC_DB in a running switch) belongs to the
//! daemon. The notification pipeline only ever creates, removes and flushes
//! FDB rows through [`AsicStateStore`].

use crate::error::Result;
use parking_lot::Mutex;
use sonic_sai::{
    fdb_entry_attr, serialize_object_meta_key, AttrSchema, BridgePortOid, FdbFlushEntryType,
    ObjectKey, ObjectMetaKey, ObjectType, RawSaiObjectId, SwitchOid, SAI_NULL_OBJECT_ID,
};
use std::collections::BTreeMap;

/// Prefix of every ASIC view row.
pub const ASIC_STATE_TABLE: &str = "ASIC_STATE";

/// Builds the row key of an object (`ASIC_STATE:<object type>:<key>`).
pub fn asic_state_key(meta_key: &ObjectMetaKey) -> String {
    format!("{}:{}", ASIC_STATE_TABLE, serialize_object_meta_key(meta_key))
}

/// Mutations the notification pipeline applies to the ASIC view.
pub trait AsicStateStore: Send + Sync {
    /// Creates (or overwrites) an object row.
    fn create(&self, meta_key: &ObjectMetaKey, attributes: &[(String, String)]) -> Result<()>;

    /// Removes an object row. Returns false if it was not present.
    fn remove(&self, meta_key: &ObjectMetaKey) -> Result<bool>;

    /// Removes every FDB row in the given scope.
    ///
    /// A null `bridge_port_id` or `bv_id` widens the scope to all bridge
    /// ports or all bridges. Returns the number of rows removed.
    fn flush(
        &self,
        switch_id: SwitchOid,
        bridge_port_id: BridgePortOid,
        bv_id: RawSaiObjectId,
        entry_type: FdbFlushEntryType,
    ) -> Result<usize>;
}

/// One mutation seen by [`MemoryAsicStore`], in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOperation {
    Create {
        key: String,
        attributes: Vec<(String, String)>,
    },
    Remove {
        key: String,
        existed: bool,
    },
    Flush {
        switch_id: SwitchOid,
        bridge_port_id: BridgePortOid,
        bv_id: RawSaiObjectId,
        entry_type: FdbFlushEntryType,
        removed: usize,
    },
}

#[derive(Debug, Clone)]
struct AsicRow {
    meta_key: ObjectMetaKey,
    attributes: Vec<(String, String)>,
}

impl AsicRow {
    fn field(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(f, _)| f == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Default)]
struct StoreState {
    rows: BTreeMap<String, AsicRow>,
    operations: Vec<StoreOperation>,
}

/// In-memory ASIC view with the same flush semantics as the Redis client.
#[derive(Debug)]
pub struct MemoryAsicStore {
    state: Mutex<StoreState>,
    bridge_port_field: String,
    entry_type_field: String,
}

impl MemoryAsicStore {
    pub fn new() -> Self {
        let schema = AttrSchema::builtin();
        let name_of = |id| {
            schema
                .get(ObjectType::FdbEntry, id)
                .map(|meta| meta.attr_id_name.to_string())
                .unwrap_or_default()
        };

        Self {
            state: Mutex::new(StoreState::default()),
            bridge_port_field: name_of(fdb_entry_attr::BRIDGE_PORT_ID),
            entry_type_field: name_of(fdb_entry_attr::TYPE),
        }
    }

    /// Returns the attributes stored under a row key.
    pub fn get(&self, key: &str) -> Option<Vec<(String, String)>> {
        self.state.lock().rows.get(key).map(|row| row.attributes.clone())
    }

    pub fn contains(&self, meta_key: &ObjectMetaKey) -> bool {
        self.state.lock().rows.contains_key(&asic_state_key(meta_key))
    }

    /// All row keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.state.lock().rows.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every mutation applied so far, in call order.
    pub fn operations(&self) -> Vec<StoreOperation> {
        self.state.lock().operations.clone()
    }

    fn flush_matches(
        &self,
        row: &AsicRow,
        switch_id: SwitchOid,
        bridge_port: &Option<String>,
        bv_id: RawSaiObjectId,
        entry_type: FdbFlushEntryType,
    ) -> bool {
        let ObjectKey::FdbEntry(entry) = row.meta_key.key else {
            return false;
        };

        if entry.switch_id != switch_id {
            return false;
        }

        if bv_id != SAI_NULL_OBJECT_ID && entry.bv_id != bv_id {
            return false;
        }

        if let Some(port) = bridge_port {
            if row.field(&self.bridge_port_field) != Some(port.as_str()) {
                return false;
            }
        }

        let row_type = row.field(&self.entry_type_field);
        match entry_type {
            FdbFlushEntryType::All => true,
            FdbFlushEntryType::Static => row_type == Some("SAI_FDB_ENTRY_TYPE_STATIC"),
            FdbFlushEntryType::Dynamic => row_type != Some("SAI_FDB_ENTRY_TYPE_STATIC"),
        }
    }
}

impl Default for MemoryAsicStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AsicStateStore for MemoryAsicStore {
    fn create(&self, meta_key: &ObjectMetaKey, attributes: &[(String, String)]) -> Result<()> {
        let key = asic_state_key(meta_key);
        let mut state = self.state.lock();

        state.rows.insert(
            key.clone(),
            AsicRow {
                meta_key: *meta_key,
                attributes: attributes.to_vec(),
            },
        );
        state.operations.push(StoreOperation::Create {
            key,
            attributes: attributes.to_vec(),
        });

        Ok(())
    }

    fn remove(&self, meta_key: &ObjectMetaKey) -> Result<bool> {
        let key = asic_state_key(meta_key);
        let mut state = self.state.lock();

        let existed = state.rows.remove(&key).is_some();
        state.operations.push(StoreOperation::Remove { key, existed });

        Ok(existed)
    }

    fn flush(
        &self,
        switch_id: SwitchOid,
        bridge_port_id: BridgePortOid,
        bv_id: RawSaiObjectId,
        entry_type: FdbFlushEntryType,
    ) -> Result<usize> {
        let bridge_port = (!bridge_port_id.is_null()).then(|| bridge_port_id.to_string());
        let mut state = self.state.lock();

        let doomed: Vec<String> = state
            .rows
            .iter()
            .filter(|(_, row)| self.flush_matches(row, switch_id, &bridge_port, bv_id, entry_type))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &doomed {
            state.rows.remove(key);
        }

        state.operations.push(StoreOperation::Flush {
            switch_id,
            bridge_port_id,
            bv_id,
            entry_type,
            removed: doomed.len(),
        });

        Ok(doomed.len())
    }
}
