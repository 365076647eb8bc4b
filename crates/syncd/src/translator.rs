//! RID to VID translation.
//!
//! The identifier table is owned by the daemon and shared with the command
//! path; this module only defines the contract the notification pipeline
//! needs from it, plus an in-memory table implementing that contract.

use log::{error, warn};
use parking_lot::RwLock;
use sonic_sai::{AttrValue, Attribute, ObjectType, RawSaiObjectId, SwitchOid, SAI_NULL_OBJECT_ID};
use std::collections::HashMap;

/// Lookup side of the RID/VID identifier table.
pub trait VidTranslator: Send + Sync {
    /// Returns the VID for `rid`, or `fallback` when the RID is unknown.
    fn translate(&self, rid: RawSaiObjectId, fallback: RawSaiObjectId) -> RawSaiObjectId;

    /// Returns the VID for `rid`, or `None` when the RID is unknown.
    fn try_translate(&self, rid: RawSaiObjectId) -> Option<RawSaiObjectId>;

    /// Returns true if `rid` is known. The null RID is always known.
    ///
    /// With `record_error` set, a miss is also recorded by the table.
    fn exists(&self, rid: RawSaiObjectId, record_error: bool) -> bool;

    /// Rewrites every object id attribute of `attrs` from RID to VID.
    ///
    /// Unknown RIDs become the null object id; they are returned in order.
    fn translate_attribute_list(
        &self,
        object_type: ObjectType,
        switch_vid: SwitchOid,
        attrs: &mut [Attribute],
    ) -> Vec<RawSaiObjectId>;
}

#[derive(Debug, Default)]
struct TableState {
    rid_to_vid: HashMap<RawSaiObjectId, RawSaiObjectId>,
    vid_to_rid: HashMap<RawSaiObjectId, RawSaiObjectId>,
    missing: Vec<RawSaiObjectId>,
}

/// In-memory RID/VID table.
#[derive(Debug, Default)]
pub struct LocalVidTranslator {
    state: RwLock<TableState>,
}

impl LocalVidTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a RID/VID pair, replacing any previous mapping of either id.
    pub fn insert(&self, rid: RawSaiObjectId, vid: RawSaiObjectId) {
        let mut state = self.state.write();
        if let Some(old_vid) = state.rid_to_vid.insert(rid, vid) {
            state.vid_to_rid.remove(&old_vid);
        }
        if let Some(old_rid) = state.vid_to_rid.insert(vid, rid) {
            if old_rid != rid {
                state.rid_to_vid.remove(&old_rid);
            }
        }
    }

    /// Forgets a RID, returning its VID if it was known.
    pub fn remove_rid(&self, rid: RawSaiObjectId) -> Option<RawSaiObjectId> {
        let mut state = self.state.write();
        let vid = state.rid_to_vid.remove(&rid)?;
        state.vid_to_rid.remove(&vid);
        Some(vid)
    }

    /// Returns the RID behind a VID.
    pub fn rid_for(&self, vid: RawSaiObjectId) -> Option<RawSaiObjectId> {
        self.state.read().vid_to_rid.get(&vid).copied()
    }

    pub fn len(&self) -> usize {
        self.state.read().rid_to_vid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// RIDs that missed an `exists` check with error recording enabled.
    pub fn recorded_errors(&self) -> Vec<RawSaiObjectId> {
        self.state.read().missing.clone()
    }

    pub fn clear_errors(&self) {
        self.state.write().missing.clear();
    }
}

impl VidTranslator for LocalVidTranslator {
    fn translate(&self, rid: RawSaiObjectId, fallback: RawSaiObjectId) -> RawSaiObjectId {
        if rid == SAI_NULL_OBJECT_ID {
            return SAI_NULL_OBJECT_ID;
        }
        self.try_translate(rid).unwrap_or(fallback)
    }

    fn try_translate(&self, rid: RawSaiObjectId) -> Option<RawSaiObjectId> {
        if rid == SAI_NULL_OBJECT_ID {
            return Some(SAI_NULL_OBJECT_ID);
        }
        self.state.read().rid_to_vid.get(&rid).copied()
    }

    fn exists(&self, rid: RawSaiObjectId, record_error: bool) -> bool {
        if rid == SAI_NULL_OBJECT_ID {
            return true;
        }

        if self.state.read().rid_to_vid.contains_key(&rid) {
            return true;
        }

        if record_error {
            error!("RID 0x{:x} is missing from the local identifier table", rid);
            self.state.write().missing.push(rid);
        }

        false
    }

    fn translate_attribute_list(
        &self,
        object_type: ObjectType,
        switch_vid: SwitchOid,
        attrs: &mut [Attribute],
    ) -> Vec<RawSaiObjectId> {
        let mut unresolved = Vec::new();
        for attr in attrs.iter_mut() {
            if let AttrValue::ObjectId(rid) = attr.value {
                let vid = match self.try_translate(rid) {
                    Some(vid) => vid,
                    None => {
                        warn!(
                            "{} attr {} RID 0x{:x} on switch {} translated to null VID",
                            object_type, attr.id, rid, switch_vid
                        );
                        unresolved.push(rid);
                        SAI_NULL_OBJECT_ID
                    }
                };
                attr.value = AttrValue::ObjectId(vid);
            }
        }
        unresolved
    }
}
