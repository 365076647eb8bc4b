//! Attribute metadata (schema) table.
//!
//! Every attribute travelling in a notification is validated against this
//! table before its value is interpreted: the declared value type decides
//! how the textual form is parsed, and whether the value is an object id
//! that must be translated and checked for existence.

use crate::error::{SaiError, SaiResult};
use crate::types::ObjectType;
use std::collections::HashMap;
use std::fmt;

/// Numeric attribute id, unique within an object type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttrId(pub i32);

impl fmt::Display for AttrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Attribute ids of `SAI_OBJECT_TYPE_FDB_ENTRY`.
pub mod fdb_entry_attr {
    use super::AttrId;

    pub const TYPE: AttrId = AttrId(0);
    pub const PACKET_ACTION: AttrId = AttrId(1);
    pub const USER_TRAP_ID: AttrId = AttrId(2);
    pub const BRIDGE_PORT_ID: AttrId = AttrId(3);
    pub const META_DATA: AttrId = AttrId(4);
    pub const ENDPOINT_IP: AttrId = AttrId(5);
    pub const COUNTER_ID: AttrId = AttrId(6);
    pub const ALLOW_MAC_MOVE: AttrId = AttrId(7);
}

/// Declared value type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrValueType {
    ObjectId,
    Int32,
    Uint32,
    Bool,
    IpAddress,
}

/// Symbolic names of an enum-valued attribute.
#[derive(Debug, PartialEq, Eq)]
pub struct EnumMetadata {
    pub name: &'static str,
    pub values: &'static [(&'static str, i32)],
}

impl EnumMetadata {
    pub fn name_of(&self, value: i32) -> Option<&'static str> {
        self.values
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(name, _)| *name)
    }

    pub fn value_of(&self, name: &str) -> Option<i32> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, value)| *value)
    }
}

pub static FDB_ENTRY_TYPE_ENUM: EnumMetadata = EnumMetadata {
    name: "sai_fdb_entry_type_t",
    values: &[
        ("SAI_FDB_ENTRY_TYPE_DYNAMIC", 0),
        ("SAI_FDB_ENTRY_TYPE_STATIC", 1),
    ],
};

pub static PACKET_ACTION_ENUM: EnumMetadata = EnumMetadata {
    name: "sai_packet_action_t",
    values: &[
        ("SAI_PACKET_ACTION_DROP", 0),
        ("SAI_PACKET_ACTION_FORWARD", 1),
        ("SAI_PACKET_ACTION_COPY", 2),
        ("SAI_PACKET_ACTION_COPY_CANCEL", 3),
        ("SAI_PACKET_ACTION_TRAP", 4),
        ("SAI_PACKET_ACTION_LOG", 5),
        ("SAI_PACKET_ACTION_DENY", 6),
        ("SAI_PACKET_ACTION_TRANSIT", 7),
    ],
};

/// Metadata of a single attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrMetadata {
    pub object_type: ObjectType,
    pub attr_id: AttrId,
    pub attr_id_name: &'static str,
    pub value_type: AttrValueType,
    pub enum_metadata: Option<&'static EnumMetadata>,
}

impl AttrMetadata {
    pub const fn new(
        object_type: ObjectType,
        attr_id: AttrId,
        attr_id_name: &'static str,
        value_type: AttrValueType,
    ) -> Self {
        Self {
            object_type,
            attr_id,
            attr_id_name,
            value_type,
            enum_metadata: None,
        }
    }

    pub fn with_enum(mut self, enum_metadata: &'static EnumMetadata) -> Self {
        self.enum_metadata = Some(enum_metadata);
        self
    }

    /// Returns true if the attribute value is an object id.
    pub fn is_object_id(&self) -> bool {
        self.value_type == AttrValueType::ObjectId
    }
}

fn builtin_fdb_entry_attrs() -> Vec<AttrMetadata> {
    use fdb_entry_attr::*;
    let fdb = ObjectType::FdbEntry;

    vec![
        AttrMetadata::new(fdb, TYPE, "SAI_FDB_ENTRY_ATTR_TYPE", AttrValueType::Int32)
            .with_enum(&FDB_ENTRY_TYPE_ENUM),
        AttrMetadata::new(
            fdb,
            PACKET_ACTION,
            "SAI_FDB_ENTRY_ATTR_PACKET_ACTION",
            AttrValueType::Int32,
        )
        .with_enum(&PACKET_ACTION_ENUM),
        AttrMetadata::new(fdb, USER_TRAP_ID, "SAI_FDB_ENTRY_ATTR_USER_TRAP_ID", AttrValueType::ObjectId),
        AttrMetadata::new(
            fdb,
            BRIDGE_PORT_ID,
            "SAI_FDB_ENTRY_ATTR_BRIDGE_PORT_ID",
            AttrValueType::ObjectId,
        ),
        AttrMetadata::new(fdb, META_DATA, "SAI_FDB_ENTRY_ATTR_META_DATA", AttrValueType::Uint32),
        AttrMetadata::new(fdb, ENDPOINT_IP, "SAI_FDB_ENTRY_ATTR_ENDPOINT_IP", AttrValueType::IpAddress),
        AttrMetadata::new(fdb, COUNTER_ID, "SAI_FDB_ENTRY_ATTR_COUNTER_ID", AttrValueType::ObjectId),
        AttrMetadata::new(fdb, ALLOW_MAC_MOVE, "SAI_FDB_ENTRY_ATTR_ALLOW_MAC_MOVE", AttrValueType::Bool),
    ]
}

/// Attribute schema keyed by `(object type, attribute id)`.
///
/// Lookups never fall back to a guess: a missing entry is a
/// [`SaiError::AttributeSchema`] the caller must handle.
#[derive(Debug, Clone)]
pub struct AttrSchema {
    attrs: HashMap<(ObjectType, AttrId), AttrMetadata>,
    names: HashMap<ObjectType, HashMap<&'static str, AttrId>>,
}

impl AttrSchema {
    /// Creates a schema with no attributes.
    pub fn empty() -> Self {
        Self {
            attrs: HashMap::new(),
            names: HashMap::new(),
        }
    }

    /// Creates the schema of all attributes carried by FDB notifications.
    pub fn builtin() -> Self {
        let mut schema = Self::empty();
        for meta in builtin_fdb_entry_attrs() {
            schema.register(meta);
        }
        schema
    }

    /// Adds or replaces an attribute definition.
    pub fn register(&mut self, meta: AttrMetadata) {
        self.names
            .entry(meta.object_type)
            .or_default()
            .insert(meta.attr_id_name, meta.attr_id);
        self.attrs.insert((meta.object_type, meta.attr_id), meta);
    }

    /// Removes an attribute definition, returning it if it was present.
    pub fn unregister(&mut self, object_type: ObjectType, attr_id: AttrId) -> Option<AttrMetadata> {
        let meta = self.attrs.remove(&(object_type, attr_id))?;
        if let Some(names) = self.names.get_mut(&object_type) {
            names.remove(meta.attr_id_name);
        }
        Some(meta)
    }

    /// Looks up attribute metadata by id.
    pub fn get(&self, object_type: ObjectType, attr_id: AttrId) -> SaiResult<&AttrMetadata> {
        self.attrs
            .get(&(object_type, attr_id))
            .ok_or_else(|| SaiError::attribute_schema(object_type, attr_id))
    }

    /// Looks up attribute metadata by its serialized name.
    pub fn get_by_name(&self, object_type: ObjectType, name: &str) -> SaiResult<&AttrMetadata> {
        self.names
            .get(&object_type)
            .and_then(|names| names.get(name))
            .and_then(|id| self.attrs.get(&(object_type, *id)))
            .ok_or_else(|| SaiError::attribute_schema(object_type, name))
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}

impl Default for AttrSchema {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_fdb_schema() {
        let schema = AttrSchema::builtin();
        assert_eq!(schema.len(), 8);

        let meta = schema.get(ObjectType::FdbEntry, fdb_entry_attr::BRIDGE_PORT_ID).unwrap();
        assert_eq!(meta.attr_id_name, "SAI_FDB_ENTRY_ATTR_BRIDGE_PORT_ID");
        assert!(meta.is_object_id());

        let meta = schema.get(ObjectType::FdbEntry, fdb_entry_attr::TYPE).unwrap();
        assert_eq!(meta.value_type, AttrValueType::Int32);
        assert!(!meta.is_object_id());
    }

    #[test]
    fn test_lookup_by_name() {
        let schema = AttrSchema::builtin();
        let meta = schema
            .get_by_name(ObjectType::FdbEntry, "SAI_FDB_ENTRY_ATTR_PACKET_ACTION")
            .unwrap();
        assert_eq!(meta.attr_id, fdb_entry_attr::PACKET_ACTION);

        assert!(schema
            .get_by_name(ObjectType::FdbEntry, "SAI_FDB_ENTRY_ATTR_NOPE")
            .is_err());
    }

    #[test]
    fn test_missing_attr_is_schema_error() {
        let schema = AttrSchema::builtin();
        let err = schema.get(ObjectType::FdbEntry, AttrId(99)).unwrap_err();
        assert!(matches!(err, SaiError::AttributeSchema { .. }));

        let err = schema.get(ObjectType::Port, fdb_entry_attr::TYPE).unwrap_err();
        assert!(matches!(err, SaiError::AttributeSchema { .. }));
    }

    #[test]
    fn test_unregister() {
        let mut schema = AttrSchema::builtin();
        let removed = schema.unregister(ObjectType::FdbEntry, fdb_entry_attr::TYPE);
        assert!(removed.is_some());
        assert!(schema.get(ObjectType::FdbEntry, fdb_entry_attr::TYPE).is_err());
        assert!(schema
            .get_by_name(ObjectType::FdbEntry, "SAI_FDB_ENTRY_ATTR_TYPE")
            .is_err());
        assert!(schema.unregister(ObjectType::FdbEntry, fdb_entry_attr::TYPE).is_none());
    }

    #[test]
    fn test_enum_metadata() {
        assert_eq!(FDB_ENTRY_TYPE_ENUM.name_of(1), Some("SAI_FDB_ENTRY_TYPE_STATIC"));
        assert_eq!(FDB_ENTRY_TYPE_ENUM.value_of("SAI_FDB_ENTRY_TYPE_DYNAMIC"), Some(0));
        assert_eq!(PACKET_ACTION_ENUM.name_of(42), None);
    }
}
