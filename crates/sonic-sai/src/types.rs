//! Type-safe SAI object IDs, object types and FDB entry keys.
//!
//! Notification payloads carry raw 64-bit identifiers. The wrappers here keep
//! a port id from being stored where a queue id is expected once a payload
//! has been decoded, while still allowing the identifier translator to work
//! on the raw value.

use crate::error::{SaiError, SaiResult};
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::str::FromStr;

/// Raw SAI object ID type (matches sai_object_id_t in C).
pub type RawSaiObjectId = u64;

/// The null object ID (SAI_NULL_OBJECT_ID).
pub const SAI_NULL_OBJECT_ID: RawSaiObjectId = 0;

/// Formats a raw object id the way sairedis does (`oid:0x1a2b`).
pub fn serialize_object_id(oid: RawSaiObjectId) -> String {
    format!("oid:0x{:x}", oid)
}

/// Parses the `oid:0x...` textual form of an object id.
pub fn deserialize_object_id(s: &str) -> SaiResult<RawSaiObjectId> {
    let invalid = || SaiError::invalid_parameter(format!("invalid object id: {}", s));

    let hex = s.strip_prefix("oid:0x").ok_or_else(invalid)?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    RawSaiObjectId::from_str_radix(hex, 16).map_err(|_| invalid())
}

/// Marker trait for SAI object kinds.
pub trait SaiObjectKind: Send + Sync + 'static {
    /// Returns the SAI object type name for debugging.
    fn type_name() -> &'static str;
}

/// A type-safe SAI object ID.
///
/// The phantom type parameter `T` indicates what kind of SAI object this ID
/// refers to. Unlike a handle obtained from a create call, an id decoded from
/// a notification may legitimately be null (an unresolved translation), so
/// `from_raw_unchecked` is the common constructor in this crate.
#[derive(Clone, Copy)]
pub struct SaiObjectId<T: SaiObjectKind> {
    raw: RawSaiObjectId,
    _marker: PhantomData<T>,
}

impl<T: SaiObjectKind> SaiObjectId<T> {
    /// The null object ID (SAI_NULL_OBJECT_ID).
    pub const NULL: Self = Self {
        raw: SAI_NULL_OBJECT_ID,
        _marker: PhantomData,
    };

    /// Creates a new object ID from a raw value.
    ///
    /// Returns `None` if the raw value is the null object ID.
    pub fn from_raw(raw: RawSaiObjectId) -> Option<Self> {
        if raw == SAI_NULL_OBJECT_ID {
            None
        } else {
            Some(Self::from_raw_unchecked(raw))
        }
    }

    /// Creates a new object ID from a raw value, including null.
    pub const fn from_raw_unchecked(raw: RawSaiObjectId) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    /// Returns the raw object ID value.
    pub const fn as_raw(&self) -> RawSaiObjectId {
        self.raw
    }

    /// Returns true if this is a null object ID.
    pub const fn is_null(&self) -> bool {
        self.raw == SAI_NULL_OBJECT_ID
    }

    /// Returns a new id of the same kind with the raw value replaced.
    ///
    /// Used when an id is translated between identifier spaces.
    pub const fn with_raw(self, raw: RawSaiObjectId) -> Self {
        Self::from_raw_unchecked(raw)
    }
}

impl<T: SaiObjectKind> fmt::Debug for SaiObjectId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:016x})", T::type_name(), self.raw)
    }
}

impl<T: SaiObjectKind> fmt::Display for SaiObjectId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serialize_object_id(self.raw))
    }
}

impl<T: SaiObjectKind> PartialEq for SaiObjectId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T: SaiObjectKind> Eq for SaiObjectId<T> {}

impl<T: SaiObjectKind> Hash for SaiObjectId<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T: SaiObjectKind> Default for SaiObjectId<T> {
    fn default() -> Self {
        Self::NULL
    }
}

macro_rules! define_object_kind {
    ($name:ident, $type_name:literal, $oid_alias:ident) => {
        #[doc = concat!("Marker type for SAI ", $type_name, " objects.")]
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl SaiObjectKind for $name {
            fn type_name() -> &'static str {
                $type_name
            }
        }

        #[doc = concat!("Type alias for ", $type_name, " object IDs.")]
        pub type $oid_alias = SaiObjectId<$name>;
    };
}

define_object_kind!(SwitchKind, "Switch", SwitchOid);
define_object_kind!(PortKind, "Port", PortOid);
define_object_kind!(QueueKind, "Queue", QueueOid);
define_object_kind!(BridgePortKind, "BridgePort", BridgePortOid);

/// SAI object types that appear in notifications or their ASIC view rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectType {
    Null,
    Port,
    Queue,
    Vlan,
    Switch,
    Bridge,
    BridgePort,
    FdbEntry,
    HostifUserDefinedTrap,
    Counter,
}

impl ObjectType {
    /// Returns the SAI serialized name (e.g. `SAI_OBJECT_TYPE_FDB_ENTRY`).
    pub const fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Null => "SAI_OBJECT_TYPE_NULL",
            ObjectType::Port => "SAI_OBJECT_TYPE_PORT",
            ObjectType::Queue => "SAI_OBJECT_TYPE_QUEUE",
            ObjectType::Vlan => "SAI_OBJECT_TYPE_VLAN",
            ObjectType::Switch => "SAI_OBJECT_TYPE_SWITCH",
            ObjectType::Bridge => "SAI_OBJECT_TYPE_BRIDGE",
            ObjectType::BridgePort => "SAI_OBJECT_TYPE_BRIDGE_PORT",
            ObjectType::FdbEntry => "SAI_OBJECT_TYPE_FDB_ENTRY",
            ObjectType::HostifUserDefinedTrap => "SAI_OBJECT_TYPE_HOSTIF_USER_DEFINED_TRAP",
            ObjectType::Counter => "SAI_OBJECT_TYPE_COUNTER",
        }
    }

    /// Returns true for object types keyed by a structure instead of an OID.
    pub const fn is_non_object_id(&self) -> bool {
        matches!(self, ObjectType::FdbEntry)
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A 48-bit MAC address as carried in FDB entries.
///
/// SAI serializes MAC addresses as upper-case, colon separated octets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// The all-zero MAC address, used by flush notifications.
    pub const ZERO: MacAddress = MacAddress([0; 6]);

    /// Creates a new MAC address from raw bytes.
    pub const fn new(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }

    /// Returns the raw bytes of the MAC address.
    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Returns true if this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0; 6]
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}", a, b, c, d, e, g)
    }
}

impl FromStr for MacAddress {
    type Err = SaiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SaiError::invalid_parameter(format!("invalid MAC address: {}", s));

        let mut bytes = [0u8; 6];
        let mut parts = s.split(':');
        for byte in bytes.iter_mut() {
            let part = parts.next().ok_or_else(invalid)?;
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            *byte = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }

        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(MacAddress(bytes))
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }
}

/// Identity key of an FDB entry (`sai_fdb_entry_t`).
///
/// `bv_id` is either a bridge or a VLAN object id, so it is kept raw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FdbEntry {
    pub switch_id: SwitchOid,
    pub bv_id: RawSaiObjectId,
    pub mac_address: MacAddress,
}

impl FdbEntry {
    pub fn new(switch_id: SwitchOid, bv_id: RawSaiObjectId, mac_address: MacAddress) -> Self {
        Self {
            switch_id,
            bv_id,
            mac_address,
        }
    }

    /// Returns true if either half of the object key is still null.
    pub fn has_null_key(&self) -> bool {
        self.switch_id.is_null() || self.bv_id == SAI_NULL_OBJECT_ID
    }
}

/// Key of an ASIC view object: either a plain OID or a structured entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKey {
    ObjectId(RawSaiObjectId),
    FdbEntry(FdbEntry),
}

/// Object type plus key, i.e. `sai_object_meta_key_t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectMetaKey {
    pub object_type: ObjectType,
    pub key: ObjectKey,
}

impl ObjectMetaKey {
    /// Builds the meta key of an FDB entry.
    pub fn fdb_entry(entry: FdbEntry) -> Self {
        Self {
            object_type: ObjectType::FdbEntry,
            key: ObjectKey::FdbEntry(entry),
        }
    }

    /// Builds the meta key of an OID based object.
    pub fn object_id(object_type: ObjectType, oid: RawSaiObjectId) -> Self {
        Self {
            object_type,
            key: ObjectKey::ObjectId(oid),
        }
    }
}
