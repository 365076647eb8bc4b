//! SAI (Switch Abstraction Interface) data model for switch notifications.
//!
//! This crate describes what the ASIC driver tells the control plane
//! asynchronously, in a form that cannot be misread:
//!
//! - [`types`]: Type-safe object IDs, object types, MAC addresses and FDB keys
//! - [`metadata`]: The attribute schema table every attribute is checked against
//! - [`attribute`]: Typed attribute values and their textual form
//! - [`notification`]: The closed set of notification records
//! - [`serialize`]: The sairedis JSON wire codec for those records
//! - [`error`]: Error types and status handling
//!
//! # Example
//!
//! ```
//! use sonic_sai::{deserialize_notification, AttrSchema, NotificationEvent};
//!
//! let schema = AttrSchema::builtin();
//! let event = deserialize_notification(
//!     "switch_shutdown_request",
//!     r#"{"switch_id":"oid:0x21000000000000"}"#,
//!     &schema,
//! )
//! .unwrap();
//!
//! assert!(matches!(event, NotificationEvent::SwitchShutdownRequest { .. }));
//! ```

pub mod attribute;
pub mod error;
pub mod metadata;
pub mod notification;
pub mod serialize;
pub mod types;

pub use attribute::{AttrValue, Attribute};
pub use error::{SaiError, SaiResult};
pub use metadata::{fdb_entry_attr, AttrId, AttrMetadata, AttrSchema, AttrValueType};
pub use notification::{
    DeadlockEntry, FdbEntryEvent, FdbEntryType, FdbEventType, FdbFlushEntryType,
    NotificationEvent, NotificationKind, PortOperStatus, PortStatusEntry,
    QueueDeadlockEventType, SwitchOperStatus,
};
pub use serialize::{
    deserialize_notification, serialize_fdb_entry, serialize_notification,
    serialize_object_meta_key,
};
pub use types::{
    BridgePortOid, FdbEntry, MacAddress, ObjectKey, ObjectMetaKey, ObjectType, PortOid,
    QueueOid, RawSaiObjectId, SaiObjectId, SaiObjectKind, SwitchOid, SAI_NULL_OBJECT_ID,
};
