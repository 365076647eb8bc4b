//! Switch notification records.
//!
//! One closed enum covers every notification the ASIC driver can raise
//! towards the synchronization daemon. Records are plain owned data: a
//! decoder produces them, the identifier translator rewrites their ids in
//! place and the serializer turns them back into wire form.

use crate::attribute::Attribute;
use crate::metadata::{fdb_entry_attr, AttrId};
use crate::types::{FdbEntry, PortOid, QueueOid, RawSaiObjectId, SwitchOid};
use std::fmt;

pub const SWITCH_NOTIFICATION_NAME_SWITCH_STATE_CHANGE: &str = "switch_state_change";
pub const SWITCH_NOTIFICATION_NAME_FDB_EVENT: &str = "fdb_event";
pub const SWITCH_NOTIFICATION_NAME_PORT_STATE_CHANGE: &str = "port_state_change";
pub const SWITCH_NOTIFICATION_NAME_SWITCH_SHUTDOWN_REQUEST: &str = "switch_shutdown_request";
pub const SWITCH_NOTIFICATION_NAME_QUEUE_PFC_DEADLOCK: &str = "queue_deadlock";

macro_rules! sai_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Returns the SAI serialized name.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }

            /// Parses the SAI serialized name.
            pub fn from_name(s: &str) -> Option<Self> {
                match s {
                    $($text => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

sai_enum! {
    /// Kind of a switch notification, keyed by its channel name.
    NotificationKind {
        SwitchStateChange => "switch_state_change",
        FdbEvent => "fdb_event",
        PortStateChange => "port_state_change",
        SwitchShutdownRequest => "switch_shutdown_request",
        QueueDeadlock => "queue_deadlock",
    }
}

sai_enum! {
    /// `sai_switch_oper_status_t`
    SwitchOperStatus {
        Unknown => "SAI_SWITCH_OPER_STATUS_UNKNOWN",
        Up => "SAI_SWITCH_OPER_STATUS_UP",
        Down => "SAI_SWITCH_OPER_STATUS_DOWN",
        Failed => "SAI_SWITCH_OPER_STATUS_FAILED",
    }
}

sai_enum! {
    /// `sai_port_oper_status_t`
    PortOperStatus {
        Unknown => "SAI_PORT_OPER_STATUS_UNKNOWN",
        Up => "SAI_PORT_OPER_STATUS_UP",
        Down => "SAI_PORT_OPER_STATUS_DOWN",
        Testing => "SAI_PORT_OPER_STATUS_TESTING",
        NotPresent => "SAI_PORT_OPER_STATUS_NOT_PRESENT",
    }
}

sai_enum! {
    /// `sai_queue_pfc_deadlock_event_type_t`
    QueueDeadlockEventType {
        Detected => "SAI_QUEUE_PFC_DEADLOCK_EVENT_TYPE_DETECTED",
        Recovered => "SAI_QUEUE_PFC_DEADLOCK_EVENT_TYPE_RECOVERED",
    }
}

sai_enum! {
    /// `sai_fdb_entry_type_t`
    FdbEntryType {
        Dynamic => "SAI_FDB_ENTRY_TYPE_DYNAMIC",
        Static => "SAI_FDB_ENTRY_TYPE_STATIC",
    }
}

sai_enum! {
    /// `sai_fdb_flush_entry_type_t`
    FdbFlushEntryType {
        Dynamic => "SAI_FDB_FLUSH_ENTRY_TYPE_DYNAMIC",
        Static => "SAI_FDB_FLUSH_ENTRY_TYPE_STATIC",
        All => "SAI_FDB_FLUSH_ENTRY_TYPE_ALL",
    }
}

impl FdbEntryType {
    pub const fn as_s32(&self) -> i32 {
        match self {
            FdbEntryType::Dynamic => 0,
            FdbEntryType::Static => 1,
        }
    }

    pub fn from_s32(value: i32) -> Option<Self> {
        match value {
            0 => Some(FdbEntryType::Dynamic),
            1 => Some(FdbEntryType::Static),
            _ => None,
        }
    }
}

/// `sai_fdb_event_t`
///
/// Drivers are free to send event codes newer than this crate knows about;
/// those decode as `Other` and are rejected per entry by the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FdbEventType {
    Learned,
    Aged,
    Move,
    Flushed,
    Other(i32),
}

impl FdbEventType {
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "SAI_FDB_EVENT_LEARNED" => Some(FdbEventType::Learned),
            "SAI_FDB_EVENT_AGED" => Some(FdbEventType::Aged),
            "SAI_FDB_EVENT_MOVE" => Some(FdbEventType::Move),
            "SAI_FDB_EVENT_FLUSHED" => Some(FdbEventType::Flushed),
            other => other.parse().ok().map(FdbEventType::Other),
        }
    }
}

impl fmt::Display for FdbEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FdbEventType::Learned => f.write_str("SAI_FDB_EVENT_LEARNED"),
            FdbEventType::Aged => f.write_str("SAI_FDB_EVENT_AGED"),
            FdbEventType::Move => f.write_str("SAI_FDB_EVENT_MOVE"),
            FdbEventType::Flushed => f.write_str("SAI_FDB_EVENT_FLUSHED"),
            FdbEventType::Other(code) => write!(f, "{}", code),
        }
    }
}

/// One element of an FDB event batch (`sai_fdb_event_notification_data_t`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FdbEntryEvent {
    pub fdb_entry: FdbEntry,
    pub event_type: FdbEventType,
    pub attributes: Vec<Attribute>,
}

impl FdbEntryEvent {
    pub fn new(fdb_entry: FdbEntry, event_type: FdbEventType, attributes: Vec<Attribute>) -> Self {
        Self {
            fdb_entry,
            event_type,
            attributes,
        }
    }

    pub fn attr(&self, id: AttrId) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.id == id)
    }

    pub fn has_attr(&self, id: AttrId) -> bool {
        self.attr(id).is_some()
    }

    /// Raw value of `SAI_FDB_ENTRY_ATTR_TYPE`, if the driver sent one.
    pub fn entry_type(&self) -> Option<i32> {
        self.attr(fdb_entry_attr::TYPE)
            .and_then(|attr| attr.value.as_i32())
    }

    /// Value of `SAI_FDB_ENTRY_ATTR_BRIDGE_PORT_ID`, if the driver sent one.
    pub fn bridge_port_id(&self) -> Option<RawSaiObjectId> {
        self.attr(fdb_entry_attr::BRIDGE_PORT_ID)
            .and_then(|attr| attr.value.as_object_id())
    }
}

/// One element of a queue PFC deadlock batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlockEntry {
    pub queue_id: QueueOid,
    pub event: QueueDeadlockEventType,
}

/// One element of a port operational status batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortStatusEntry {
    pub port_id: PortOid,
    pub port_state: PortOperStatus,
}

/// A decoded switch notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    SwitchStateChange {
        switch_id: SwitchOid,
        oper_status: SwitchOperStatus,
    },
    FdbEvent {
        entries: Vec<FdbEntryEvent>,
    },
    QueueDeadlock {
        entries: Vec<DeadlockEntry>,
    },
    PortStateChange {
        entries: Vec<PortStatusEntry>,
    },
    SwitchShutdownRequest {
        switch_id: SwitchOid,
    },
}

impl NotificationEvent {
    pub fn kind(&self) -> NotificationKind {
        match self {
            NotificationEvent::SwitchStateChange { .. } => NotificationKind::SwitchStateChange,
            NotificationEvent::FdbEvent { .. } => NotificationKind::FdbEvent,
            NotificationEvent::QueueDeadlock { .. } => NotificationKind::QueueDeadlock,
            NotificationEvent::PortStateChange { .. } => NotificationKind::PortStateChange,
            NotificationEvent::SwitchShutdownRequest { .. } => {
                NotificationKind::SwitchShutdownRequest
            }
        }
    }

    /// Channel name the notification is published under.
    pub fn name(&self) -> &'static str {
        self.kind().as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttrValue;
    use crate::types::MacAddress;

    #[test]
    fn test_kind_names_match_channel_constants() {
        assert_eq!(
            NotificationKind::SwitchStateChange.as_str(),
            SWITCH_NOTIFICATION_NAME_SWITCH_STATE_CHANGE
        );
        assert_eq!(NotificationKind::FdbEvent.as_str(), SWITCH_NOTIFICATION_NAME_FDB_EVENT);
        assert_eq!(
            NotificationKind::PortStateChange.as_str(),
            SWITCH_NOTIFICATION_NAME_PORT_STATE_CHANGE
        );
        assert_eq!(
            NotificationKind::SwitchShutdownRequest.as_str(),
            SWITCH_NOTIFICATION_NAME_SWITCH_SHUTDOWN_REQUEST
        );
        assert_eq!(
            NotificationKind::QueueDeadlock.as_str(),
            SWITCH_NOTIFICATION_NAME_QUEUE_PFC_DEADLOCK
        );
        assert_eq!(NotificationKind::from_name("link_flap"), None);
    }

    #[test]
    fn test_fdb_event_type_names() {
        assert_eq!(FdbEventType::from_name("SAI_FDB_EVENT_MOVE"), Some(FdbEventType::Move));
        assert_eq!(FdbEventType::from_name("7"), Some(FdbEventType::Other(7)));
        assert_eq!(FdbEventType::from_name("SAI_FDB_EVENT_BOGUS"), None);
        assert_eq!(FdbEventType::Other(7).to_string(), "7");
        assert_eq!(FdbEventType::Flushed.to_string(), "SAI_FDB_EVENT_FLUSHED");
    }

    #[test]
    fn test_fdb_entry_type_codes() {
        assert_eq!(FdbEntryType::from_s32(1), Some(FdbEntryType::Static));
        assert_eq!(FdbEntryType::Dynamic.as_s32(), 0);
        assert_eq!(FdbEntryType::from_s32(5), None);
    }

    #[test]
    fn test_fdb_entry_event_attr_helpers() {
        let entry = FdbEntry::new(SwitchOid::NULL, 0, MacAddress::ZERO);
        let event = FdbEntryEvent::new(
            entry,
            FdbEventType::Flushed,
            vec![
                Attribute::new(fdb_entry_attr::BRIDGE_PORT_ID, AttrValue::ObjectId(0x3a)),
                Attribute::new(fdb_entry_attr::TYPE, AttrValue::Int32(1)),
            ],
        );

        assert_eq!(event.bridge_port_id(), Some(0x3a));
        assert_eq!(event.entry_type(), Some(1));
        assert!(!event.has_attr(fdb_entry_attr::PACKET_ACTION));
    }

    #[test]
    fn test_event_kind() {
        let event = NotificationEvent::SwitchShutdownRequest {
            switch_id: SwitchOid::NULL,
        };
        assert_eq!(event.kind(), NotificationKind::SwitchShutdownRequest);
        assert_eq!(event.name(), "switch_shutdown_request");
    }
}
