//! Wire codec for switch notifications.
//!
//! Payloads use the sairedis JSON layout. Multi-entry notifications are JSON
//! arrays, so the entry count is always explicit; a payload that does not
//! parse completely is rejected as a whole and never yields a partial batch.
//!
//! ```text
//! switch_state_change      {"status":"SAI_SWITCH_OPER_STATUS_UP","switch_id":"oid:0x21000000000000"}
//! switch_shutdown_request  {"switch_id":"oid:0x21000000000000"}
//! fdb_event                [{"fdb_entry":"{\"bvid\":..,\"mac\":..,\"switch_id\":..}","fdb_event":"SAI_FDB_EVENT_LEARNED","list":[{"id":..,"value":..}]}]
//! port_state_change        [{"port_id":"oid:0x1000000000002","port_state":"SAI_PORT_OPER_STATUS_UP"}]
//! queue_deadlock           [{"event":"SAI_QUEUE_PFC_DEADLOCK_EVENT_TYPE_DETECTED","queue_id":"oid:0x15000000000230"}]
//! ```

use crate::attribute::{deserialize_attr_value, serialize_attr_value, Attribute};
use crate::error::{SaiError, SaiResult};
use crate::metadata::AttrSchema;
use crate::notification::{
    DeadlockEntry, FdbEntryEvent, FdbEventType, NotificationEvent, NotificationKind,
    PortOperStatus, PortStatusEntry, QueueDeadlockEventType, SwitchOperStatus,
};
use crate::types::{
    deserialize_object_id, serialize_object_id, FdbEntry, MacAddress, ObjectKey, ObjectMetaKey,
    ObjectType, PortOid, QueueOid, SwitchOid,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct SwitchOperStatusWire {
    status: String,
    switch_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct SwitchShutdownWire {
    switch_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct FdbEntryWire {
    bvid: String,
    mac: String,
    switch_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct AttrWire {
    id: String,
    value: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct FdbEventWire {
    fdb_entry: String,
    fdb_event: String,
    list: Vec<AttrWire>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PortStatusWire {
    port_id: String,
    port_state: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct DeadlockWire {
    event: String,
    queue_id: String,
}

fn to_json<T: Serialize>(value: &T) -> SaiResult<String> {
    serde_json::to_string(value).map_err(|e| SaiError::encode(e.to_string()))
}

/// Serializes an FDB entry key (`{"bvid":..,"mac":..,"switch_id":..}`).
pub fn serialize_fdb_entry(entry: &FdbEntry) -> String {
    let wire = FdbEntryWire {
        bvid: serialize_object_id(entry.bv_id),
        mac: entry.mac_address.to_string(),
        switch_id: serialize_object_id(entry.switch_id.as_raw()),
    };

    // Three plain strings always serialize.
    serde_json::to_string(&wire).unwrap_or_default()
}

/// Parses an FDB entry key.
pub fn deserialize_fdb_entry(s: &str) -> SaiResult<FdbEntry> {
    let wire: FdbEntryWire =
        serde_json::from_str(s).map_err(|e| SaiError::invalid_parameter(e.to_string()))?;

    Ok(FdbEntry {
        switch_id: SwitchOid::from_raw_unchecked(deserialize_object_id(&wire.switch_id)?),
        bv_id: deserialize_object_id(&wire.bvid)?,
        mac_address: wire.mac.parse::<MacAddress>()?,
    })
}

/// Serializes a meta key as `<object type>:<key>`, the ASIC view row suffix.
pub fn serialize_object_meta_key(meta_key: &ObjectMetaKey) -> String {
    let key = match &meta_key.key {
        ObjectKey::ObjectId(oid) => serialize_object_id(*oid),
        ObjectKey::FdbEntry(entry) => serialize_fdb_entry(entry),
    };
    format!("{}:{}", meta_key.object_type, key)
}

/// Decodes a notification payload.
///
/// `name` selects the payload layout; an unrecognized name is
/// [`SaiError::UnknownNotification`], a payload that does not match the
/// layout is [`SaiError::Decode`].
pub fn deserialize_notification(
    name: &str,
    payload: &str,
    schema: &AttrSchema,
) -> SaiResult<NotificationEvent> {
    let kind =
        NotificationKind::from_name(name).ok_or_else(|| SaiError::unknown_notification(name))?;

    let decode = |e: SaiError| match e {
        SaiError::Decode { .. } => e,
        other => SaiError::decode(name, other.to_string()),
    };

    match kind {
        NotificationKind::SwitchStateChange => {
            deserialize_switch_oper_status(payload).map_err(decode)
        }
        NotificationKind::FdbEvent => deserialize_fdb_event_ntf(payload, schema).map_err(decode),
        NotificationKind::PortStateChange => {
            deserialize_port_oper_status_ntf(payload).map_err(decode)
        }
        NotificationKind::SwitchShutdownRequest => {
            deserialize_switch_shutdown_request(payload).map_err(decode)
        }
        NotificationKind::QueueDeadlock => deserialize_queue_deadlock_ntf(payload).map_err(decode),
    }
}

/// Serializes a notification back into its payload form.
pub fn serialize_notification(event: &NotificationEvent, schema: &AttrSchema) -> SaiResult<String> {
    match event {
        NotificationEvent::SwitchStateChange {
            switch_id,
            oper_status,
        } => to_json(&SwitchOperStatusWire {
            status: oper_status.to_string(),
            switch_id: switch_id.to_string(),
        }),
        NotificationEvent::SwitchShutdownRequest { switch_id } => to_json(&SwitchShutdownWire {
            switch_id: switch_id.to_string(),
        }),
        NotificationEvent::FdbEvent { entries } => {
            let wire = entries
                .iter()
                .map(|entry| fdb_event_to_wire(entry, schema))
                .collect::<SaiResult<Vec<_>>>()?;
            to_json(&wire)
        }
        NotificationEvent::PortStateChange { entries } => {
            let wire: Vec<PortStatusWire> = entries
                .iter()
                .map(|entry| PortStatusWire {
                    port_id: entry.port_id.to_string(),
                    port_state: entry.port_state.to_string(),
                })
                .collect();
            to_json(&wire)
        }
        NotificationEvent::QueueDeadlock { entries } => {
            let wire: Vec<DeadlockWire> = entries
                .iter()
                .map(|entry| DeadlockWire {
                    event: entry.event.to_string(),
                    queue_id: entry.queue_id.to_string(),
                })
                .collect();
            to_json(&wire)
        }
    }
}

fn fdb_event_to_wire(entry: &FdbEntryEvent, schema: &AttrSchema) -> SaiResult<FdbEventWire> {
    let list = entry
        .attributes
        .iter()
        .map(|attr| {
            let meta = schema.get(ObjectType::FdbEntry, attr.id)?;
            Ok(AttrWire {
                id: meta.attr_id_name.to_string(),
                value: serialize_attr_value(meta, &attr.value)?,
            })
        })
        .collect::<SaiResult<Vec<_>>>()?;

    Ok(FdbEventWire {
        fdb_entry: serialize_fdb_entry(&entry.fdb_entry),
        fdb_event: entry.event_type.to_string(),
        list,
    })
}

fn parse_json<'a, T: Deserialize<'a>>(kind: NotificationKind, payload: &'a str) -> SaiResult<T> {
    serde_json::from_str(payload).map_err(|e| SaiError::decode(kind.as_str(), e.to_string()))
}

fn parse_enum<T>(kind: NotificationKind, value: &str, parse: fn(&str) -> Option<T>) -> SaiResult<T> {
    parse(value).ok_or_else(|| SaiError::decode(kind.as_str(), format!("unknown value {}", value)))
}

pub fn deserialize_switch_oper_status(payload: &str) -> SaiResult<NotificationEvent> {
    let kind = NotificationKind::SwitchStateChange;
    let wire: SwitchOperStatusWire = parse_json(kind, payload)?;

    Ok(NotificationEvent::SwitchStateChange {
        switch_id: SwitchOid::from_raw_unchecked(deserialize_object_id(&wire.switch_id)?),
        oper_status: parse_enum(kind, &wire.status, SwitchOperStatus::from_name)?,
    })
}

pub fn deserialize_switch_shutdown_request(payload: &str) -> SaiResult<NotificationEvent> {
    let wire: SwitchShutdownWire = parse_json(NotificationKind::SwitchShutdownRequest, payload)?;

    Ok(NotificationEvent::SwitchShutdownRequest {
        switch_id: SwitchOid::from_raw_unchecked(deserialize_object_id(&wire.switch_id)?),
    })
}

pub fn deserialize_fdb_event_ntf(payload: &str, schema: &AttrSchema) -> SaiResult<NotificationEvent> {
    let kind = NotificationKind::FdbEvent;
    let wire: Vec<FdbEventWire> = parse_json(kind, payload)?;

    let mut entries = Vec::with_capacity(wire.len());
    for item in wire {
        let fdb_entry = deserialize_fdb_entry(&item.fdb_entry)?;
        let event_type = parse_enum(kind, &item.fdb_event, FdbEventType::from_name)?;

        let attributes = item
            .list
            .iter()
            .map(|attr| {
                let meta = schema.get_by_name(ObjectType::FdbEntry, &attr.id)?;
                let value = deserialize_attr_value(meta, &attr.value)?;
                Ok(Attribute::new(meta.attr_id, value))
            })
            .collect::<SaiResult<Vec<_>>>()?;

        entries.push(FdbEntryEvent::new(fdb_entry, event_type, attributes));
    }

    Ok(NotificationEvent::FdbEvent { entries })
}

pub fn deserialize_port_oper_status_ntf(payload: &str) -> SaiResult<NotificationEvent> {
    let kind = NotificationKind::PortStateChange;
    let wire: Vec<PortStatusWire> = parse_json(kind, payload)?;

    let entries = wire
        .iter()
        .map(|item| {
            Ok(PortStatusEntry {
                port_id: PortOid::from_raw_unchecked(deserialize_object_id(&item.port_id)?),
                port_state: parse_enum(kind, &item.port_state, PortOperStatus::from_name)?,
            })
        })
        .collect::<SaiResult<Vec<_>>>()?;

    Ok(NotificationEvent::PortStateChange { entries })
}

pub fn deserialize_queue_deadlock_ntf(payload: &str) -> SaiResult<NotificationEvent> {
    let kind = NotificationKind::QueueDeadlock;
    let wire: Vec<DeadlockWire> = parse_json(kind, payload)?;

    let entries = wire
        .iter()
        .map(|item| {
            Ok(DeadlockEntry {
                queue_id: QueueOid::from_raw_unchecked(deserialize_object_id(&item.queue_id)?),
                event: parse_enum(kind, &item.event, QueueDeadlockEventType::from_name)?,
            })
        })
        .collect::<SaiResult<Vec<_>>>()?;

    Ok(NotificationEvent::QueueDeadlock { entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttrValue;
    use crate::metadata::fdb_entry_attr;
    use pretty_assertions::assert_eq;

    const FDB_LEARNED: &str = r#"[{"fdb_entry":"{\"bvid\":\"oid:0x26000000000fa1\",\"mac\":\"00:11:22:33:44:55\",\"switch_id\":\"oid:0x21000000000000\"}","fdb_event":"SAI_FDB_EVENT_LEARNED","list":[{"id":"SAI_FDB_ENTRY_ATTR_BRIDGE_PORT_ID","value":"oid:0x3a000000000660"}]}]"#;

    #[test]
    fn test_decode_switch_state_change() {
        let payload = r#"{"status":"SAI_SWITCH_OPER_STATUS_DOWN","switch_id":"oid:0x21000000000000"}"#;
        let event =
            deserialize_notification("switch_state_change", payload, &AttrSchema::builtin()).unwrap();
        assert_eq!(
            event,
            NotificationEvent::SwitchStateChange {
                switch_id: SwitchOid::from_raw_unchecked(0x21000000000000),
                oper_status: SwitchOperStatus::Down,
            }
        );
    }

    #[test]
    fn test_decode_fdb_event() {
        let event = deserialize_notification("fdb_event", FDB_LEARNED, &AttrSchema::builtin()).unwrap();
        let NotificationEvent::FdbEvent { entries } = event else {
            panic!("expected fdb event");
        };

        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.event_type, FdbEventType::Learned);
        assert_eq!(entry.fdb_entry.bv_id, 0x26000000000fa1);
        assert_eq!(entry.fdb_entry.switch_id.as_raw(), 0x21000000000000);
        assert_eq!(entry.fdb_entry.mac_address.to_string(), "00:11:22:33:44:55");
        assert_eq!(
            entry.attributes,
            vec![Attribute::new(
                fdb_entry_attr::BRIDGE_PORT_ID,
                AttrValue::ObjectId(0x3a000000000660)
            )]
        );
    }

    #[test]
    fn test_fdb_event_reserializes_identically() {
        let schema = AttrSchema::builtin();
        let event = deserialize_notification("fdb_event", FDB_LEARNED, &schema).unwrap();
        assert_eq!(serialize_notification(&event, &schema).unwrap(), FDB_LEARNED);
    }

    #[test]
    fn test_truncated_payload_is_decode_error() {
        let truncated = &FDB_LEARNED[..FDB_LEARNED.len() - 3];
        let err = deserialize_notification("fdb_event", truncated, &AttrSchema::builtin()).unwrap_err();
        assert!(matches!(err, SaiError::Decode { ref kind, .. } if kind == "fdb_event"));
    }

    #[test]
    fn test_one_bad_element_fails_whole_batch() {
        let payload = r#"[{"port_id":"oid:0x1000000000002","port_state":"SAI_PORT_OPER_STATUS_UP"},{"port_id":"bogus","port_state":"SAI_PORT_OPER_STATUS_UP"}]"#;
        let err =
            deserialize_notification("port_state_change", payload, &AttrSchema::builtin()).unwrap_err();
        assert!(matches!(err, SaiError::Decode { .. }));
    }

    #[test]
    fn test_unknown_attribute_name_is_decode_error() {
        let payload = FDB_LEARNED.replace("SAI_FDB_ENTRY_ATTR_BRIDGE_PORT_ID", "SAI_FDB_ENTRY_ATTR_WHAT");
        let err = deserialize_notification("fdb_event", &payload, &AttrSchema::builtin()).unwrap_err();
        assert!(matches!(err, SaiError::Decode { .. }));
    }

    #[test]
    fn test_unknown_notification_name() {
        let err = deserialize_notification("bfd_session_state_change", "{}", &AttrSchema::builtin())
            .unwrap_err();
        assert_eq!(err, SaiError::unknown_notification("bfd_session_state_change"));
    }

    #[test]
    fn test_decode_queue_deadlock() {
        let payload = r#"[{"event":"SAI_QUEUE_PFC_DEADLOCK_EVENT_TYPE_RECOVERED","queue_id":"oid:0x15000000000230"}]"#;
        let event = deserialize_notification("queue_deadlock", payload, &AttrSchema::builtin()).unwrap();
        assert_eq!(
            event,
            NotificationEvent::QueueDeadlock {
                entries: vec![DeadlockEntry {
                    queue_id: QueueOid::from_raw_unchecked(0x15000000000230),
                    event: QueueDeadlockEventType::Recovered,
                }]
            }
        );
        assert_eq!(serialize_notification(&event, &AttrSchema::builtin()).unwrap(), payload);
    }

    #[test]
    fn test_decode_shutdown_request() {
        let payload = r#"{"switch_id":"oid:0x21000000000000"}"#;
        let event =
            deserialize_notification("switch_shutdown_request", payload, &AttrSchema::builtin()).unwrap();
        assert_eq!(serialize_notification(&event, &AttrSchema::builtin()).unwrap(), payload);
    }

    #[test]
    fn test_empty_batch_is_valid() {
        let event = deserialize_notification("port_state_change", "[]", &AttrSchema::builtin()).unwrap();
        assert_eq!(event, NotificationEvent::PortStateChange { entries: vec![] });
    }

    #[test]
    fn test_object_meta_key() {
        let entry = FdbEntry::new(
            SwitchOid::from_raw_unchecked(0x21),
            0x26,
            MacAddress::new([0, 0x11, 0x22, 0x33, 0x44, 0x55]),
        );
        assert_eq!(
            serialize_object_meta_key(&ObjectMetaKey::fdb_entry(entry)),
            r#"SAI_OBJECT_TYPE_FDB_ENTRY:{"bvid":"oid:0x26","mac":"00:11:22:33:44:55","switch_id":"oid:0x21"}"#
        );
        assert_eq!(deserialize_fdb_entry(&serialize_fdb_entry(&entry)).unwrap(), entry);
    }
}
