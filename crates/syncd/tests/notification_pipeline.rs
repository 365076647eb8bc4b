//! End-to-end notification processing through the worker thread.
//!
//! Each test wires a processor to in-memory collaborators, feeds raw
//! notifications through the dispatcher queue and checks what reached the
//! ASIC view and the outgoing channel.

use pretty_assertions::assert_eq;
use sonic_sai::{
    deserialize_notification, fdb_entry_attr, serialize_notification, AttrSchema, AttrValue,
    Attribute, FdbEntry, FdbEntryEvent, FdbEntryType, FdbEventType, MacAddress, NotificationEvent,
    ObjectMetaKey, RawSaiObjectId, SwitchOid, SAI_NULL_OBJECT_ID,
};
use sonic_syncd::*;
use std::sync::{Arc, Mutex};

const SWITCH_RID: RawSaiObjectId = 0x21000000000000;
const SWITCH_VID: RawSaiObjectId = 0x21000000000a00;
const BRIDGE_RID: RawSaiObjectId = 0x26000000000001;
const BRIDGE_VID: RawSaiObjectId = 0x26000000000a01;
const PORT_RID: RawSaiObjectId = 0x3a000000000001;
const PORT_VID: RawSaiObjectId = 0x3a000000000a01;
const UNKNOWN_BRIDGE_RID: RawSaiObjectId = 0x260000000000ff;
const UNKNOWN_PORT_RID: RawSaiObjectId = 0x3a0000000000ff;

// ============================================================================
// HARNESS
// ============================================================================

struct Harness {
    producer: Arc<RecordingProducer>,
    store: Arc<MemoryAsicStore>,
    processor: Arc<NotificationProcessor>,
    dispatcher: NotificationDispatcher,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(ProcessorConfig::default())
    }

    fn with_config(config: ProcessorConfig) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let producer = Arc::new(RecordingProducer::new());
        let store = Arc::new(MemoryAsicStore::new());
        let table = Arc::new(LocalVidTranslator::new());
        table.insert(SWITCH_RID, SWITCH_VID);
        table.insert(BRIDGE_RID, BRIDGE_VID);
        table.insert(PORT_RID, PORT_VID);

        let processor = Arc::new(
            NotificationProcessor::new(producer.clone(), store.clone(), table).with_config(config),
        );
        let dispatcher = NotificationDispatcher::for_processor(Arc::clone(&processor));

        Self {
            producer,
            store,
            processor,
            dispatcher,
        }
    }

    /// Runs the worker over `items` and waits until all of them are processed.
    fn run(&self, items: Vec<KeyOpFieldsValues>) {
        self.dispatcher.start().unwrap();
        for item in items {
            self.dispatcher.enqueue(item);
        }
        self.dispatcher.stop();
    }

    fn republished_fdb(&self) -> Vec<Vec<FdbEntryEvent>> {
        let schema = AttrSchema::builtin();
        self.producer
            .sent_named("fdb_event")
            .iter()
            .map(
                |n| match deserialize_notification(&n.name, &n.payload, &schema).unwrap() {
                    NotificationEvent::FdbEvent { entries } => entries,
                    other => panic!("unexpected event {:?}", other),
                },
            )
            .collect()
    }
}

fn mac(last: u8) -> MacAddress {
    MacAddress::new([0x00, 0x11, 0x22, 0x33, 0x44, last])
}

fn fdb(event_type: FdbEventType, bv_id: RawSaiObjectId, mac: MacAddress, attrs: Vec<Attribute>) -> FdbEntryEvent {
    FdbEntryEvent::new(
        FdbEntry::new(SwitchOid::from_raw_unchecked(SWITCH_RID), bv_id, mac),
        event_type,
        attrs,
    )
}

fn port_attr(rid: RawSaiObjectId) -> Attribute {
    Attribute::new(fdb_entry_attr::BRIDGE_PORT_ID, AttrValue::ObjectId(rid))
}

fn type_attr(entry_type: FdbEntryType) -> Attribute {
    Attribute::new(fdb_entry_attr::TYPE, AttrValue::Int32(entry_type.as_s32()))
}

fn fdb_notification(entries: Vec<FdbEntryEvent>) -> KeyOpFieldsValues {
    let payload =
        serialize_notification(&NotificationEvent::FdbEvent { entries }, &AttrSchema::builtin())
            .unwrap();
    KeyOpFieldsValues::notification("fdb_event", payload)
}

fn vid_key(mac: MacAddress) -> ObjectMetaKey {
    ObjectMetaKey::fdb_entry(FdbEntry::new(
        SwitchOid::from_raw_unchecked(SWITCH_VID),
        BRIDGE_VID,
        mac,
    ))
}

fn row(port: &str, entry_type: &str) -> Vec<(String, String)> {
    vec![
        ("SAI_FDB_ENTRY_ATTR_BRIDGE_PORT_ID".to_string(), port.to_string()),
        ("SAI_FDB_ENTRY_ATTR_TYPE".to_string(), entry_type.to_string()),
    ]
}

// ============================================================================
// FDB EVENTS
// ============================================================================

#[test]
fn test_fdb_batch_with_known_ids_republished_once_with_vids() {
    let h = Harness::new();

    h.run(vec![fdb_notification(vec![
        fdb(FdbEventType::Learned, BRIDGE_RID, mac(1), vec![port_attr(PORT_RID)]),
        fdb(FdbEventType::Learned, BRIDGE_RID, mac(2), vec![port_attr(PORT_RID)]),
    ])]);

    let batches = h.republished_fdb();
    assert_eq!(batches.len(), 1);

    let entries = &batches[0];
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].fdb_entry.mac_address, mac(1));
    assert_eq!(entries[1].fdb_entry.mac_address, mac(2));
    for entry in entries {
        assert_eq!(entry.fdb_entry.switch_id.as_raw(), SWITCH_VID);
        assert_eq!(entry.fdb_entry.bv_id, BRIDGE_VID);
        assert_eq!(entry.bridge_port_id(), Some(PORT_VID));
        assert_eq!(entry.entry_type(), Some(FdbEntryType::Dynamic.as_s32()));
    }

    assert!(h.store.contains(&vid_key(mac(1))));
    assert!(h.store.contains(&vid_key(mac(2))));

    let stats = h.processor.stats();
    assert_eq!(stats.republished, 1);
    assert_eq!(stats.store_creates, 2);
}

#[test]
fn test_fdb_batch_with_unknown_bridge_still_applied_but_not_republished() {
    let h = Harness::new();
    h.store
        .create(&vid_key(mac(3)), &row("oid:0x3a000000000a01", "SAI_FDB_ENTRY_TYPE_DYNAMIC"))
        .unwrap();

    h.run(vec![fdb_notification(vec![
        fdb(FdbEventType::Learned, BRIDGE_RID, mac(1), vec![]),
        fdb(FdbEventType::Aged, UNKNOWN_BRIDGE_RID, mac(2), vec![]),
        fdb(FdbEventType::Aged, BRIDGE_RID, mac(3), vec![]),
    ])]);

    assert!(h.producer.is_empty());
    assert!(h.store.contains(&vid_key(mac(1))));
    assert!(!h.store.contains(&vid_key(mac(3))));

    // The unknown bridge translates to null, so that entry never touches the store.
    let ops = h.store.operations();
    assert_eq!(ops.len(), 3);
    assert!(matches!(ops[1], StoreOperation::Create { .. }));
    assert!(matches!(ops[2], StoreOperation::Remove { existed: true, .. }));

    assert_eq!(h.processor.stats().validation_failures, 1);
}

#[test]
fn test_fdb_unknown_port_attribute_not_written_or_republished() {
    let h = Harness::new();

    h.run(vec![fdb_notification(vec![fdb(
        FdbEventType::Learned,
        BRIDGE_RID,
        mac(1),
        vec![port_attr(UNKNOWN_PORT_RID)],
    )])]);

    assert!(h.producer.is_empty());
    assert!(!h.store.contains(&vid_key(mac(1))));
    assert!(h.store.operations().is_empty());

    let stats = h.processor.stats();
    assert_eq!(stats.entry_errors, 1);
    assert_eq!(stats.validation_failures, 1);
}

#[test]
fn test_aged_entry_not_in_store_is_noop() {
    let h = Harness::new();

    h.run(vec![fdb_notification(vec![fdb(
        FdbEventType::Aged,
        BRIDGE_RID,
        mac(9),
        vec![],
    )])]);

    assert_eq!(
        h.store.operations(),
        vec![StoreOperation::Remove {
            key: asic_state_key(&vid_key(mac(9))),
            existed: false,
        }]
    );
    let stats = h.processor.stats();
    assert_eq!(stats.entry_errors, 0);
    assert_eq!(stats.republished, 1);
}

#[test]
fn test_flush_uses_scoped_flush_once_per_scope() {
    let h = Harness::new();
    h.store
        .create(&vid_key(mac(1)), &row("oid:0x3a000000000a01", "SAI_FDB_ENTRY_TYPE_DYNAMIC"))
        .unwrap();
    h.store
        .create(&vid_key(mac(2)), &row("oid:0x3a000000000a01", "SAI_FDB_ENTRY_TYPE_STATIC"))
        .unwrap();
    h.store
        .create(&vid_key(mac(3)), &row("oid:0x3a000000000a02", "SAI_FDB_ENTRY_TYPE_DYNAMIC"))
        .unwrap();

    let flush = fdb(
        FdbEventType::Flushed,
        SAI_NULL_OBJECT_ID,
        MacAddress::ZERO,
        vec![port_attr(PORT_RID)],
    );
    let flush_static = fdb(
        FdbEventType::Flushed,
        SAI_NULL_OBJECT_ID,
        MacAddress::ZERO,
        vec![port_attr(PORT_RID), type_attr(FdbEntryType::Static)],
    );

    h.run(vec![fdb_notification(vec![flush.clone(), flush, flush_static])]);

    let flushes: Vec<_> = h
        .store
        .operations()
        .into_iter()
        .skip(3)
        .collect();
    assert_eq!(flushes.len(), 2);
    assert!(flushes.iter().all(|op| matches!(op, StoreOperation::Flush { .. })));

    assert!(!h.store.contains(&vid_key(mac(1))));
    assert!(!h.store.contains(&vid_key(mac(2))));
    assert!(h.store.contains(&vid_key(mac(3))));

    assert_eq!(h.republished_fdb().len(), 1);
}

#[test]
fn test_flush_of_unknown_port_leaves_other_rows() {
    let h = Harness::new();

    h.run(vec![
        fdb_notification(vec![fdb(
            FdbEventType::Learned,
            BRIDGE_RID,
            mac(1),
            vec![port_attr(PORT_RID)],
        )]),
        fdb_notification(vec![fdb(
            FdbEventType::Flushed,
            BRIDGE_RID,
            MacAddress::ZERO,
            vec![port_attr(UNKNOWN_PORT_RID)],
        )]),
    ]);

    assert!(h.store.contains(&vid_key(mac(1))));
    assert!(!h
        .store
        .operations()
        .iter()
        .any(|op| matches!(op, StoreOperation::Flush { .. })));

    let stats = h.processor.stats();
    assert_eq!(stats.store_flushes, 0);
    assert_eq!(stats.entry_errors, 1);
    assert_eq!(h.republished_fdb().len(), 1);
}

#[test]
fn test_flush_of_unknown_bridge_leaves_other_rows() {
    let h = Harness::new();
    h.store
        .create(&vid_key(mac(1)), &row("oid:0x3a000000000a01", "SAI_FDB_ENTRY_TYPE_DYNAMIC"))
        .unwrap();

    h.run(vec![fdb_notification(vec![fdb(
        FdbEventType::Flushed,
        UNKNOWN_BRIDGE_RID,
        MacAddress::ZERO,
        vec![port_attr(PORT_RID)],
    )])]);

    assert!(h.store.contains(&vid_key(mac(1))));
    assert_eq!(h.processor.stats().store_flushes, 0);
    assert!(h.producer.is_empty());
}

#[test]
fn test_flush_scopes_not_deduplicated_when_disabled() {
    let mut config = ProcessorConfig::default();
    config.notifications.dedup_flush_scopes = false;
    let h = Harness::with_config(config);

    let flush = fdb(FdbEventType::Flushed, SAI_NULL_OBJECT_ID, MacAddress::ZERO, vec![]);
    h.run(vec![fdb_notification(vec![flush.clone(), flush])]);

    assert_eq!(h.processor.stats().store_flushes, 2);
}

#[test]
fn test_learned_with_type_gets_no_second_type() {
    let h = Harness::new();

    h.run(vec![fdb_notification(vec![fdb(
        FdbEventType::Learned,
        BRIDGE_RID,
        mac(1),
        vec![type_attr(FdbEntryType::Static), port_attr(PORT_RID)],
    )])]);

    let stored = h.store.get(&asic_state_key(&vid_key(mac(1)))).unwrap();
    let types = stored
        .iter()
        .filter(|(f, _)| f == "SAI_FDB_ENTRY_ATTR_TYPE")
        .count();
    assert_eq!(types, 1);

    let republished = &h.republished_fdb()[0][0];
    assert_eq!(republished.attributes.len(), 2);
    assert_eq!(republished.entry_type(), Some(FdbEntryType::Static.as_s32()));
}

#[test]
fn test_learned_with_empty_attributes_gets_dynamic_type() {
    let h = Harness::new();

    h.run(vec![fdb_notification(vec![fdb(
        FdbEventType::Learned,
        BRIDGE_RID,
        mac(1),
        vec![],
    )])]);

    assert_eq!(
        h.store.operations(),
        vec![StoreOperation::Create {
            key: asic_state_key(&vid_key(mac(1))),
            attributes: vec![(
                "SAI_FDB_ENTRY_ATTR_TYPE".to_string(),
                "SAI_FDB_ENTRY_TYPE_DYNAMIC".to_string()
            )],
        }]
    );

    let republished = &h.republished_fdb()[0][0];
    assert_eq!(republished.attributes, vec![type_attr(FdbEntryType::Dynamic)]);
}

// ============================================================================
// OTHER NOTIFICATIONS
// ============================================================================

#[test]
fn test_unknown_port_republished_with_null_id_and_processing_continues() {
    let h = Harness::new();

    h.run(vec![
        KeyOpFieldsValues::notification(
            "port_state_change",
            r#"[{"port_id":"oid:0x1000000000099","port_state":"SAI_PORT_OPER_STATUS_UP"},{"port_id":"oid:0x3a000000000001","port_state":"SAI_PORT_OPER_STATUS_DOWN"}]"#,
        ),
        KeyOpFieldsValues::notification(
            "switch_state_change",
            r#"{"status":"SAI_SWITCH_OPER_STATUS_UP","switch_id":"oid:0x21000000000000"}"#,
        ),
    ]);

    let sent = h.producer.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].name, "port_state_change");
    assert_eq!(
        sent[0].payload,
        r#"[{"port_id":"oid:0x0","port_state":"SAI_PORT_OPER_STATUS_UP"},{"port_id":"oid:0x3a000000000a01","port_state":"SAI_PORT_OPER_STATUS_DOWN"}]"#
    );
    assert_eq!(
        sent[1].payload,
        r#"{"status":"SAI_SWITCH_OPER_STATUS_UP","switch_id":"oid:0x21000000000a00"}"#
    );
}

#[test]
fn test_bad_notifications_do_not_stop_worker() {
    let h = Harness::new();

    h.run(vec![
        KeyOpFieldsValues::notification("fdb_event", r#"[{"fdb_entry":"#),
        KeyOpFieldsValues::notification("bfd_session_state_change", "{}"),
        KeyOpFieldsValues::notification(
            "queue_deadlock",
            r#"[{"event":"SAI_QUEUE_PFC_DEADLOCK_EVENT_TYPE_DETECTED","queue_id":"oid:0x15000000000001"}]"#,
        ),
    ]);

    let sent = h.producer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].name, "queue_deadlock");

    let stats = h.processor.stats();
    assert_eq!(stats.processed, 3);
    assert_eq!(stats.decode_errors, 1);
    assert_eq!(stats.unknown_notifications, 1);
}

// ============================================================================
// WORKER
// ============================================================================

#[test]
fn test_stop_drains_everything_enqueued_before_stop() {
    let h = Harness::new();

    let items = (0..100)
        .map(|_| {
            KeyOpFieldsValues::notification(
                "switch_shutdown_request",
                r#"{"switch_id":"oid:0x21000000000000"}"#,
            )
        })
        .collect();
    h.run(items);

    assert_eq!(h.producer.len(), 100);
    assert_eq!(h.dispatcher.queue().dequeued_total(), 100);
}

#[test]
fn test_synchronous_path_under_external_lock() {
    let _ = env_logger::builder().is_test(true).try_init();

    let producer = Arc::new(RecordingProducer::new());
    let table = Arc::new(LocalVidTranslator::new());
    table.insert(SWITCH_RID, SWITCH_VID);
    let processor = Arc::new(NotificationProcessor::new(
        producer.clone(),
        Arc::new(MemoryAsicStore::new()),
        table,
    ));

    let asic_lock = Arc::new(Mutex::new(()));
    let lock = Arc::clone(&asic_lock);
    let dispatcher = NotificationDispatcher::new(move |item: &KeyOpFieldsValues| {
        let _guard = lock.lock().unwrap();
        processor.sync_process_notification(item);
    });

    dispatcher.queue().enqueue(KeyOpFieldsValues::notification(
        "switch_shutdown_request",
        r#"{"switch_id":"oid:0x21000000000000"}"#,
    ));

    assert_eq!(dispatcher.state(), DispatcherState::Stopped);
    assert!(dispatcher.process_one());
    assert!(!dispatcher.process_one());

    assert_eq!(
        producer.sent()[0].payload,
        r#"{"switch_id":"oid:0x21000000000a00"}"#
    );
}

#[tokio::test]
async fn test_channel_producer_receives_republished_events() {
    let (producer, mut rx) = ChannelProducer::channel();
    let table = Arc::new(LocalVidTranslator::new());
    table.insert(SWITCH_RID, SWITCH_VID);

    let processor = Arc::new(NotificationProcessor::new(
        Arc::new(producer),
        Arc::new(MemoryAsicStore::new()),
        table,
    ));
    let dispatcher = NotificationDispatcher::for_processor(processor);
    dispatcher.start().unwrap();
    dispatcher.enqueue(KeyOpFieldsValues::notification(
        "switch_state_change",
        r#"{"status":"SAI_SWITCH_OPER_STATUS_DOWN","switch_id":"oid:0x21000000000000"}"#,
    ));

    let published = rx.recv().await.unwrap();
    dispatcher.stop();

    assert_eq!(published.name, "switch_state_change");
    assert_eq!(
        published.payload,
        r#"{"status":"SAI_SWITCH_OPER_STATUS_DOWN","switch_id":"oid:0x21000000000a00"}"#
    );
}
