//! Switch notification processing for the ASIC synchronization daemon.
//!
//! Notifications raised by the ASIC driver arrive as raw `(name, payload)`
//! items. They are queued by the driver callback and drained by a single
//! worker, which decodes them, translates every driver id (RID) into the
//! control plane's virtual id (VID), applies FDB changes to the ASIC view
//! and republishes the translated notification.
//!
//! - [`dispatcher`]: queue worker lifecycle and the synchronous bypass
//! - [`processor`]: router, FDB pipeline and republisher
//! - [`fdb`]: FDB validation and ASIC view application
//! - [`translator`], [`asic_store`], [`producer`]: the collaborators the
//!   pipeline is built on, with in-memory implementations
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use sonic_syncd::{
//!     KeyOpFieldsValues, LocalVidTranslator, MemoryAsicStore, NotificationDispatcher,
//!     NotificationProcessor, RecordingProducer,
//! };
//!
//! let producer = Arc::new(RecordingProducer::new());
//! let translator = Arc::new(LocalVidTranslator::new());
//! translator.insert(0x21000000000000, 0x21000000000000);
//!
//! let processor = Arc::new(NotificationProcessor::new(
//!     producer.clone(),
//!     Arc::new(MemoryAsicStore::new()),
//!     translator,
//! ));
//!
//! let dispatcher = NotificationDispatcher::for_processor(processor);
//! dispatcher.start().unwrap();
//! dispatcher.enqueue(KeyOpFieldsValues::notification(
//!     "switch_shutdown_request",
//!     r#"{"switch_id":"oid:0x21000000000000"}"#,
//! ));
//! dispatcher.stop();
//!
//! assert_eq!(producer.len(), 1);
//! ```

pub mod asic_store;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod fdb;
pub mod processor;
pub mod producer;
pub mod queue;
pub mod translator;

pub use asic_store::{asic_state_key, AsicStateStore, MemoryAsicStore, StoreOperation};
pub use config::{NotificationConfig, ProcessorConfig, WorkerConfig};
pub use dispatcher::{DispatcherState, NotificationDispatcher, Synchronizer};
pub use error::{Result, SyncdError};
pub use fdb::{ApplyOutcome, FdbApplier, FlushScope};
pub use processor::{NotificationProcessor, ProcessorStats, StatsSnapshot};
pub use producer::{ChannelProducer, NotificationProducer, PublishedNotification, RecordingProducer};
pub use queue::{FieldValue, KeyOpFieldsValues, NotificationQueue};
pub use translator::{LocalVidTranslator, VidTranslator};
