//! Notification worker.
//!
//! The driver raises notifications on its own callback thread, which must
//! never wait for store or channel I/O. It only enqueues; one dedicated
//! worker thread drains the queue in FIFO order and hands every item to the
//! synchronizer.

use crate::error::Result;
use crate::processor::NotificationProcessor;
use crate::queue::{KeyOpFieldsValues, NotificationQueue};
use log::{debug, error, info, warn};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Callback receiving every dequeued item.
pub type Synchronizer = Arc<dyn Fn(&KeyOpFieldsValues) + Send + Sync>;

/// Worker lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Stopped,
    Running,
}

/// Condition variable with a latched wake flag, so a wake raised while the
/// worker is busy draining is seen by its next wait.
#[derive(Debug, Default)]
struct WakeSignal {
    pending: Mutex<bool>,
    cv: Condvar,
}

impl WakeSignal {
    fn notify(&self) {
        *self.pending.lock() = true;
        self.cv.notify_all();
    }

    fn wait(&self) {
        let mut pending = self.pending.lock();
        while !*pending {
            self.cv.wait(&mut pending);
        }
        *pending = false;
    }
}

struct Shared {
    queue: Arc<NotificationQueue>,
    wake: WakeSignal,
    run: AtomicBool,
    synchronizer: Synchronizer,
}

impl Shared {
    fn drain(&self) -> usize {
        let mut count = 0;
        while let Some(item) = self.queue.try_dequeue() {
            (self.synchronizer)(&item);
            count += 1;
        }
        count
    }

    fn worker_loop(&self) {
        info!("notification worker started");

        loop {
            self.wake.wait();

            // Sampled before draining: everything enqueued before a stop
            // request is drained on this pass.
            let running = self.run.load(Ordering::SeqCst);

            let count = self.drain();
            if count > 0 {
                debug!("drained {} notifications", count);
            }

            if !running {
                break;
            }
        }

        info!("notification worker stopped");
    }
}

/// Owns the notification queue and its worker thread.
pub struct NotificationDispatcher {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
    thread_name: String,
}

impl NotificationDispatcher {
    pub fn new<F>(synchronizer: F) -> Self
    where
        F: Fn(&KeyOpFieldsValues) + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                queue: Arc::new(NotificationQueue::new()),
                wake: WakeSignal::default(),
                run: AtomicBool::new(false),
                synchronizer: Arc::new(synchronizer),
            }),
            worker: Mutex::new(None),
            thread_name: crate::config::WorkerConfig::default().thread_name,
        }
    }

    /// Dispatcher whose worker feeds every item straight into `processor`.
    ///
    /// Embedders that serialize ASIC state access under their own lock
    /// should use [`NotificationDispatcher::new`] and take that lock in the
    /// synchronizer instead.
    pub fn for_processor(processor: Arc<NotificationProcessor>) -> Self {
        let thread_name = processor.config().worker.thread_name.clone();
        Self::new(move |item| processor.sync_process_notification(item)).with_thread_name(thread_name)
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Spawns the worker. Starting a running dispatcher does nothing.
    pub fn start(&self) -> Result<()> {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            warn!("notification worker {} already running", self.thread_name);
            return Ok(());
        }

        self.shared.run.store(true, Ordering::SeqCst);

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || shared.worker_loop());

        match spawned {
            Ok(handle) => *worker = Some(handle),
            Err(e) => {
                self.shared.run.store(false, Ordering::SeqCst);
                return Err(e.into());
            }
        }

        // Items queued while stopped are picked up right away.
        self.shared.wake.notify();

        Ok(())
    }

    /// Stops the worker and waits for it to exit.
    ///
    /// Items enqueued before the call are processed first. Stopping a
    /// stopped dispatcher does nothing.
    pub fn stop(&self) {
        let Some(handle) = self.worker.lock().take() else {
            return;
        };

        self.shared.run.store(false, Ordering::SeqCst);
        self.shared.wake.notify();

        if handle.join().is_err() {
            error!("notification worker {} panicked", self.thread_name);
        }
    }

    /// Wakes the worker without enqueuing anything.
    pub fn signal(&self) {
        self.shared.wake.notify();
    }

    /// Queues a notification and wakes the worker. Never blocks on the worker.
    pub fn enqueue(&self, item: KeyOpFieldsValues) {
        self.shared.queue.enqueue(item);
        self.signal();
    }

    pub fn queue(&self) -> Arc<NotificationQueue> {
        Arc::clone(&self.shared.queue)
    }

    pub fn state(&self) -> DispatcherState {
        if self.worker.lock().is_some() {
            DispatcherState::Running
        } else {
            DispatcherState::Stopped
        }
    }

    /// Processes one queued item on the calling thread.
    ///
    /// The caller must make sure this does not race the worker, normally by
    /// holding the lock its synchronizer takes. Returns false if the queue
    /// was empty.
    pub fn process_one(&self) -> bool {
        match self.shared.queue.try_dequeue() {
            Some(item) => {
                (self.shared.synchronizer)(&item);
                true
            }
            None => false,
        }
    }
}

impl Drop for NotificationDispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
