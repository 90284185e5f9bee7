//! Debounced partition persistence
//!
//! Mutations schedule a whole-partition snapshot; a worker thread flushes
//! the latest snapshot per partition once the debounce window has been
//! quiet. A new mutation inside the window supersedes the pending
//! snapshot and pushes the deadline out (last-write-wins per partition).
//! Save failures are logged and the snapshot is kept dirty so the next
//! flush retries it; in-memory state stays authoritative throughout.

use parking_lot::{Condvar, Mutex};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use aura_storage::{Partition, PartitionStore};

/// Default quiet window before dirty partitions are written.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

struct SchedulerState {
    /// Latest snapshot per dirty partition
    dirty: HashMap<Partition, Value>,
    /// When the current debounce window elapses
    deadline: Option<Instant>,
    shutdown: bool,
}

struct Inner {
    store: Arc<dyn PartitionStore>,
    state: Mutex<SchedulerState>,
    cond: Condvar,
    debounce: Duration,
}

impl Inner {
    /// Write a batch of snapshots. Failed saves go back into the dirty
    /// map unless a newer snapshot for that partition arrived meanwhile.
    fn write_batch(&self, batch: HashMap<Partition, Value>) {
        for (partition, value) in batch {
            if let Err(e) = self.store.save(partition, &value) {
                tracing::warn!(partition = %partition, error = %e, "Partition save failed; will retry");
                let mut state = self.state.lock();
                state.dirty.entry(partition).or_insert(value);
            } else {
                tracing::debug!(partition = %partition, "Partition saved");
            }
        }
    }
}

pub struct PersistScheduler {
    inner: Arc<Inner>,
    worker: Option<JoinHandle<()>>,
}

impl PersistScheduler {
    pub fn new(store: Arc<dyn PartitionStore>, debounce: Duration) -> Self {
        let inner = Arc::new(Inner {
            store,
            state: Mutex::new(SchedulerState {
                dirty: HashMap::new(),
                deadline: None,
                shutdown: false,
            }),
            cond: Condvar::new(),
            debounce,
        });

        let worker_inner = Arc::clone(&inner);
        let worker = std::thread::Builder::new()
            .name("aura-persist".to_string())
            .spawn(move || run_worker(worker_inner))
            .expect("failed to spawn persist worker");

        Self {
            inner,
            worker: Some(worker),
        }
    }

    /// Record the latest snapshot for a partition and (re)arm the
    /// debounce window.
    pub fn schedule(&self, partition: Partition, snapshot: Value) {
        let mut state = self.inner.state.lock();
        state.dirty.insert(partition, snapshot);
        state.deadline = Some(Instant::now() + self.inner.debounce);
        self.inner.cond.notify_one();
    }

    /// Synchronously write everything dirty right now. Used at shutdown
    /// and wherever deterministic persistence is needed.
    pub fn flush(&self) {
        let batch = {
            let mut state = self.inner.state.lock();
            state.deadline = None;
            std::mem::take(&mut state.dirty)
        };
        self.inner.write_batch(batch);
    }

    #[cfg(test)]
    fn pending(&self) -> usize {
        self.inner.state.lock().dirty.len()
    }
}

impl Drop for PersistScheduler {
    fn drop(&mut self) {
        {
            let mut state = self.inner.state.lock();
            state.shutdown = true;
            self.inner.cond.notify_one();
        }

        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run_worker(inner: Arc<Inner>) {
    loop {
        let batch = {
            let mut state = inner.state.lock();

            loop {
                if state.shutdown {
                    // Final flush on the way out
                    break std::mem::take(&mut state.dirty);
                }

                match state.deadline {
                    None => {
                        inner.cond.wait(&mut state);
                    }
                    Some(deadline) => {
                        if Instant::now() >= deadline {
                            state.deadline = None;
                            break std::mem::take(&mut state.dirty);
                        }
                        // A rescheduled deadline re-enters the loop above
                        inner.cond.wait_until(&mut state, deadline);
                    }
                }
            }
        };

        inner.write_batch(batch);

        if inner.state.lock().shutdown {
            return;
        }
    }
}
