//! In-memory partition store for tests and ephemeral profiles

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::partition::{Partition, PartitionStore};
use crate::Result;

#[derive(Default)]
pub struct MemoryStore {
    partitions: Arc<RwLock<HashMap<Partition, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of partitions that have been saved at least once.
    pub fn saved_count(&self) -> usize {
        self.partitions.read().len()
    }
}

impl PartitionStore for MemoryStore {
    fn load(&self, partition: Partition) -> Result<Option<Value>> {
        Ok(self.partitions.read().get(&partition).cloned())
    }

    fn save(&self, partition: Partition, value: &Value) -> Result<()> {
        self.partitions.write().insert(partition, value.clone());
        Ok(())
    }
}

impl Clone for MemoryStore {
    fn clone(&self) -> Self {
        Self {
            partitions: Arc::clone(&self.partitions),
        }
    }
}
