//! In-memory storage implementation.

use super::{BoxFuture, DiagramRecord, Storage, StorageError, StorageResult, sort_newest_first};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStorage {
    records: RwLock<HashMap<String, DiagramRecord>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl Storage for MemoryStorage {
    fn put(&self, record: &DiagramRecord) -> BoxFuture<'_, StorageResult<()>> {
        let record = record.clone();
        Box::pin(async move {
            let mut records = self.records.write().map_err(lock_error)?;
            records.insert(record.id.clone(), record);
            Ok(())
        })
    }

    fn get(&self, id: &str) -> BoxFuture<'_, StorageResult<DiagramRecord>> {
        let id = id.to_string();
        Box::pin(async move {
            let records = self.records.read().map_err(lock_error)?;
            records
                .get(&id)
                .cloned()
                .ok_or_else(|| StorageError::NotFound(id))
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut records = self.records.write().map_err(lock_error)?;
            records.remove(&id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<DiagramRecord>>> {
        Box::pin(async move {
            let records = self.records.read().map_err(lock_error)?;
            let mut list: Vec<DiagramRecord> = records.values().cloned().collect();
            sort_newest_first(&mut list);
            Ok(list)
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let id = id.to_string();
        Box::pin(async move {
            let records = self.records.read().map_err(lock_error)?;
            Ok(records.contains_key(&id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::{block_on, record};

    #[test]
    fn test_put_and_get() {
        let storage = MemoryStorage::new();
        block_on(storage.put(&record("a", 10))).unwrap();
        let loaded = block_on(storage.get("a")).unwrap();
        assert_eq!(loaded.name, "Diagram a");
    }

    #[test]
    fn test_not_found() {
        let storage = MemoryStorage::new();
        let result = block_on(storage.get("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_list_newest_first() {
        let storage = MemoryStorage::new();
        block_on(storage.put(&record("old", 10))).unwrap();
        block_on(storage.put(&record("new", 30))).unwrap();
        block_on(storage.put(&record("mid", 20))).unwrap();
        let ids: Vec<String> = block_on(storage.list())
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, ["new", "mid", "old"]);
    }

    #[test]
    fn test_delete() {
        let storage = MemoryStorage::new();
        block_on(storage.put(&record("a", 1))).unwrap();
        assert!(block_on(storage.exists("a")).unwrap());
        block_on(storage.delete("a")).unwrap();
        assert!(!block_on(storage.exists("a")).unwrap());
        // Deleting again is fine.
        block_on(storage.delete("a")).unwrap();
    }
}
