//! File-based storage implementation for native platforms.

use super::{BoxFuture, DiagramRecord, Storage, StorageError, StorageResult, sort_newest_first};
use std::fs;
use std::path::{Path, PathBuf};

/// File-based storage for native platforms.
///
/// Stores each diagram as `{id}.json` in a directory. Characters other
/// than ASCII letters, digits and `-` are written as `_xx` per UTF-8 byte,
/// so distinct ids never share a file.
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new file storage with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create file storage in the default location.
    ///
    /// On Unix: `~/.local/share/muriel/diagrams/`
    /// On Windows: `%LOCALAPPDATA%\muriel\diagrams\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;

        Self::new(base.join("muriel").join("diagrams"))
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", encode_id(id)))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

fn encode_id(id: &str) -> String {
    let mut encoded = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("_{:02x}", byte));
        }
    }
    encoded
}

fn read_record(path: &Path) -> StorageResult<DiagramRecord> {
    let json = fs::read_to_string(path)
        .map_err(|e| StorageError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    DiagramRecord::from_json(&json).map_err(|e| {
        StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
    })
}

impl Storage for FileStorage {
    fn put(&self, record: &DiagramRecord) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.record_path(&record.id);
        let json = match record.to_json() {
            Ok(j) => j,
            Err(e) => {
                return Box::pin(async move { Err(StorageError::Serialization(e.to_string())) });
            }
        };

        Box::pin(async move {
            fs::write(&path, json).map_err(|e| {
                StorageError::Io(format!("Failed to write {}: {}", path.display(), e))
            })
        })
    }

    fn get(&self, id: &str) -> BoxFuture<'_, StorageResult<DiagramRecord>> {
        let path = self.record_path(id);
        let id_owned = id.to_string();

        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(id_owned));
            }
            read_record(&path)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.record_path(id);

        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<DiagramRecord>>> {
        let base = self.base_path.clone();

        Box::pin(async move {
            if !base.exists() {
                return Ok(vec![]);
            }

            let entries = fs::read_dir(&base)
                .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;

            let mut records = Vec::new();
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_none_or(|ext| ext != "json") {
                    continue;
                }
                match read_record(&path) {
                    Ok(record) => records.push(record),
                    Err(e) => log::warn!("Skipping unreadable diagram: {}", e),
                }
            }
            sort_newest_first(&mut records);
            Ok(records)
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.record_path(id);
        Box::pin(async move { Ok(path.exists()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::{block_on, record};
    use tempfile::tempdir;

    #[test]
    fn test_file_storage_put_get() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        block_on(storage.put(&record("test-doc", 42))).unwrap();
        let loaded = block_on(storage.get("test-doc")).unwrap();

        assert_eq!(loaded, record("test-doc", 42));
    }

    #[test]
    fn test_file_storage_not_found() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        let result = block_on(storage.get("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_file_storage_list_skips_garbage() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        block_on(storage.put(&record("doc1", 1))).unwrap();
        block_on(storage.put(&record("doc2", 2))).unwrap();
        fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();

        let ids: Vec<String> = block_on(storage.list())
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, ["doc2", "doc1"]);
    }

    #[test]
    fn test_file_storage_delete() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        block_on(storage.put(&record("test", 1))).unwrap();
        assert!(block_on(storage.exists("test")).unwrap());

        block_on(storage.delete("test")).unwrap();
        assert!(!block_on(storage.exists("test")).unwrap());
    }

    #[test]
    fn test_file_storage_sanitizes_id() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        let tricky = record("../doc:with*special", 3);
        block_on(storage.put(&tricky)).unwrap();

        let loaded = block_on(storage.get("../doc:with*special")).unwrap();
        assert_eq!(loaded.id, tricky.id);
        assert!(dir.path().join("_2e_2e_2fdoc_3awith_2aspecial.json").exists());
    }

    #[test]
    fn test_file_storage_ids_do_not_collide() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        block_on(storage.put(&record("a/b", 1))).unwrap();
        block_on(storage.put(&record("a_b", 2))).unwrap();
        block_on(storage.put(&record("a\u{e9}", 3))).unwrap();

        assert_eq!(block_on(storage.get("a/b")).unwrap().id, "a/b");
        assert_eq!(block_on(storage.get("a_b")).unwrap().id, "a_b");
        assert_eq!(block_on(storage.list()).unwrap().len(), 3);
        assert_eq!(encode_id("a\u{e9}"), "a_c3_a9");
    }
}
