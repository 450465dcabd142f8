//! Storage abstraction for persisted diagrams.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use memory::MemoryStorage;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

use crate::element::Element;
use crate::title_block::TitleBlock;
use crate::viewport::Viewport;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Diagram not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// A saved diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramRecord {
    pub id: String,
    pub name: String,
    pub elements: Vec<Element>,
    #[serde(default)]
    pub title_block: TitleBlock,
    #[serde(default)]
    pub viewport: Viewport,
    /// Milliseconds since the Unix epoch.
    pub created_at: u64,
    /// Milliseconds since the Unix epoch.
    pub updated_at: u64,
}

impl DiagramRecord {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Diagram contents to save; `id` is assigned when absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagramDraft {
    pub id: Option<String>,
    pub name: String,
    pub elements: Vec<Element>,
    pub title_block: TitleBlock,
    pub viewport: Viewport,
}

/// Sort records newest first, ties broken by id for a stable order.
pub(crate) fn sort_newest_first(records: &mut [DiagramRecord]) {
    records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
}

/// Trait for diagram storage backends.
///
/// Note: On native platforms, implementations must be Send + Sync.
/// On WASM, these bounds are relaxed since it's single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait Storage: Send + Sync {
    /// Insert or replace a record under its id.
    fn put(&self, record: &DiagramRecord) -> BoxFuture<'_, StorageResult<()>>;

    /// Fetch a record.
    fn get(&self, id: &str) -> BoxFuture<'_, StorageResult<DiagramRecord>>;

    /// Delete a record. Deleting a missing id is not an error.
    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// All records, most recently updated first.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<DiagramRecord>>>;

    /// Check if a record exists.
    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>>;
}

/// Trait for diagram storage backends (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait Storage {
    /// Insert or replace a record under its id.
    fn put(&self, record: &DiagramRecord) -> BoxFuture<'_, StorageResult<()>>;

    /// Fetch a record.
    fn get(&self, id: &str) -> BoxFuture<'_, StorageResult<DiagramRecord>>;

    /// Delete a record. Deleting a missing id is not an error.
    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// All records, most recently updated first.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<DiagramRecord>>>;

    /// Check if a record exists.
    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>>;
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Save a draft. A missing id gets a fresh one; an existing record keeps
/// its `created_at`.
pub async fn save_diagram(storage: &dyn Storage, draft: DiagramDraft) -> StorageResult<DiagramRecord> {
    let id = draft
        .id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let now = now_millis();

    let created_at = match storage.get(&id).await {
        Ok(existing) => existing.created_at,
        Err(StorageError::NotFound(_)) => now,
        Err(e) => return Err(e),
    };

    let record = DiagramRecord {
        id,
        name: draft.name,
        elements: draft.elements,
        title_block: draft.title_block,
        viewport: draft.viewport,
        created_at,
        updated_at: now.max(created_at),
    };
    storage.put(&record).await?;
    log::debug!("Saved diagram {} ({} elements)", record.id, record.elements.len());
    Ok(record)
}
