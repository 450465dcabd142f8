//! Muriel Core Library
//!
//! Platform-agnostic editing core for the Muriel electrical schematic
//! editor: element list, grid snapping, viewport, selection and
//! manipulation, symbol materialization, render reconciliation,
//! undo/redo, persistence and vector export.

pub mod catalog;
pub mod config;
pub mod decorations;
pub mod drawable;
pub mod editor;
pub mod element;
pub mod export;
pub mod history;
pub mod input;
pub mod markup;
pub mod materialize;
pub mod placement;
pub mod reconcile;
pub mod selection;
pub mod snap;
pub mod storage;
pub mod surface;
pub mod title_block;
pub mod viewport;

pub use catalog::{Catalog, CatalogError, SymbolCategory, SymbolDefinition};
pub use config::{ConfigError, EditorConfig, SheetSize};
pub use drawable::{Drawable, Placement, Primitive};
pub use editor::{Editor, EditorEvent, Notification, NotificationLevel};
pub use element::{Element, ElementList};
pub use export::ExportSnapshot;
pub use history::{EditOrigin, History};
pub use input::{Key, KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use materialize::{MaterializeOutcome, MaterializeRequest, materialize};
pub use placement::{DropError, DropPayload};
pub use reconcile::Reconciler;
pub use snap::{GRID_SIZE, snap, snap_to_grid};
pub use storage::{DiagramDraft, DiagramRecord, Storage, StorageError, StorageResult};
pub use surface::{DrawableHandle, SceneSurface, Surface};
pub use title_block::TitleBlock;
pub use viewport::{Viewport, ViewportController, ZoomDirection};
