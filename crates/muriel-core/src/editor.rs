//! Editor state container.
//!
//! [`Editor`] owns the element list, viewport, selection, history and the
//! rendered surface. All element-list writes funnel through
//! [`Editor::set_elements`], tagged with an [`EditOrigin`] so history can
//! tell user edits from its own restores.

use crate::catalog::Catalog;
use crate::config::EditorConfig;
use crate::decorations::{self, SheetLayout};
use crate::element::{self, Element, ElementList, empty_list, same_snapshot};
use crate::export::{self, ExportSnapshot};
use crate::history::{EditOrigin, History};
use crate::input::{Command, KeyEvent, Modifiers, MouseButton, PointerEvent, is_pan_gesture};
use crate::materialize::{MaterializeOutcome, MaterializeRequest};
use crate::placement::{self, DropError, DropPayload, IdGenerator};
use crate::reconcile::Reconciler;
use crate::selection::{Effect, HANDLE_HIT_TOLERANCE, SelectionController, Target, hit_test_handles};
use crate::snap::{snap_length, snap_to_grid};
use crate::storage::{self, DiagramDraft, DiagramRecord, Storage};
use crate::surface::{SceneSurface, Surface};
use crate::title_block::TitleBlock;
use crate::viewport::{Viewport, ViewportController, ZoomDirection};
use kurbo::{Point, Size, Vec2};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

/// Padding around the sheet when fitting it into the view, in screen px.
const FIT_PADDING: f64 = 20.0;

const UNTITLED: &str = "Untitled";

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// Transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Something observers may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    ElementsChanged { origin: EditOrigin },
    ViewportChanged,
    SelectionChanged,
    Notified(Notification),
}

/// Handle returned by [`Editor::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&EditorEvent) + Send>;

/// The schematic editor.
pub struct Editor {
    config: EditorConfig,
    catalog: Catalog,
    elements: ElementList,
    viewport: ViewportController,
    selection: SelectionController,
    history: History,
    reconciler: Reconciler,
    surface: Box<dyn Surface>,
    title_block: TitleBlock,
    diagram_id: Option<String>,
    diagram_name: String,
    ids: IdGenerator,
    requests: Vec<MaterializeRequest>,
    notifications: VecDeque<Notification>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl Editor {
    /// Create an editor drawing onto an in-memory [`SceneSurface`].
    pub fn new(config: EditorConfig, catalog: Catalog) -> Self {
        Self::with_surface(config, catalog, Box::new(SceneSurface::new()))
    }

    /// Create an editor drawing onto `surface`.
    pub fn with_surface(config: EditorConfig, catalog: Catalog, surface: Box<dyn Surface>) -> Self {
        let elements = empty_list();
        let mut editor = Self {
            viewport: ViewportController::new(config.zoom_limits()),
            history: History::new(elements.clone(), config.history_limit),
            config,
            catalog,
            elements,
            selection: SelectionController::new(),
            reconciler: Reconciler::new(),
            surface,
            title_block: TitleBlock::default(),
            diagram_id: None,
            diagram_name: UNTITLED.to_string(),
            ids: IdGenerator::new(),
            requests: Vec::new(),
            notifications: VecDeque::new(),
            listeners: Vec::new(),
            next_subscription: 0,
        };
        editor.redraw_decorations();
        editor
    }

    /// Use a fixed id generator, e.g. for reproducible ids.
    pub fn set_id_generator(&mut self, ids: IdGenerator) {
        self.ids = ids;
    }

    // --- Getters ---

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn elements(&self) -> &ElementList {
        &self.elements
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        element::find(&self.elements, id)
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport.viewport()
    }

    pub fn selection(&self) -> &[String] {
        self.selection.selection()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn title_block(&self) -> &TitleBlock {
        &self.title_block
    }

    pub fn surface(&self) -> &dyn Surface {
        self.surface.as_ref()
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn diagram_id(&self) -> Option<&str> {
        self.diagram_id.as_deref()
    }

    pub fn diagram_name(&self) -> &str {
        &self.diagram_name
    }

    pub fn set_diagram_name(&mut self, name: impl Into<String>) {
        self.diagram_name = name.into();
    }

    // --- Observers ---

    /// Register a listener for editor events.
    pub fn subscribe(&mut self, listener: impl FnMut(&EditorEvent) + Send + 'static) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    fn emit(&mut self, event: EditorEvent) {
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }

    fn notify(&mut self, level: NotificationLevel, message: String) {
        match level {
            NotificationLevel::Info => log::info!("{}", message),
            NotificationLevel::Error => log::error!("{}", message),
        }
        let notification = Notification { level, message };
        self.notifications.push_back(notification.clone());
        self.emit(EditorEvent::Notified(notification));
    }

    /// Drain pending notifications, oldest first.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    // --- The single element-list write path ---

    /// Replace the element list. `User` writes are recorded for undo,
    /// `History` writes are not, and `Load` makes `elements` the new initial
    /// state.
    pub fn set_elements(&mut self, elements: ElementList, origin: EditOrigin) {
        if origin != EditOrigin::Load && same_snapshot(&self.elements, &elements) {
            return;
        }
        self.elements = elements;
        self.history.observe(&self.elements, origin);

        if self.selection.retain_existing(&self.elements) {
            self.emit(EditorEvent::SelectionChanged);
        }
        self.reconcile();
        self.emit(EditorEvent::ElementsChanged { origin });
    }

    fn reconcile(&mut self) {
        // Requests from older generations would be rejected anyway.
        self.requests = self
            .reconciler
            .reconcile(&self.elements, &self.catalog, self.surface.as_mut());
    }

    fn replace_element(&mut self, updated: Element) -> bool {
        match element::replaced(&self.elements, updated) {
            Some(next) => {
                self.set_elements(next, EditOrigin::User);
                true
            }
            None => false,
        }
    }

    // --- Named actions ---

    /// Place a catalog symbol at a world point. Returns the new element id.
    pub fn place_element(&mut self, symbol_id: &str, world: Point) -> Option<String> {
        let Some(symbol) = self.catalog.get(symbol_id) else {
            log::warn!("Cannot place unknown symbol {}", symbol_id);
            return None;
        };
        let payload = DropPayload {
            id: symbol.id.clone(),
            properties: symbol.properties.clone(),
        };
        Some(self.place_payload(&payload, world))
    }

    fn place_payload(&mut self, payload: &DropPayload, world: Point) -> String {
        let id = self.ids.next_id(&payload.id);
        let element = placement::element_for_drop(id.clone(), payload, world, self.config.grid_size);
        log::debug!("Placing {} at {:?}", id, element.position);
        let next = element::appended(&self.elements, element);
        self.set_elements(next, EditOrigin::User);
        id
    }

    /// Handle a drop of a serialized symbol definition at a screen point.
    pub fn drop_symbol(&mut self, data: &str, screen: Point) -> Result<String, DropError> {
        let payload = DropPayload::parse(data)?;
        let world = self.viewport.screen_to_world(screen);
        Ok(self.place_payload(&payload, world))
    }

    /// Snapped world position a drop at `screen` would land on.
    pub fn drop_preview(&self, screen: Point) -> Point {
        placement::ghost_position(self.viewport.screen_to_world(screen), self.config.grid_size)
    }

    /// Move an element; the position is snapped to the grid.
    pub fn move_element(&mut self, id: &str, position: Point) -> bool {
        let position = snap_to_grid(position, self.config.grid_size);
        let Some(current) = self.element(id) else {
            return false;
        };
        if current.position == position {
            return false;
        }
        let updated = current.with_position(position);
        self.replace_element(updated)
    }

    /// Resize an element; each side is snapped to at least one grid unit.
    pub fn resize_element(&mut self, id: &str, size: Size) -> bool {
        let grid = self.config.grid_size;
        let size = Size::new(snap_length(size.width, grid), snap_length(size.height, grid));
        let Some(current) = self.element(id) else {
            return false;
        };
        if current.width == Some(size.width) && current.height == Some(size.height) {
            return false;
        }
        let updated = current.with_size(size);
        self.replace_element(updated)
    }

    /// Set an element's rotation in degrees.
    pub fn rotate_element(&mut self, id: &str, degrees: f64) -> bool {
        let Some(current) = self.element(id) else {
            return false;
        };
        if current.rotation == degrees || !degrees.is_finite() {
            return false;
        }
        let updated = current.with_rotation(degrees);
        self.replace_element(updated)
    }

    pub fn set_element_property(&mut self, id: &str, key: &str, value: serde_json::Value) -> bool {
        let Some(current) = self.element(id) else {
            return false;
        };
        if current.properties.get(key) == Some(&value) {
            return false;
        }
        let mut updated = current.clone();
        updated.properties.insert(key.to_string(), value);
        self.replace_element(updated)
    }

    pub fn delete_element(&mut self, id: &str) -> bool {
        match element::removed(&self.elements, id) {
            Some(next) => {
                self.set_elements(next, EditOrigin::User);
                true
            }
            None => false,
        }
    }

    /// Delete every selected element as one edit. Returns how many went.
    pub fn delete_selected(&mut self) -> usize {
        let selected: Vec<String> = self.selection.selection().to_vec();
        if selected.is_empty() {
            return 0;
        }
        self.cancel_gesture();
        let next: Vec<Element> = self
            .elements
            .iter()
            .filter(|e| !selected.contains(&e.id))
            .cloned()
            .collect();
        let count = self.elements.len() - next.len();
        if count > 0 {
            self.set_elements(Arc::new(next), EditOrigin::User);
        }
        count
    }

    pub fn undo(&mut self) -> bool {
        self.cancel_gesture();
        match self.history.undo() {
            Some(snapshot) => {
                self.set_elements(snapshot, EditOrigin::History);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        self.cancel_gesture();
        match self.history.redo() {
            Some(snapshot) => {
                self.set_elements(snapshot, EditOrigin::History);
                true
            }
            None => false,
        }
    }

    /// Select one element. Unknown ids are ignored.
    pub fn select(&mut self, id: &str) -> bool {
        if self.element(id).is_none() {
            return false;
        }
        let changed = self.selection.select(id);
        if changed {
            self.emit(EditorEvent::SelectionChanged);
        }
        changed
    }

    pub fn clear_selection(&mut self) -> bool {
        self.cancel_gesture();
        let changed = self.selection.clear_selection();
        if changed {
            self.emit(EditorEvent::SelectionChanged);
        }
        changed
    }

    pub fn zoom_at(&mut self, screen: Point, direction: ZoomDirection) {
        self.viewport.zoom_at(screen, direction);
        self.emit(EditorEvent::ViewportChanged);
    }

    /// Zoom in one step about the centre of the view.
    pub fn zoom_in(&mut self) {
        self.zoom_at(self.view_center(), ZoomDirection::In);
    }

    /// Zoom out one step about the centre of the view.
    pub fn zoom_out(&mut self) {
        self.zoom_at(self.view_center(), ZoomDirection::Out);
    }

    fn view_center(&self) -> Point {
        let size = self.surface.viewport_size();
        Point::new(size.width / 2.0, size.height / 2.0)
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.viewport.pan_by(delta);
        self.emit(EditorEvent::ViewportChanged);
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
        self.emit(EditorEvent::ViewportChanged);
    }

    /// Zoom and pan so the whole sheet is visible.
    pub fn fit_sheet(&mut self) {
        let view = self.surface.viewport_size();
        self.viewport
            .fit_to_bounds(self.config.sheet.rect(), view, FIT_PADDING);
        self.emit(EditorEvent::ViewportChanged);
    }

    pub fn grid_visible(&self) -> bool {
        self.config.grid_visible
    }

    pub fn set_grid_visible(&mut self, visible: bool) {
        if self.config.grid_visible != visible {
            self.config.grid_visible = visible;
            self.redraw_decorations();
        }
    }

    pub fn set_viewport_size(&mut self, size: Size) {
        self.surface.set_viewport_size(size);
        self.redraw_decorations();
    }

    pub fn set_title_block(&mut self, title_block: TitleBlock) {
        self.title_block = title_block;
        self.redraw_decorations();
    }

    /// Swap the catalog and rebuild every drawable against it.
    pub fn set_catalog(&mut self, catalog: Catalog) {
        self.catalog = catalog;
        self.reconciler.invalidate(self.surface.as_mut());
        self.reconcile();
        self.redraw_decorations();
    }

    /// Load a catalog file. On failure the editor keeps running with an
    /// empty catalog and a notification is queued.
    pub fn load_catalog(&mut self, path: &Path) -> bool {
        match Catalog::load(path) {
            Ok(catalog) => {
                log::info!("Loaded {} symbols from {}", catalog.len(), path.display());
                self.set_catalog(catalog);
                true
            }
            Err(e) => {
                self.set_catalog(Catalog::new());
                self.notify(NotificationLevel::Error, format!("Symbol catalog unavailable: {}", e));
                false
            }
        }
    }

    fn redraw_decorations(&mut self) {
        let layout = SheetLayout {
            sheet: self.config.sheet,
            grid_size: self.config.grid_size,
            major_every: self.config.major_grid_every,
            grid_visible: self.config.grid_visible,
            title_block: &self.title_block,
        };
        self.surface.set_decorations(decorations::build(&layout));
    }

    // --- Pointer and keyboard ---

    fn target_at(&self, world: Point) -> Target {
        let tolerance = HANDLE_HIT_TOLERANCE / self.viewport.viewport().zoom;
        for id in self.selection.selection() {
            let Some(handle) = self.reconciler.handle(id) else {
                continue;
            };
            let Some(drawable) = self.surface.get(handle) else {
                continue;
            };
            if let Some(corner) = hit_test_handles(&drawable.placement, world, tolerance) {
                return Target::ResizeHandle {
                    element_id: id.clone(),
                    handle,
                    placement: drawable.placement,
                    corner,
                };
            }
        }

        self.surface
            .hit_test(world)
            .and_then(|handle| {
                self.surface.get(handle).map(|drawable| Target::Drawable {
                    element_id: drawable.element_id.clone(),
                    handle,
                    placement: drawable.placement,
                })
            })
            .unwrap_or(Target::Background)
    }

    pub fn pointer_down(&mut self, screen: Point, button: MouseButton, modifiers: Modifiers) {
        let world = self.viewport.screen_to_world(screen);
        let pan = is_pan_gesture(button, modifiers);
        let target = if pan { Target::Background } else { self.target_at(world) };
        for effect in self.selection.pointer_down(world, screen, target, pan) {
            self.apply_effect(effect);
        }
    }

    pub fn pointer_move(&mut self, screen: Point) {
        let world = self.viewport.screen_to_world(screen);
        if let Some(effect) = self
            .selection
            .pointer_move(world, screen, self.config.grid_size)
        {
            self.apply_effect(effect);
        }
    }

    pub fn pointer_up(&mut self, _screen: Point) {
        if let Some(effect) = self.selection.pointer_up(self.config.grid_size) {
            self.apply_effect(effect);
        }
    }

    /// Wheel input zooms about the pointer.
    pub fn wheel(&mut self, screen: Point, delta_y: f64) {
        self.zoom_at(screen, ZoomDirection::from_wheel_delta(delta_y));
    }

    /// Dispatch a pointer event.
    pub fn handle_pointer_event(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down {
                position,
                button,
                modifiers,
            } => self.pointer_down(position, button, modifiers),
            PointerEvent::Move { position } => self.pointer_move(position),
            PointerEvent::Up { position, .. } => self.pointer_up(position),
            PointerEvent::Wheel { position, delta } => self.wheel(position, delta.y),
        }
    }

    /// Handle a key press. Returns true if it was bound to a command.
    pub fn key_down(&mut self, event: KeyEvent) -> bool {
        let Some(command) = event.command() else {
            return false;
        };
        match command {
            Command::DeleteSelection => {
                self.delete_selected();
            }
            Command::Undo => {
                self.undo();
            }
            Command::Redo => {
                self.redo();
            }
            Command::ResetView => self.reset_view(),
            Command::ClearSelection => {
                self.clear_selection();
            }
        }
        true
    }

    fn cancel_gesture(&mut self) {
        if let Some(effect) = self.selection.cancel() {
            self.apply_effect(effect);
        }
    }

    fn apply_effect(&mut self, effect: Effect) {
        match effect {
            Effect::SelectionChanged => self.emit(EditorEvent::SelectionChanged),
            Effect::Pan(delta) => self.pan_by(delta),
            Effect::Preview {
                handle,
                placement,
                scale,
            } => {
                self.surface.update(handle, placement);
                self.surface.set_scale(handle, scale);
            }
            Effect::CommitMove {
                element_id,
                position,
            } => {
                self.move_element(&element_id, position);
            }
            Effect::CommitResize { element_id, size } => {
                self.resize_element(&element_id, size);
            }
        }
    }

    // --- Materialization plumbing ---

    /// Hand out the materializations the last reconcile asked for.
    pub fn take_materialize_requests(&mut self) -> Vec<MaterializeRequest> {
        std::mem::take(&mut self.requests)
    }

    /// Deliver a finished materialization. Stale or post-teardown outcomes
    /// are dropped; returns whether it was applied.
    pub fn complete_materialization(&mut self, outcome: MaterializeOutcome) -> bool {
        self.reconciler.apply(outcome, self.surface.as_mut())
    }

    /// Resolve every outstanding request in place. Returns how many were
    /// applied.
    pub fn flush_materializations(&mut self) -> usize {
        let mut applied = 0;
        for request in self.take_materialize_requests() {
            if self.complete_materialization(request.resolve()) {
                applied += 1;
            }
        }
        applied
    }

    /// Dispose every drawable. Materializations finishing afterwards are
    /// ignored.
    pub fn teardown(&mut self) {
        self.selection.cancel();
        self.reconciler.dispose(self.surface.as_mut());
        self.surface.clear();
        self.requests.clear();
        log::debug!("Editor torn down");
    }

    // --- Export ---

    /// Vector snapshot of the sheet: border, title block and every element,
    /// without the grid. Outstanding materializations are resolved first.
    pub fn export_snapshot(&mut self) -> ExportSnapshot {
        self.flush_materializations();
        let layout = SheetLayout {
            sheet: self.config.sheet,
            grid_size: self.config.grid_size,
            major_every: self.config.major_grid_every,
            grid_visible: false,
            title_block: &self.title_block,
        };
        let decorations = decorations::build(&layout);
        let drawables = self.surface.drawables();
        let drawables: Vec<_> = drawables.into_iter().map(|(_, d)| d).collect();
        export::render(&self.config.sheet, &decorations, &drawables)
    }

    // --- Persistence ---

    /// Current diagram as a save draft.
    pub fn draft(&self) -> DiagramDraft {
        DiagramDraft {
            id: self.diagram_id.clone(),
            name: self.diagram_name.clone(),
            elements: self.elements.to_vec(),
            title_block: self.title_block.clone(),
            viewport: self.viewport.viewport(),
        }
    }

    /// Save the current diagram. Failures are reported as a notification.
    pub async fn save(&mut self, storage: &dyn Storage) -> Option<DiagramRecord> {
        match storage::save_diagram(storage, self.draft()).await {
            Ok(record) => {
                self.diagram_id = Some(record.id.clone());
                self.notify(NotificationLevel::Info, format!("Saved \"{}\"", record.name));
                Some(record)
            }
            Err(e) => {
                self.notify(NotificationLevel::Error, format!("Failed to save diagram: {}", e));
                None
            }
        }
    }

    /// Open a stored diagram, replacing the current one. On failure the
    /// editor is left untouched.
    pub async fn open(&mut self, storage: &dyn Storage, id: &str) -> bool {
        match storage.get(id).await {
            Ok(record) => {
                self.load_record(record);
                true
            }
            Err(e) => {
                self.notify(NotificationLevel::Error, format!("Failed to open diagram: {}", e));
                false
            }
        }
    }

    /// Delete a stored diagram. Deleting the open diagram detaches it so the
    /// next save creates a new record.
    pub async fn delete_diagram(&mut self, storage: &dyn Storage, id: &str) -> bool {
        match storage.delete(id).await {
            Ok(()) => {
                if self.diagram_id.as_deref() == Some(id) {
                    self.diagram_id = None;
                }
                true
            }
            Err(e) => {
                self.notify(NotificationLevel::Error, format!("Failed to delete diagram: {}", e));
                false
            }
        }
    }

    /// Stored diagrams, newest first. Failures yield an empty list and a
    /// notification.
    pub async fn list_diagrams(&mut self, storage: &dyn Storage) -> Vec<DiagramRecord> {
        match storage.list().await {
            Ok(records) => records,
            Err(e) => {
                self.notify(NotificationLevel::Error, format!("Failed to list diagrams: {}", e));
                Vec::new()
            }
        }
    }

    /// Replace the editor contents with a saved record.
    pub fn load_record(&mut self, record: DiagramRecord) {
        self.cancel_gesture();
        if self.selection.clear_selection() {
            self.emit(EditorEvent::SelectionChanged);
        }
        self.diagram_id = Some(record.id);
        self.diagram_name = record.name;
        self.title_block = record.title_block;
        self.viewport.set(record.viewport);
        self.redraw_decorations();
        self.set_elements(Arc::new(record.elements), EditOrigin::Load);
        self.emit(EditorEvent::ViewportChanged);
    }

    /// Start an empty, unsaved diagram.
    pub fn new_diagram(&mut self) {
        self.load_record(DiagramRecord {
            id: String::new(),
            name: UNTITLED.to_string(),
            elements: Vec::new(),
            title_block: TitleBlock::default(),
            viewport: Viewport::default(),
            created_at: 0,
            updated_at: 0,
        });
        self.diagram_id = None;
    }
}
