//! Placed symbol instances and the immutable element list.

use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Open key/value property bag, seeded from a symbol's defaults.
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// One placed instance of a symbol on the sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Unique, stable for the element's lifetime.
    pub id: String,
    /// Key into the symbol catalog.
    pub symbol_id: String,
    /// World-space centre of the element. Grid-aligned after any move.
    pub position: Point,
    /// Rotation in degrees.
    #[serde(default)]
    pub rotation: f64,
    /// Width override, present only after a resize.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Height override, present only after a resize.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default)]
    pub properties: Properties,
}

impl Element {
    /// Create an element with no size override and no rotation.
    pub fn new(id: impl Into<String>, symbol_id: impl Into<String>, position: Point) -> Self {
        Self {
            id: id.into(),
            symbol_id: symbol_id.into(),
            position,
            rotation: 0.0,
            width: None,
            height: None,
            properties: Properties::new(),
        }
    }

    /// Size to draw at: the override when present, else the symbol's
    /// natural size.
    pub fn size_or(&self, natural: Size) -> Size {
        Size::new(
            self.width.unwrap_or(natural.width),
            self.height.unwrap_or(natural.height),
        )
    }

    /// Copy with a new position.
    pub fn with_position(&self, position: Point) -> Self {
        Self {
            position,
            ..self.clone()
        }
    }

    /// Copy with absolute width/height overrides.
    pub fn with_size(&self, size: Size) -> Self {
        Self {
            width: Some(size.width),
            height: Some(size.height),
            ..self.clone()
        }
    }

    /// Copy with a new rotation.
    pub fn with_rotation(&self, rotation: f64) -> Self {
        Self {
            rotation,
            ..self.clone()
        }
    }
}

/// The whole element list as a shared, immutable value.
///
/// Every edit builds a new list, so `Arc::ptr_eq` tells changed snapshots
/// apart from unchanged ones.
pub type ElementList = Arc<Vec<Element>>;

/// An empty element list.
pub fn empty_list() -> ElementList {
    Arc::new(Vec::new())
}

/// Find an element by id.
pub fn find<'a>(list: &'a [Element], id: &str) -> Option<&'a Element> {
    list.iter().find(|element| element.id == id)
}

/// New list with `element` appended.
pub fn appended(list: &[Element], element: Element) -> ElementList {
    let mut next = Vec::with_capacity(list.len() + 1);
    next.extend_from_slice(list);
    next.push(element);
    Arc::new(next)
}

/// New list with the element carrying `updated.id` replaced.
/// Returns `None` if no such element exists.
pub fn replaced(list: &[Element], updated: Element) -> Option<ElementList> {
    let index = list.iter().position(|element| element.id == updated.id)?;
    let mut next = list.to_vec();
    next[index] = updated;
    Some(Arc::new(next))
}

/// New list without the element `id`. Returns `None` if it was absent.
pub fn removed(list: &[Element], id: &str) -> Option<ElementList> {
    if !list.iter().any(|element| element.id == id) {
        return None;
    }
    Some(Arc::new(
        list.iter()
            .filter(|element| element.id != id)
            .cloned()
            .collect(),
    ))
}

/// Positional identity check for two snapshots.
pub fn same_snapshot(a: &ElementList, b: &ElementList) -> bool {
    Arc::ptr_eq(a, b)
}
