//! Drag-and-drop placement of new elements.

use crate::element::{Element, Properties};
use crate::snap::snap_to_grid;
use kurbo::Point;
use serde::Deserialize;
use thiserror::Error;

/// MIME type hosts attach the dragged symbol under.
pub const DROP_MIME_TYPE: &str = "application/json";

#[derive(Debug, Error)]
pub enum DropError {
    #[error("Invalid drop payload: {0}")]
    InvalidPayload(String),
}

/// The parts of a dragged symbol definition placement needs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropPayload {
    pub id: String,
    #[serde(default)]
    pub properties: Properties,
}

impl DropPayload {
    /// Parse a serialized symbol definition. Extra fields are ignored.
    pub fn parse(data: &str) -> Result<Self, DropError> {
        let payload: DropPayload =
            serde_json::from_str(data).map_err(|e| DropError::InvalidPayload(e.to_string()))?;
        if payload.id.trim().is_empty() {
            return Err(DropError::InvalidPayload("empty symbol id".to_string()));
        }
        Ok(payload)
    }
}

/// Session-unique element ids of the form `{symbol}-{session}-{n}`.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    session: String,
    counter: u64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        Self::with_session(&uuid[..8])
    }
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed session tag.
    pub fn with_session(session: &str) -> Self {
        Self {
            session: session.to_string(),
            counter: 0,
        }
    }

    pub fn next_id(&mut self, symbol_id: &str) -> String {
        self.counter += 1;
        format!("{}-{}-{}", symbol_id, self.session, self.counter)
    }
}

/// Where the drop ghost should be shown for a pointer at `world`.
pub fn ghost_position(world: Point, grid_size: f64) -> Point {
    snap_to_grid(world, grid_size)
}

/// Build the element a drop at `world` creates: snapped position, no
/// rotation, properties cloned from the symbol defaults.
pub fn element_for_drop(id: String, payload: &DropPayload, world: Point, grid_size: f64) -> Element {
    Element {
        properties: payload.properties.clone(),
        ..Element::new(id, payload.id.clone(), snap_to_grid(world, grid_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_symbol_definition() {
        let data = json!({
            "id": "outlet-single",
            "name": "Single outlet",
            "category": "outlets",
            "svg": "<svg/>",
            "connectionPoints": [],
            "properties": {"rating": "16A"},
            "dimensions": {"width": 40, "height": 40}
        })
        .to_string();
        let payload = DropPayload::parse(&data).unwrap();
        assert_eq!(payload.id, "outlet-single");
        assert_eq!(payload.properties["rating"], "16A");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            DropPayload::parse("text/plain"),
            Err(DropError::InvalidPayload(_))
        ));
        assert!(DropPayload::parse(r#"{"name": "no id"}"#).is_err());
        assert!(DropPayload::parse(r#"{"id": "  "}"#).is_err());
    }

    #[test]
    fn test_ids_are_unique() {
        let mut ids = IdGenerator::with_session("abcd1234");
        assert_eq!(ids.next_id("motor"), "motor-abcd1234-1");
        assert_eq!(ids.next_id("motor"), "motor-abcd1234-2");
        let mut other = IdGenerator::new();
        assert_ne!(other.next_id("motor"), "motor-abcd1234-1");
    }

    #[test]
    fn test_drop_snaps_and_clones_properties() {
        let payload = DropPayload::parse(r#"{"id":"outlet-single","properties":{"ways":2}}"#).unwrap();
        let element = element_for_drop("e1".to_string(), &payload, Point::new(123.0, 47.0), 10.0);
        assert_eq!(element.position, Point::new(120.0, 50.0));
        assert_eq!(element.rotation, 0.0);
        assert_eq!(element.properties, payload.properties);
        assert!(element.width.is_none());
    }

    #[test]
    fn test_ghost_is_snapped() {
        assert_eq!(ghost_position(Point::new(14.0, 26.0), 10.0), Point::new(10.0, 30.0));
    }
}
