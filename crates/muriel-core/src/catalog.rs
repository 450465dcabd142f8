//! Read-only symbol catalog.

use crate::element::Properties;
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Catalog loading errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {message}")]
    Io { path: String, message: String },
    #[error("Invalid catalog data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Symbol family. Drives the procedural fallback shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolCategory {
    Switches,
    Lights,
    Outlets,
    Protection,
    Motors,
    Distribution,
    #[serde(other)]
    Other,
}

impl SymbolCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolCategory::Switches => "switches",
            SymbolCategory::Lights => "lights",
            SymbolCategory::Outlets => "outlets",
            SymbolCategory::Protection => "protection",
            SymbolCategory::Motors => "motors",
            SymbolCategory::Distribution => "distribution",
            SymbolCategory::Other => "other",
        }
    }
}

/// Direction of a connection point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    Input,
    Output,
}

/// A wiring terminal. Parsed and kept, not yet used by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConnectionPoint {
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type")]
    pub kind: ConnectionKind,
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolDefinition {
    pub id: String,
    pub name: String,
    pub category: SymbolCategory,
    /// Vector markup for the symbol's appearance.
    #[serde(default)]
    pub svg: String,
    #[serde(default)]
    pub connection_points: Vec<ConnectionPoint>,
    /// Defaults copied into every new element's properties.
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub sans_compliant: bool,
    /// Natural size in world pixels.
    pub dimensions: Size,
}

/// Ordered list of symbol definitions with id lookup.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    symbols: Vec<Arc<SymbolDefinition>>,
    by_id: HashMap<String, usize>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from definitions. Later duplicates of an id are
    /// ignored.
    pub fn from_symbols(symbols: Vec<SymbolDefinition>) -> Self {
        let mut catalog = Self::new();
        for symbol in symbols {
            if catalog.by_id.contains_key(&symbol.id) {
                log::warn!("Duplicate symbol id in catalog: {}", symbol.id);
                continue;
            }
            catalog
                .by_id
                .insert(symbol.id.clone(), catalog.symbols.len());
            catalog.symbols.push(Arc::new(symbol));
        }
        catalog
    }

    /// Parse a JSON array of symbol records.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let symbols: Vec<SymbolDefinition> = serde_json::from_str(json)?;
        Ok(Self::from_symbols(symbols))
    }

    /// Read and parse a catalog file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&json)
    }

    /// Look up a definition.
    pub fn get(&self, id: &str) -> Option<&Arc<SymbolDefinition>> {
        self.by_id.get(id).map(|&index| &self.symbols[index])
    }

    /// Definitions in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<SymbolDefinition>> {
        self.symbols.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Case-insensitive match on name or category. An empty query returns
    /// everything.
    pub fn search(&self, query: &str) -> Vec<&Arc<SymbolDefinition>> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.symbols.iter().collect();
        }
        self.symbols
            .iter()
            .filter(|s| {
                s.name.to_lowercase().contains(&query) || s.category.as_str().contains(&query)
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE: &str = r##"[
        {
            "id": "outlet-single",
            "name": "Single Socket Outlet",
            "category": "outlets",
            "svg": "<svg width=\"40\" height=\"40\"><rect x=\"5\" y=\"5\" width=\"30\" height=\"30\"/></svg>",
            "connectionPoints": [{ "x": 20, "y": 0, "type": "input" }],
            "properties": { "rating": "16A", "ways": 1 },
            "sansCompliant": true,
            "dimensions": { "width": 40, "height": 40 }
        },
        {
            "id": "light-ceiling",
            "name": "Ceiling Light",
            "category": "lights",
            "svg": "<svg><script>alert(1)</script></svg>",
            "connectionPoints": [],
            "properties": {},
            "dimensions": { "width": 50, "height": 50 }
        },
        {
            "id": "pv-panel",
            "name": "PV Panel",
            "category": "renewables",
            "svg": "",
            "dimensions": { "width": 60, "height": 30 }
        }
    ]"##;

    #[test]
    fn test_parse_catalog() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert_eq!(catalog.len(), 3);
        let outlet = catalog.get("outlet-single").unwrap();
        assert_eq!(outlet.category, SymbolCategory::Outlets);
        assert_eq!(outlet.connection_points.len(), 1);
        assert_eq!(outlet.connection_points[0].kind, ConnectionKind::Input);
        assert_eq!(outlet.properties["rating"], "16A");
        assert!(outlet.sans_compliant);
        assert_eq!(outlet.dimensions, Size::new(40.0, 40.0));
    }

    #[test]
    fn test_unknown_category_is_other() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert_eq!(catalog.get("pv-panel").unwrap().category, SymbolCategory::Other);
    }

    #[test]
    fn test_search() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert_eq!(catalog.search("").len(), 3);
        let lights = catalog.search("LIGHT");
        assert_eq!(lights.len(), 1);
        assert_eq!(lights[0].id, "light-ceiling");
        let outlets = catalog.search("outlets");
        assert_eq!(outlets.len(), 1);
        assert!(catalog.search("transformer").is_empty());
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let mut symbols: Vec<SymbolDefinition> =
            catalog.iter().map(|s| (**s).clone()).collect();
        let mut dup = symbols[0].clone();
        dup.name = "Shadow".to_string();
        symbols.push(dup);
        let catalog = Catalog::from_symbols(symbols);
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get("outlet-single").unwrap().name, "Single Socket Outlet");
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            Catalog::from_json("{ not json"),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = Catalog::load(Path::new("/definitely/not/here.json"));
        assert!(matches!(result, Err(CatalogError::Io { .. })));
    }
}
