//! Drawing title block fields.

use serde::{Deserialize, Serialize};

/// Free-text fields printed in the sheet's title block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TitleBlock {
    pub company: String,
    pub project: String,
    pub designer: String,
    pub date: String,
    pub scale: String,
    pub drawing_title: String,
    pub details: String,
    pub revision: String,
}

impl TitleBlock {
    /// Value to print for a field, or the placeholder when it is blank.
    pub fn display<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
        if value.trim().is_empty() {
            placeholder
        } else {
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_record() {
        let block: TitleBlock =
            serde_json::from_str(r#"{ "company": "Acme", "drawingTitle": "DB-1" }"#).unwrap();
        assert_eq!(block.company, "Acme");
        assert_eq!(block.drawing_title, "DB-1");
        assert!(block.revision.is_empty());
    }

    #[test]
    fn test_display_placeholder() {
        assert_eq!(TitleBlock::display("", "<Org>"), "<Org>");
        assert_eq!(TitleBlock::display("  ", "<Org>"), "<Org>");
        assert_eq!(TitleBlock::display("Acme", "<Org>"), "Acme");
    }
}
