//! Non-element drawables: grid, sheet border, margin frame and title block.

use crate::config::SheetSize;
use crate::drawable::{Color, Primitive, Style, TextAnchor};
use crate::snap::is_major_line;
use crate::title_block::TitleBlock;
use kurbo::{BezPath, Point, Rect, Shape as _};

/// Title block outer size.
pub const TITLE_BLOCK_WIDTH: f64 = 340.0;
pub const TITLE_BLOCK_HEIGHT: f64 = 80.0;
/// Column widths, left to right. Sums to [`TITLE_BLOCK_WIDTH`].
pub const TITLE_BLOCK_COLUMNS: [f64; 5] = [56.0, 80.0, 90.0, 56.0, 58.0];

const MINOR_GRID: Color = Color::new(230, 230, 230, 255);
const MAJOR_GRID: Color = Color::new(200, 200, 200, 255);
const CAPTION: Color = Color::new(110, 110, 110, 255);
const TOLERANCE: f64 = 0.1;

/// Which part of the sheet a decoration belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    MinorGrid,
    MajorGrid,
    Border,
    Margin,
    TitleBlock,
}

impl Layer {
    pub fn is_grid(self) -> bool {
        matches!(self, Layer::MinorGrid | Layer::MajorGrid)
    }
}

/// One decoration primitive in world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoration {
    pub layer: Layer,
    pub primitive: Primitive,
}

/// Inputs the decorations depend on.
#[derive(Debug, Clone, Copy)]
pub struct SheetLayout<'a> {
    pub sheet: SheetSize,
    pub grid_size: f64,
    pub major_every: u32,
    pub grid_visible: bool,
    pub title_block: &'a TitleBlock,
}

/// Build every decoration for a sheet, grid first so it sits underneath.
pub fn build(layout: &SheetLayout) -> Vec<Decoration> {
    let mut out = Vec::new();
    if layout.grid_visible {
        grid(layout, &mut out);
    }

    out.push(Decoration {
        layer: Layer::Border,
        primitive: Primitive::path(
            layout.sheet.rect().to_path(TOLERANCE),
            Style::stroked(Color::BLACK, 2.0),
        ),
    });
    out.push(Decoration {
        layer: Layer::Margin,
        primitive: Primitive::path(
            layout.sheet.inner_rect().to_path(TOLERANCE),
            Style::stroked(Color::BLACK, 1.0).with_dash(6.0, 4.0),
        ),
    });

    title_block(&layout.sheet, layout.title_block, &mut out);
    out
}

fn grid(layout: &SheetLayout, out: &mut Vec<Decoration>) {
    let step = layout.grid_size;
    if step <= 0.0 {
        return;
    }
    let (width, height) = (layout.sheet.width, layout.sheet.height);
    let mut minor = BezPath::new();
    let mut major = BezPath::new();

    let columns = (width / step).floor() as u32;
    for index in 0..=columns {
        let x = index as f64 * step;
        let path = if is_major_line(index, layout.major_every) { &mut major } else { &mut minor };
        path.move_to((x, 0.0));
        path.line_to((x, height));
    }
    let rows = (height / step).floor() as u32;
    for index in 0..=rows {
        let y = index as f64 * step;
        let path = if is_major_line(index, layout.major_every) { &mut major } else { &mut minor };
        path.move_to((0.0, y));
        path.line_to((width, y));
    }

    out.push(Decoration {
        layer: Layer::MinorGrid,
        primitive: Primitive::path(minor, Style::stroked(MINOR_GRID, 0.5)),
    });
    out.push(Decoration {
        layer: Layer::MajorGrid,
        primitive: Primitive::path(major, Style::stroked(MAJOR_GRID, 1.0)),
    });
}

/// World rectangle of the title block: bottom right, inside the margin.
pub fn title_block_rect(sheet: &SheetSize) -> Rect {
    let inner = sheet.inner_rect();
    Rect::new(
        inner.x1 - TITLE_BLOCK_WIDTH,
        inner.y1 - TITLE_BLOCK_HEIGHT,
        inner.x1,
        inner.y1,
    )
}

fn text(origin: Point, content: &str, font_size: f64, bold: bool, color: Color) -> Primitive {
    Primitive::Text {
        origin,
        content: content.to_string(),
        font_size,
        bold,
        anchor: TextAnchor::Start,
        color,
    }
}

fn title_block(sheet: &SheetSize, block: &TitleBlock, out: &mut Vec<Decoration>) {
    let frame = title_block_rect(sheet);
    let row = TITLE_BLOCK_HEIGHT / 2.0;
    let mut push = |primitive| {
        out.push(Decoration {
            layer: Layer::TitleBlock,
            primitive,
        })
    };

    let mut rules = frame.to_path(TOLERANCE);
    let mut x = frame.x0;
    for width in &TITLE_BLOCK_COLUMNS[..TITLE_BLOCK_COLUMNS.len() - 1] {
        x += width;
        rules.move_to((x, frame.y0));
        rules.line_to((x, frame.y1));
    }
    // The logo column spans both rows.
    rules.move_to((frame.x0 + TITLE_BLOCK_COLUMNS[0], frame.y0 + row));
    rules.line_to((frame.x1, frame.y0 + row));
    push(Primitive::path(
        rules,
        Style::stroked(Color::BLACK, 1.0).with_fill(Color::WHITE),
    ));

    push(Primitive::Text {
        origin: Point::new(frame.x0 + TITLE_BLOCK_COLUMNS[0] / 2.0, frame.y0 + row + 4.0),
        content: "LOGO".to_string(),
        font_size: 10.0,
        bold: true,
        anchor: TextAnchor::Middle,
        color: CAPTION,
    });

    let cells: [[(&str, &str, &str); 2]; 4] = [
        [
            ("Organisation", &block.company, "<Org>"),
            ("Designer", &block.designer, "<Name>"),
        ],
        [
            ("Project", &block.project, "<Project>"),
            ("Title", &block.drawing_title, "<Title>"),
        ],
        [
            ("Date", &block.date, "<Date>"),
            ("Scale", &block.scale, "1:1"),
        ],
        [
            ("Sheet", "", "1 / 1"),
            ("Revision", &block.revision, "A"),
        ],
    ];

    let mut left = frame.x0 + TITLE_BLOCK_COLUMNS[0];
    for (column, rows) in cells.iter().enumerate() {
        for (index, (caption, value, placeholder)) in rows.iter().enumerate() {
            let top = frame.y0 + index as f64 * row;
            push(text(Point::new(left + 4.0, top + 10.0), caption, 7.0, false, CAPTION));
            push(text(
                Point::new(left + 4.0, top + 27.0),
                TitleBlock::display(value, placeholder),
                10.0,
                index == 1 && column == 1,
                Color::BLACK,
            ));
        }
        left += TITLE_BLOCK_COLUMNS[column + 1];
    }

    if !block.details.trim().is_empty() {
        let title_left = frame.x0 + TITLE_BLOCK_COLUMNS[0] + TITLE_BLOCK_COLUMNS[1];
        push(text(
            Point::new(title_left + 4.0, frame.y1 - 3.0),
            &block.details,
            6.0,
            false,
            CAPTION,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(block: &TitleBlock, grid_visible: bool) -> SheetLayout<'_> {
        SheetLayout {
            sheet: SheetSize::A3,
            grid_size: 10.0,
            major_every: 5,
            grid_visible,
            title_block: block,
        }
    }

    fn texts(decorations: &[Decoration]) -> Vec<String> {
        decorations
            .iter()
            .filter_map(|d| match &d.primitive {
                Primitive::Text { content, .. } => Some(content.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_columns_fill_block() {
        let total: f64 = TITLE_BLOCK_COLUMNS.iter().sum();
        assert!((total - TITLE_BLOCK_WIDTH).abs() < f64::EPSILON);
    }

    #[test]
    fn test_title_block_inside_margin() {
        let rect = title_block_rect(&SheetSize::A3);
        assert!((rect.x1 - 1120.0).abs() < f64::EPSILON);
        assert!((rect.y1 - 560.0).abs() < f64::EPSILON);
        assert!((rect.width() - 340.0).abs() < f64::EPSILON);
        assert!((rect.height() - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_grid_toggle() {
        let block = TitleBlock::default();
        let with_grid = build(&layout(&block, true));
        let without = build(&layout(&block, false));
        assert!(with_grid.iter().any(|d| d.layer == Layer::MajorGrid));
        assert!(with_grid.iter().any(|d| d.layer == Layer::MinorGrid));
        assert!(!without.iter().any(|d| d.layer.is_grid()));
        assert!(without.iter().any(|d| d.layer == Layer::Border));
        assert!(without.iter().any(|d| d.layer == Layer::Margin));
    }

    #[test]
    fn test_margin_is_dashed() {
        let block = TitleBlock::default();
        let decorations = build(&layout(&block, false));
        let margin = decorations.iter().find(|d| d.layer == Layer::Margin).unwrap();
        match &margin.primitive {
            Primitive::Path { style, .. } => assert!(style.dash.is_some()),
            _ => panic!("margin should be a path"),
        }
    }

    #[test]
    fn test_placeholders_and_values() {
        let block = TitleBlock {
            company: "Acme Electrical".to_string(),
            ..TitleBlock::default()
        };
        let all = texts(&build(&layout(&block, false)));
        assert!(all.contains(&"Acme Electrical".to_string()));
        assert!(all.contains(&"<Project>".to_string()));
        assert!(all.contains(&"1 / 1".to_string()));
        assert!(all.contains(&"1:1".to_string()));
        assert!(!all.contains(&"<Org>".to_string()));
    }
}
