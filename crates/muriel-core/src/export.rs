//! Vector snapshot of the sheet for external exporters.

use crate::config::SheetSize;
use crate::decorations::Decoration;
use crate::drawable::{Drawable, Primitive, Style, TextAnchor};
use serde::{Deserialize, Serialize};
use svg::Document;
use svg::node::element as svg_element;

/// Serialized sheet plus its pixel dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSnapshot {
    pub svg: String,
    pub width: f64,
    pub height: f64,
}

/// Render the sheet, its non-grid decorations and the given drawables.
pub fn render(sheet: &SheetSize, decorations: &[Decoration], drawables: &[&Drawable]) -> ExportSnapshot {
    let mut doc = Document::new()
        .set("viewBox", format!("0 0 {} {}", sheet.width, sheet.height))
        .set("width", sheet.width)
        .set("height", sheet.height);

    doc = doc.add(
        svg_element::Rectangle::new()
            .set("x", 0)
            .set("y", 0)
            .set("width", sheet.width)
            .set("height", sheet.height)
            .set("fill", "white"),
    );

    for decoration in decorations.iter().filter(|d| !d.layer.is_grid()) {
        doc = add_primitive(doc, &decoration.primitive);
    }

    for drawable in drawables {
        let c = drawable.transform().as_coeffs();
        let mut group = svg_element::Group::new()
            .set("data-element-id", drawable.element_id.as_str())
            .set(
                "transform",
                format!("matrix({} {} {} {} {} {})", c[0], c[1], c[2], c[3], c[4], c[5]),
            );
        for primitive in &drawable.primitives {
            group = add_primitive(group, primitive);
        }
        doc = doc.add(group);
    }

    log::debug!(
        "Exported sheet {}x{} with {} drawables",
        sheet.width,
        sheet.height,
        drawables.len()
    );

    ExportSnapshot {
        svg: doc.to_string(),
        width: sheet.width,
        height: sheet.height,
    }
}

/// Anything primitives can be appended to.
trait Container: Sized {
    fn push(self, node: impl svg::Node + 'static) -> Self;
}

impl Container for Document {
    fn push(self, node: impl svg::Node + 'static) -> Self {
        self.add(node)
    }
}

impl Container for svg_element::Group {
    fn push(self, node: impl svg::Node + 'static) -> Self {
        self.add(node)
    }
}

fn add_primitive<C: Container>(container: C, primitive: &Primitive) -> C {
    match primitive {
        Primitive::Path { path, style } => {
            container.push(styled(svg_element::Path::new().set("d", path.to_svg()), style))
        }
        Primitive::Text {
            origin,
            content,
            font_size,
            bold,
            anchor,
            color,
        } => {
            let anchor = match anchor {
                TextAnchor::Start => "start",
                TextAnchor::Middle => "middle",
                TextAnchor::End => "end",
            };
            let mut text = svg_element::Text::new(content.as_str())
                .set("x", origin.x)
                .set("y", origin.y)
                .set("font-family", "sans-serif")
                .set("font-size", *font_size)
                .set("text-anchor", anchor)
                .set("fill", color.to_hex());
            if *bold {
                text = text.set("font-weight", "bold");
            }
            container.push(text)
        }
    }
}

fn styled(path: svg_element::Path, style: &Style) -> svg_element::Path {
    let mut path = match style.stroke {
        Some(color) => {
            let mut path = path
                .set("stroke", color.to_hex())
                .set("stroke-width", style.stroke_width);
            if color.a < 255 {
                path = path.set("stroke-opacity", color.opacity());
            }
            path
        }
        None => path.set("stroke", "none"),
    };
    path = match style.fill {
        Some(color) => path.set("fill", color.to_hex()),
        None => path.set("fill", "none"),
    };
    if let Some((on, off)) = style.dash {
        path = path.set("stroke-dasharray", format!("{on} {off}"));
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorations::{self, SheetLayout};
    use crate::drawable::{Placement, Source};
    use crate::title_block::TitleBlock;
    use kurbo::{Point, Rect, Shape as _, Size, Vec2};

    #[test]
    fn test_export_excludes_grid() {
        let block = TitleBlock::default();
        let decorations = decorations::build(&SheetLayout {
            sheet: SheetSize::A3,
            grid_size: 10.0,
            major_every: 5,
            grid_visible: true,
            title_block: &block,
        });
        let drawable = Drawable {
            element_id: "outlet-1".to_string(),
            primitives: vec![Primitive::path(
                Rect::new(0.0, 0.0, 40.0, 40.0).to_path(0.1),
                Style::default(),
            )],
            natural_size: Size::new(40.0, 40.0),
            placement: Placement {
                center: Point::new(200.0, 200.0),
                rotation: 0.0,
                size: Size::new(40.0, 40.0),
            },
            scale: Vec2::new(1.0, 1.0),
            source: Source::Markup,
        };

        let snapshot = render(&SheetSize::A3, &decorations, &[&drawable]);
        assert!((snapshot.width - 1160.0).abs() < f64::EPSILON);
        assert!((snapshot.height - 600.0).abs() < f64::EPSILON);
        assert!(snapshot.svg.starts_with("<svg"));
        assert!(snapshot.svg.contains("data-element-id=\"outlet-1\""));
        assert!(snapshot.svg.contains("stroke-dasharray"));
        assert!(snapshot.svg.contains("Project"));
        // Grid colours never make it into the export.
        assert!(!snapshot.svg.contains("#e6e6e6"));
        assert!(!snapshot.svg.contains("#c8c8c8"));
    }
}
