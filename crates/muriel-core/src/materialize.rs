//! Symbol materialization: markup first, procedural fallback second.

use crate::catalog::{SymbolCategory, SymbolDefinition};
use crate::drawable::{Color, Drawable, Placement, Primitive, Source, Style};
use crate::element::Element;
use crate::markup;
use kurbo::{BezPath, Circle, Line, Rect, Shape as _, Size, Vec2};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Local frame the fallback shapes are drawn in.
pub const FALLBACK_FRAME: Size = Size::new(50.0, 50.0);

const TOLERANCE: f64 = 0.1;

/// A boxed materialization future.
pub type Task = Pin<Box<dyn Future<Output = MaterializeOutcome> + Send>>;

/// Work order for one element, tagged with the reconciliation generation
/// it was dispatched in.
#[derive(Debug, Clone)]
pub struct MaterializeRequest {
    pub generation: u64,
    pub element_id: String,
    pub symbol: Arc<SymbolDefinition>,
    pub placement: Placement,
}

/// Result of a [`MaterializeRequest`].
#[derive(Debug, Clone)]
pub struct MaterializeOutcome {
    pub generation: u64,
    pub element_id: String,
    pub drawable: Drawable,
}

impl MaterializeRequest {
    /// Materialize synchronously.
    pub fn resolve(self) -> MaterializeOutcome {
        let drawable = materialize(&self.symbol, &self.element_id, self.placement);
        MaterializeOutcome {
            generation: self.generation,
            element_id: self.element_id,
            drawable,
        }
    }

    /// Materialize as a future, for hosts that parse off the event path.
    pub fn into_task(self) -> Task {
        Box::pin(async move { self.resolve() })
    }
}

/// Placement of `element` drawn as `symbol`.
pub fn placement_for(element: &Element, symbol: &SymbolDefinition) -> Placement {
    Placement {
        center: element.position,
        rotation: element.rotation,
        size: element.size_or(symbol.dimensions),
    }
}

/// Turn a symbol into a drawable. Never fails: markup that cannot be parsed
/// or yields nothing is replaced by the category's fallback shape.
pub fn materialize(symbol: &SymbolDefinition, element_id: &str, placement: Placement) -> Drawable {
    let natural = natural_size(symbol);
    let (primitives, natural_size, source) = match markup::parse(&symbol.svg, natural) {
        Ok(primitives) => (primitives, natural, Source::Markup),
        Err(err) => {
            log::debug!("Symbol {} falls back to a procedural shape: {}", symbol.id, err);
            (fallback_primitives(symbol.category), FALLBACK_FRAME, Source::Fallback)
        }
    };

    Drawable {
        element_id: element_id.to_string(),
        primitives,
        natural_size,
        placement,
        scale: Vec2::new(1.0, 1.0),
        source,
    }
}

fn natural_size(symbol: &SymbolDefinition) -> Size {
    let dims = symbol.dimensions;
    if dims.width > 0.0 && dims.height > 0.0 {
        dims
    } else {
        FALLBACK_FRAME
    }
}

fn outline() -> Style {
    Style::stroked(Color::BLACK, 2.0)
}

fn filled() -> Style {
    outline().with_fill(Color::WHITE)
}

fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> Primitive {
    Primitive::path(Line::new((x0, y0), (x1, y1)).to_path(TOLERANCE), outline())
}

fn rect(x: f64, y: f64, w: f64, h: f64) -> Primitive {
    Primitive::path(Rect::new(x, y, x + w, y + h).to_path(TOLERANCE), filled())
}

fn circle(cx: f64, cy: f64, r: f64) -> Primitive {
    Primitive::path(Circle::new((cx, cy), r).to_path(TOLERANCE), filled())
}

/// Procedural stand-in for a category, in the [`FALLBACK_FRAME`].
pub fn fallback_primitives(category: SymbolCategory) -> Vec<Primitive> {
    match category {
        SymbolCategory::Switches => vec![line(5.0, 25.0, 45.0, 25.0)],
        SymbolCategory::Outlets => vec![rect(10.0, 10.0, 30.0, 30.0)],
        SymbolCategory::Motors => vec![circle(25.0, 25.0, 22.0)],
        SymbolCategory::Protection => vec![
            line(25.0, 0.0, 25.0, 15.0),
            rect(15.0, 15.0, 20.0, 20.0),
            line(25.0, 35.0, 25.0, 50.0),
        ],
        SymbolCategory::Distribution => {
            let mut bars = BezPath::new();
            for y in [20.0, 25.0, 30.0] {
                bars.move_to((15.0, y));
                bars.line_to((35.0, y));
            }
            vec![rect(10.0, 10.0, 30.0, 30.0), Primitive::path(bars, outline())]
        }
        SymbolCategory::Lights => vec![
            circle(25.0, 25.0, 12.0),
            line(25.0, 13.0, 25.0, 37.0),
            line(13.0, 25.0, 37.0, 25.0),
            line(25.0, 37.0, 25.0, 45.0),
        ],
        SymbolCategory::Other => vec![rect(0.0, 0.0, 50.0, 50.0)],
    }
}
