//! Drawable primitives produced by materialization.

use kurbo::{Affine, BezPath, Point, Rect, Shape as _, Size, Vec2};
use serde::{Deserialize, Serialize};

/// RGBA8 colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const BLACK: Color = Color::new(0, 0, 0, 255);
    pub const WHITE: Color = Color::new(255, 255, 255, 255);

    /// Parse `#rgb`, `#rrggbb`, `#rrggbbaa` and a few keywords.
    /// Returns `None` for `none`/`transparent` and for unknown values.
    pub fn parse(value: &str) -> Option<Color> {
        let value = value.trim();
        match value.to_ascii_lowercase().as_str() {
            "none" | "transparent" | "" => return None,
            "black" | "currentcolor" => return Some(Color::BLACK),
            "white" => return Some(Color::WHITE),
            "red" => return Some(Color::new(255, 0, 0, 255)),
            "green" => return Some(Color::new(0, 128, 0, 255)),
            "blue" => return Some(Color::new(0, 0, 255, 255)),
            "gray" | "grey" => return Some(Color::new(128, 128, 128, 255)),
            _ => {}
        }

        let hex = value.strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => Some(Color::new(
                channel(&hex[0..1])? * 17,
                channel(&hex[1..2])? * 17,
                channel(&hex[2..3])? * 17,
                255,
            )),
            6 => Some(Color::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                255,
            )),
            8 => Some(Color::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                channel(&hex[6..8])?,
            )),
            _ => None,
        }
    }

    /// `#rrggbb` form (alpha is written separately as an opacity).
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn opacity(self) -> f64 {
        self.a as f64 / 255.0
    }
}

/// Stroke and fill for a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub stroke: Option<Color>,
    pub stroke_width: f64,
    pub fill: Option<Color>,
    /// Dash pattern (on, off); `None` draws solid.
    pub dash: Option<(f64, f64)>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            stroke: Some(Color::BLACK),
            stroke_width: 2.0,
            fill: None,
            dash: None,
        }
    }
}

impl Style {
    pub fn stroked(color: Color, width: f64) -> Self {
        Self {
            stroke: Some(color),
            stroke_width: width,
            fill: None,
            dash: None,
        }
    }

    pub fn with_fill(mut self, fill: Color) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn with_dash(mut self, on: f64, off: f64) -> Self {
        self.dash = Some((on, off));
        self
    }
}

/// Horizontal text anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAnchor {
    #[default]
    Start,
    Middle,
    End,
}

/// A single native drawing primitive in a drawable's local frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Primitive {
    Path {
        path: BezPath,
        style: Style,
    },
    Text {
        /// Baseline start in local coordinates.
        origin: Point,
        content: String,
        font_size: f64,
        bold: bool,
        anchor: TextAnchor,
        color: Color,
    },
}

impl Primitive {
    /// Shorthand for a path primitive.
    pub fn path(path: BezPath, style: Style) -> Self {
        Primitive::Path { path, style }
    }

    /// Local bounding box. Text is approximated from its font size.
    pub fn bounds(&self) -> Rect {
        match self {
            Primitive::Path { path, .. } => path.bounding_box(),
            Primitive::Text {
                origin,
                content,
                font_size,
                anchor,
                ..
            } => {
                let width = content.chars().count() as f64 * font_size * 0.6;
                let x0 = match anchor {
                    TextAnchor::Start => origin.x,
                    TextAnchor::Middle => origin.x - width / 2.0,
                    TextAnchor::End => origin.x - width,
                };
                Rect::new(x0, origin.y - font_size, x0 + width, origin.y + font_size * 0.25)
            }
        }
    }

    /// Apply an affine transform to the primitive's geometry.
    pub fn transformed(&self, affine: Affine) -> Self {
        match self {
            Primitive::Path { path, style } => Primitive::Path {
                path: affine * path.clone(),
                style: *style,
            },
            Primitive::Text {
                origin,
                content,
                font_size,
                bold,
                anchor,
                color,
            } => {
                let scale = affine.as_coeffs()[0].hypot(affine.as_coeffs()[1]);
                Primitive::Text {
                    origin: affine * *origin,
                    content: content.clone(),
                    font_size: font_size * scale,
                    bold: *bold,
                    anchor: *anchor,
                    color: *color,
                }
            }
        }
    }
}

/// Where a drawable sits in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// World-space centre.
    pub center: Point,
    /// Rotation in degrees around the centre.
    pub rotation: f64,
    /// Rendered size.
    pub size: Size,
}

/// Which path produced a drawable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Parsed from the symbol's markup.
    Markup,
    /// Procedural shape chosen by category.
    Fallback,
}

/// One logical drawable unit bound to an element.
#[derive(Debug, Clone, PartialEq)]
pub struct Drawable {
    /// Back-reference to the owning element.
    pub element_id: String,
    /// Primitives in the local frame `(0, 0)..natural_size`.
    pub primitives: Vec<Primitive>,
    /// Size of the local frame.
    pub natural_size: Size,
    pub placement: Placement,
    /// Interactive scale applied on top of `placement.size` while a resize
    /// is in progress. 1.0 at rest.
    pub scale: Vec2,
    pub source: Source,
}

impl Drawable {
    /// Size as currently displayed, including any live scale.
    pub fn display_size(&self) -> Size {
        Size::new(
            self.placement.size.width * self.scale.x,
            self.placement.size.height * self.scale.y,
        )
    }

    /// Local-to-world transform.
    pub fn transform(&self) -> Affine {
        let size = self.display_size();
        let natural = self.natural_size;
        let sx = if natural.width > 0.0 { size.width / natural.width } else { 1.0 };
        let sy = if natural.height > 0.0 { size.height / natural.height } else { 1.0 };
        Affine::translate(self.placement.center.to_vec2())
            * Affine::rotate(self.placement.rotation.to_radians())
            * Affine::scale_non_uniform(sx, sy)
            * Affine::translate(Vec2::new(-natural.width / 2.0, -natural.height / 2.0))
    }

    /// Axis-aligned world bounds of the (possibly rotated) frame.
    pub fn bounds(&self) -> Rect {
        let frame = Rect::from_origin_size(Point::ZERO, self.natural_size);
        self.transform().transform_rect_bbox(frame)
    }

    /// Unrotated world rectangle around the centre; handles sit on its
    /// corners.
    pub fn frame(&self) -> Rect {
        Rect::from_center_size(self.placement.center, self.display_size())
    }

    /// Check if a world point falls inside the drawable.
    pub fn contains(&self, point: Point) -> bool {
        let local = self.transform().inverse() * point;
        Rect::from_origin_size(Point::ZERO, self.natural_size).contains(local)
    }

    /// Fold a finished resize back into absolute size with unit scale.
    pub fn normalize_scale(&mut self, size: Size) {
        self.placement.size = size;
        self.scale = Vec2::new(1.0, 1.0);
    }
}
