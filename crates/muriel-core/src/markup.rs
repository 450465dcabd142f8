//! Sanitizing parser for symbol markup.
//!
//! Reads the small SVG subset symbols are drawn with and turns it into
//! [`Primitive`]s in the symbol's local frame. Anything that could execute
//! or pull in external content is rejected outright.

use crate::drawable::{Color, Primitive, Style, TextAnchor};
use kurbo::{Affine, BezPath, Circle, Ellipse, Point, Rect, RoundedRect, Shape as _, Size, Vec2};
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fmt::Display;
use thiserror::Error;

/// Flattening tolerance when converting curves to paths.
const TOLERANCE: f64 = 0.1;

/// Default font size for `<text>` without a `font-size`.
const DEFAULT_FONT_SIZE: f64 = 12.0;

const ALLOWED_ELEMENTS: &[&str] = &[
    "svg", "g", "line", "rect", "circle", "ellipse", "path", "polyline", "polygon", "text",
    "title", "desc",
];

/// Why a piece of markup could not be turned into primitives.
#[derive(Debug, Error, PartialEq)]
pub enum MarkupError {
    #[error("Malformed markup: {0}")]
    Xml(String),
    #[error("Element <{0}> is not allowed")]
    DisallowedElement(String),
    #[error("Attribute {attribute} on <{element}> is not allowed")]
    DisallowedAttribute { element: String, attribute: String },
    #[error("Invalid number in {attribute}: {value:?}")]
    InvalidNumber { attribute: String, value: String },
    #[error("Invalid path data: {0}")]
    InvalidPath(String),
    #[error("Markup contains no drawable primitives")]
    Empty,
}

fn xml_error(err: impl Display) -> MarkupError {
    MarkupError::Xml(err.to_string())
}

/// Inherited drawing state for one open element.
#[derive(Debug, Clone, Copy)]
struct Frame {
    transform: Affine,
    style: Style,
    font_size: f64,
    anchor: TextAnchor,
}

/// A `<text>` element waiting for its content.
struct PendingText {
    origin: Point,
    frame: Frame,
    bold: bool,
    content: String,
}

/// Parse `markup` into primitives scaled onto a frame of `target` size.
pub fn parse(markup: &str, target: Size) -> Result<Vec<Primitive>, MarkupError> {
    let mut reader = Reader::from_str(markup);
    reader.config_mut().trim_text(true);

    let mut buffer = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut primitives = Vec::new();
    let mut pending_text: Option<PendingText> = None;
    let mut metadata_depth = 0usize;
    let root = Frame {
        transform: Affine::IDENTITY,
        style: Style::default(),
        font_size: DEFAULT_FONT_SIZE,
        anchor: TextAnchor::Start,
    };

    loop {
        match reader.read_event_into(&mut buffer) {
            Ok(Event::Start(ref e)) => {
                let decoder = reader.decoder();
                let tag = element_name(decoder, e)?;
                let attrs = collect_attributes(decoder, e, &tag)?;
                let parent = stack.last().copied().unwrap_or(root);
                let frame = enter(&tag, &attrs, parent, stack.is_empty(), target)?;

                match tag.as_str() {
                    "title" | "desc" => metadata_depth += 1,
                    "text" => {
                        pending_text = Some(PendingText {
                            origin: Point::new(number(&attrs, "x")?, number(&attrs, "y")?),
                            frame,
                            bold: is_bold(&attrs),
                            content: String::new(),
                        });
                    }
                    _ => {
                        if let Some(path) = shape_path(&tag, &attrs)? {
                            primitives.push(stroke_path(path, frame));
                        }
                    }
                }
                stack.push(frame);
            }
            Ok(Event::Empty(ref e)) => {
                let decoder = reader.decoder();
                let tag = element_name(decoder, e)?;
                let attrs = collect_attributes(decoder, e, &tag)?;
                let parent = stack.last().copied().unwrap_or(root);
                let frame = enter(&tag, &attrs, parent, stack.is_empty(), target)?;
                if let Some(path) = shape_path(&tag, &attrs)? {
                    primitives.push(stroke_path(path, frame));
                }
            }
            Ok(Event::Text(e)) => {
                if let (0, Some(text)) = (metadata_depth, pending_text.as_mut()) {
                    let content = e.xml_content().map_err(xml_error)?;
                    text.content.push_str(&content);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(text) = pending_text.as_mut() {
                    text.content.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::End(ref e)) => {
                let name = e.name();
                let tag = local_name(&reader.decoder().decode(name.as_ref()).map_err(xml_error)?);
                stack.pop();
                match tag.as_str() {
                    "title" | "desc" => metadata_depth = metadata_depth.saturating_sub(1),
                    "text" => {
                        if let Some(text) = pending_text.take() {
                            if let Some(primitive) = finish_text(text) {
                                primitives.push(primitive);
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::DocType(_)) => {
                return Err(MarkupError::DisallowedElement("!DOCTYPE".to_string()));
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(xml_error(err)),
            _ => {}
        }

        buffer.clear();
    }

    if !stack.is_empty() {
        return Err(MarkupError::Xml("unclosed element".to_string()));
    }
    if primitives.is_empty() {
        return Err(MarkupError::Empty);
    }
    Ok(primitives)
}

fn local_name(name: &str) -> String {
    name.rsplit(':').next().unwrap_or(name).to_ascii_lowercase()
}

fn element_name(decoder: Decoder, e: &BytesStart) -> Result<String, MarkupError> {
    let name = e.name();
    let tag = local_name(&decoder.decode(name.as_ref()).map_err(xml_error)?);
    if !ALLOWED_ELEMENTS.contains(&tag.as_str()) {
        return Err(MarkupError::DisallowedElement(tag));
    }
    Ok(tag)
}

fn is_disallowed_attribute(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("on") || key == "style" || key == "href" || key.ends_with(":href")
}

fn collect_attributes(
    decoder: Decoder,
    e: &BytesStart,
    tag: &str,
) -> Result<HashMap<String, String>, MarkupError> {
    let mut attrs = HashMap::new();
    for attr in e.attributes().with_checks(false) {
        let attr = attr.map_err(xml_error)?;
        let key = decoder.decode(attr.key.as_ref()).map_err(xml_error)?;
        if is_disallowed_attribute(&key) {
            return Err(MarkupError::DisallowedAttribute {
                element: tag.to_string(),
                attribute: key.into_owned(),
            });
        }
        let value = attr.unescape_value().map_err(xml_error)?.into_owned();
        attrs.insert(key.into_owned(), value);
    }
    Ok(attrs)
}

/// Compute the drawing state of an element from its parent's.
fn enter(
    tag: &str,
    attrs: &HashMap<String, String>,
    parent: Frame,
    is_root: bool,
    target: Size,
) -> Result<Frame, MarkupError> {
    let mut frame = parent;

    if is_root && tag == "svg" {
        frame.transform = root_mapping(attrs, target)?;
    }
    if let Some(value) = attrs.get("transform") {
        frame.transform = frame.transform * parse_transform(value)?;
    }
    if let Some(value) = attrs.get("stroke") {
        frame.style.stroke = paint(value);
    }
    if let Some(value) = attrs.get("fill") {
        frame.style.fill = paint(value);
    }
    if attrs.contains_key("stroke-width") {
        frame.style.stroke_width = number(attrs, "stroke-width")?;
    }
    if let Some(value) = attrs.get("stroke-dasharray") {
        let dash = parse_numbers("stroke-dasharray", value)?;
        frame.style.dash = match dash.as_slice() {
            [on, off, ..] => Some((*on, *off)),
            [on] => Some((*on, *on)),
            [] => None,
        };
    }
    if attrs.contains_key("font-size") {
        frame.font_size = number(attrs, "font-size")?;
    }
    if let Some(value) = attrs.get("text-anchor") {
        frame.anchor = match value.as_str() {
            "middle" => TextAnchor::Middle,
            "end" => TextAnchor::End,
            _ => TextAnchor::Start,
        };
    }
    Ok(frame)
}

/// Map markup units onto the target frame using `viewBox`, falling back to
/// `width`/`height`.
fn root_mapping(attrs: &HashMap<String, String>, target: Size) -> Result<Affine, MarkupError> {
    if let Some(value) = attrs.get("viewBox") {
        if let [min_x, min_y, width, height] = parse_numbers("viewBox", value)?.as_slice() {
            if *width > 0.0 && *height > 0.0 {
                return Ok(Affine::scale_non_uniform(
                    target.width / width,
                    target.height / height,
                ) * Affine::translate(Vec2::new(-min_x, -min_y)));
            }
        }
        return Err(MarkupError::InvalidNumber {
            attribute: "viewBox".to_string(),
            value: value.clone(),
        });
    }

    let width = optional_number(attrs, "width")?;
    let height = optional_number(attrs, "height")?;
    match (width, height) {
        (Some(w), Some(h)) if w > 0.0 && h > 0.0 => {
            Ok(Affine::scale_non_uniform(target.width / w, target.height / h))
        }
        _ => Ok(Affine::IDENTITY),
    }
}

fn shape_path(tag: &str, attrs: &HashMap<String, String>) -> Result<Option<BezPath>, MarkupError> {
    let path = match tag {
        "line" => {
            let mut path = BezPath::new();
            path.move_to((number(attrs, "x1")?, number(attrs, "y1")?));
            path.line_to((number(attrs, "x2")?, number(attrs, "y2")?));
            path
        }
        "rect" => {
            let rect = Rect::from_origin_size(
                (number(attrs, "x")?, number(attrs, "y")?),
                (number(attrs, "width")?, number(attrs, "height")?),
            );
            let radius = optional_number(attrs, "rx")?
                .or(optional_number(attrs, "ry")?)
                .unwrap_or(0.0);
            if radius > 0.0 {
                RoundedRect::from_rect(rect, radius).to_path(TOLERANCE)
            } else {
                rect.to_path(TOLERANCE)
            }
        }
        "circle" => Circle::new(
            (number(attrs, "cx")?, number(attrs, "cy")?),
            number(attrs, "r")?,
        )
        .to_path(TOLERANCE),
        "ellipse" => Ellipse::new(
            (number(attrs, "cx")?, number(attrs, "cy")?),
            (number(attrs, "rx")?, number(attrs, "ry")?),
            0.0,
        )
        .to_path(TOLERANCE),
        "path" => match attrs.get("d") {
            Some(d) => BezPath::from_svg(d).map_err(|e| MarkupError::InvalidPath(e.to_string()))?,
            None => return Ok(None),
        },
        "polyline" | "polygon" => {
            let Some(value) = attrs.get("points") else {
                return Ok(None);
            };
            let coords = parse_numbers("points", value)?;
            let mut path = BezPath::new();
            for (index, pair) in coords.chunks_exact(2).enumerate() {
                if index == 0 {
                    path.move_to((pair[0], pair[1]));
                } else {
                    path.line_to((pair[0], pair[1]));
                }
            }
            if tag == "polygon" && coords.len() >= 4 {
                path.close_path();
            }
            path
        }
        _ => return Ok(None),
    };

    if path.elements().is_empty() {
        return Ok(None);
    }
    Ok(Some(path))
}

fn stroke_path(path: BezPath, frame: Frame) -> Primitive {
    let mut style = frame.style;
    style.stroke_width *= frame.transform.determinant().abs().sqrt();
    Primitive::path(frame.transform * path, style)
}

fn finish_text(text: PendingText) -> Option<Primitive> {
    let content = text.content.trim();
    if content.is_empty() {
        return None;
    }
    let frame = text.frame;
    let primitive = Primitive::Text {
        origin: text.origin,
        content: content.to_string(),
        font_size: frame.font_size,
        bold: text.bold,
        anchor: frame.anchor,
        color: frame.style.fill.unwrap_or(Color::BLACK),
    };
    Some(primitive.transformed(frame.transform))
}

fn is_bold(attrs: &HashMap<String, String>) -> bool {
    attrs
        .get("font-weight")
        .is_some_and(|w| w == "bold" || w.parse::<u32>().is_ok_and(|n| n >= 600))
}

/// `none` disables painting; unknown colours draw black.
fn paint(value: &str) -> Option<Color> {
    match value.trim() {
        "none" | "transparent" => None,
        other => Some(Color::parse(other).unwrap_or(Color::BLACK)),
    }
}

fn parse_f64(attribute: &str, value: &str) -> Result<f64, MarkupError> {
    let trimmed = value.trim();
    let trimmed = trimmed.strip_suffix("px").unwrap_or(trimmed);
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| MarkupError::InvalidNumber {
            attribute: attribute.to_string(),
            value: value.to_string(),
        })
}

/// Required numeric attribute; absent means 0.
fn number(attrs: &HashMap<String, String>, name: &str) -> Result<f64, MarkupError> {
    Ok(optional_number(attrs, name)?.unwrap_or(0.0))
}

fn optional_number(attrs: &HashMap<String, String>, name: &str) -> Result<Option<f64>, MarkupError> {
    attrs.get(name).map(|value| parse_f64(name, value)).transpose()
}

fn parse_numbers(attribute: &str, value: &str) -> Result<Vec<f64>, MarkupError> {
    value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .map(|part| parse_f64(attribute, part))
        .collect()
}

/// Parse an SVG transform list such as `translate(10 5) rotate(45)`.
pub fn parse_transform(value: &str) -> Result<Affine, MarkupError> {
    let invalid = || MarkupError::InvalidNumber {
        attribute: "transform".to_string(),
        value: value.to_string(),
    };

    let mut affine = Affine::IDENTITY;
    let mut rest = value.trim();
    while !rest.is_empty() {
        let open = rest.find('(').ok_or_else(invalid)?;
        let close = rest.find(')').ok_or_else(invalid)?;
        if close < open {
            return Err(invalid());
        }
        let name = rest[..open].trim().trim_start_matches(',').trim();
        let args = parse_numbers("transform", &rest[open + 1..close])?;

        let step = match (name, args.as_slice()) {
            ("translate", [tx]) => Affine::translate((*tx, 0.0)),
            ("translate", [tx, ty]) => Affine::translate((*tx, *ty)),
            ("scale", [s]) => Affine::scale(*s),
            ("scale", [sx, sy]) => Affine::scale_non_uniform(*sx, *sy),
            ("rotate", [deg]) => Affine::rotate(deg.to_radians()),
            ("rotate", [deg, cx, cy]) => {
                Affine::rotate_about(deg.to_radians(), Point::new(*cx, *cy))
            }
            ("matrix", [a, b, c, d, e, f]) => Affine::new([*a, *b, *c, *d, *e, *f]),
            _ => return Err(invalid()),
        };
        affine = affine * step;
        rest = rest[close + 1..].trim_start();
    }
    Ok(affine)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Size = Size::new(40.0, 40.0);

    fn path_bounds(primitive: &Primitive) -> Rect {
        match primitive {
            Primitive::Path { path, .. } => path.bounding_box(),
            Primitive::Text { .. } => panic!("expected a path"),
        }
    }

    #[test]
    fn test_simple_rect() {
        let prims = parse(
            r#"<svg width="40" height="40"><rect x="5" y="5" width="30" height="30"/></svg>"#,
            FRAME,
        )
        .unwrap();
        assert_eq!(prims.len(), 1);
        let b = path_bounds(&prims[0]);
        assert!((b.x0 - 5.0).abs() < 1e-9);
        assert!((b.x1 - 35.0).abs() < 1e-9);
        match &prims[0] {
            Primitive::Path { style, .. } => {
                assert_eq!(style.stroke, Some(Color::BLACK));
                assert!((style.stroke_width - 2.0).abs() < 1e-9);
                assert_eq!(style.fill, None);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_viewbox_scales_to_target() {
        let prims = parse(
            r#"<svg viewBox="0 0 20 20"><line x1="0" y1="10" x2="20" y2="10"/></svg>"#,
            FRAME,
        )
        .unwrap();
        let b = path_bounds(&prims[0]);
        assert!((b.x1 - 40.0).abs() < 1e-9);
        assert!((b.y0 - 20.0).abs() < 1e-9);
        match &prims[0] {
            // Stroke scales with the mapping.
            Primitive::Path { style, .. } => assert!((style.stroke_width - 4.0).abs() < 1e-9),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_group_transform_composes() {
        let prims = parse(
            r#"<svg><g transform="translate(10,10)"><circle cx="0" cy="0" r="5" transform="scale(2)"/></g></svg>"#,
            FRAME,
        )
        .unwrap();
        let b = path_bounds(&prims[0]);
        assert!((b.x0 - 0.0).abs() < 1e-6);
        assert!((b.x1 - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_inherited_paint() {
        let prims = parse(
            r##"<svg><g stroke="#ff0000" fill="white"><polygon points="0,0 10,0 10,10"/></g></svg>"##,
            FRAME,
        )
        .unwrap();
        match &prims[0] {
            Primitive::Path { style, path } => {
                assert_eq!(style.stroke, Some(Color::new(255, 0, 0, 255)));
                assert_eq!(style.fill, Some(Color::WHITE));
                assert!(matches!(path.elements().last(), Some(kurbo::PathEl::ClosePath)));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_rejects_script() {
        let err = parse("<svg><script>alert(1)</script></svg>", FRAME).unwrap_err();
        assert_eq!(err, MarkupError::DisallowedElement("script".to_string()));
    }

    #[test]
    fn test_rejects_foreign_object_and_image() {
        assert!(matches!(
            parse("<svg><foreignObject/></svg>", FRAME),
            Err(MarkupError::DisallowedElement(_))
        ));
        assert!(matches!(
            parse("<svg><image/></svg>", FRAME),
            Err(MarkupError::DisallowedElement(_))
        ));
    }

    #[test]
    fn test_rejects_event_handlers_and_links() {
        assert!(matches!(
            parse(r#"<svg><rect width="1" height="1" onclick="x()"/></svg>"#, FRAME),
            Err(MarkupError::DisallowedAttribute { .. })
        ));
        assert!(matches!(
            parse(r#"<svg><g xlink:href="http://x"/></svg>"#, FRAME),
            Err(MarkupError::DisallowedAttribute { .. })
        ));
        assert!(matches!(
            parse(r#"<svg style="fill:red"><rect width="1" height="1"/></svg>"#, FRAME),
            Err(MarkupError::DisallowedAttribute { .. })
        ));
    }

    #[test]
    fn test_empty_and_malformed() {
        assert_eq!(parse("", FRAME), Err(MarkupError::Empty));
        assert_eq!(parse("<svg></svg>", FRAME), Err(MarkupError::Empty));
        assert!(matches!(parse("<svg><rect", FRAME), Err(MarkupError::Xml(_))));
        assert!(matches!(
            parse(r#"<svg><rect width="wide" height="1"/></svg>"#, FRAME),
            Err(MarkupError::InvalidNumber { .. })
        ));
        assert!(matches!(
            parse(r#"<svg><path d="M 0 0 Q"/></svg>"#, FRAME),
            Err(MarkupError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_text_and_metadata() {
        let prims = parse(
            r#"<svg><title>Socket</title><text x="4" y="20" font-size="10" font-weight="bold">S</text></svg>"#,
            FRAME,
        )
        .unwrap();
        assert_eq!(prims.len(), 1);
        match &prims[0] {
            Primitive::Text {
                content,
                font_size,
                bold,
                origin,
                ..
            } => {
                assert_eq!(content, "S");
                assert!((font_size - 10.0).abs() < 1e-9);
                assert!(*bold);
                assert_eq!(*origin, Point::new(4.0, 20.0));
            }
            _ => panic!("expected text"),
        }
    }

    #[test]
    fn test_parse_transform_list() {
        let affine = parse_transform("translate(10 0) rotate(90)").unwrap();
        let p = affine * Point::new(1.0, 0.0);
        assert!((p.x - 10.0).abs() < 1e-9);
        assert!((p.y - 1.0).abs() < 1e-9);
        assert!(parse_transform("skewX(10)").is_err());
        assert!(parse_transform("matrix(1 0 0 1)").is_err());
    }
}
