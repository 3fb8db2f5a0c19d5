//! Element and document normalization.
//!
//! Turns loosely-typed JSON into a [`DesignDocument`] whose every field is in
//! range. Unknown element types are dropped; everything else is coerced.
//! Inline image payloads are left in place here; resolving them into asset
//! references needs an asset store and happens in the save pipeline.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::document::{CanvasBackground, CanvasShape, CanvasSize, DesignDocument, DEFAULT_BACKGROUND};
use crate::error::{DesignError, DesignResult};
use crate::element::{
    Element, ElementId, ElementKind, Flip, FontStyle, FontWeight, GraphicStyle, IconStyle,
    ImageStyle, ShapeType, StrokeStyle, TableData, TextAlign, TextDecoration, TextStyle, View,
};
use crate::sanitize::{
    boolean, color, color_or, color_or_transparent, integer, is_unsupported_color_function,
    keyword, number_at_least, number_in_range, optional_keyword, positive_number, string,
};

/// Minimum element width and height.
pub const MIN_ELEMENT_SIZE: f64 = 1.0;
/// Rotation bounds in degrees.
pub const MAX_ROTATION: f64 = 360.0;
/// Font size bounds.
pub const MIN_FONT_SIZE: f64 = 1.0;
/// Upper font size bound.
pub const MAX_FONT_SIZE: f64 = 400.0;
/// Outline width bounds.
pub const MAX_STROKE_WIDTH: f64 = 20.0;
/// Hue bounds in degrees.
pub const MAX_HUE: f64 = 360.0;
/// Saturation and brightness upper bound.
pub const MAX_SAT_BR: f64 = 2.0;
/// Corner radius upper bound (percent).
pub const MAX_BORDER_RADIUS: f64 = 50.0;
/// Fallback for unusable gradient stops.
pub const GRADIENT_FALLBACK: &str = "#000000";

/// Result of normalizing a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// The normalized document.
    pub document: DesignDocument,
    /// How many raw elements were dropped for an unrecognized `type`.
    pub dropped_elements: usize,
}

/// Normalize an untrusted document.
///
/// Anything that is not a JSON object normalizes to an empty default document.
#[must_use]
pub fn sanitize_document(raw: &Value) -> DesignDocument {
    normalize(raw, None).document
}

/// Parse JSON text and normalize it.
///
/// # Errors
///
/// Returns [`DesignError::Serialization`] if `json` is not JSON at all and
/// [`DesignError::NotAnObject`] if its root is not an object.
pub fn parse_document(json: &str, prior: Option<&DesignDocument>) -> DesignResult<Normalized> {
    let raw: Value = serde_json::from_str(json)?;
    if !raw.is_object() {
        return Err(DesignError::NotAnObject(json_kind(&raw)));
    }
    Ok(normalize(&raw, prior))
}

/// Short name of a JSON value's kind, for error messages.
#[must_use]
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Normalize an untrusted document, optionally on top of a prior revision.
///
/// With a `prior`, every top-level field absent from `raw` keeps its prior
/// value, and image elements without a `content` field keep the content of
/// the prior element with the same id.
#[must_use]
pub fn normalize(raw: &Value, prior: Option<&DesignDocument>) -> Normalized {
    let empty = Map::new();
    let fields = raw.as_object().unwrap_or(&empty);

    // Absent fields fall back to the prior revision when there is one.
    let pick = |key: &str| -> Option<&Value> { fields.get(key) };
    let keep_prior = |key: &str| prior.is_some() && !fields.contains_key(key);

    let canvas_shape = match prior {
        Some(p) if keep_prior("canvasShape") => p.canvas_shape,
        _ => sanitize_canvas_shape(pick("canvasShape")),
    };
    let canvas_size = match prior {
        Some(p) if keep_prior("canvasSize") => p.canvas_size,
        _ => sanitize_canvas_size(pick("canvasSize")),
    };
    let canvas_background = match prior {
        Some(p) if keep_prior("canvasBackground") => p.canvas_background.clone(),
        _ => sanitize_background(pick("canvasBackground")),
    };
    let (design_elements, dropped_elements) = match prior {
        Some(p) if keep_prior("designElements") => (p.design_elements.clone(), 0),
        _ => sanitize_elements(pick("designElements"), canvas_size, prior),
    };
    let preview_image = match prior {
        Some(p) if keep_prior("previewImage") => p.preview_image.clone(),
        _ => sanitize_reference(pick("previewImage")),
    };
    let product_id = match prior {
        Some(p) if keep_prior("productId") => p.product_id.clone(),
        _ => sanitize_reference(pick("productId")),
    };

    Normalized {
        document: DesignDocument {
            canvas_shape,
            canvas_size,
            canvas_background,
            design_elements,
            preview_image,
            product_id,
        },
        dropped_elements,
    }
}

/// Sanitize the canvas outline keyword.
#[must_use]
pub fn sanitize_canvas_shape(raw: Option<&Value>) -> CanvasShape {
    keyword(raw, CanvasShape::from_keyword, CanvasShape::default())
}

/// Sanitize canvas dimensions; each side independently defaults when not positive.
#[must_use]
pub fn sanitize_canvas_size(raw: Option<&Value>) -> CanvasSize {
    let defaults = CanvasSize::default();
    match raw.and_then(Value::as_object) {
        Some(size) => CanvasSize::new(
            positive_number(size.get("width"), defaults.width),
            positive_number(size.get("height"), defaults.height),
        ),
        None => defaults,
    }
}

/// Sanitize the canvas background.
///
/// Gradient stops are sanitized one by one (unusable ones become black). A
/// solid string that is unusable, or that names an unsupported color
/// function, becomes white.
#[must_use]
pub fn sanitize_background(raw: Option<&Value>) -> CanvasBackground {
    match raw {
        Some(Value::Object(gradient))
            if gradient.get("type").and_then(Value::as_str) == Some("gradient") =>
        {
            match gradient.get("colors").and_then(Value::as_array) {
                Some(colors) => CanvasBackground::gradient(
                    colors
                        .iter()
                        .map(|c| color_or(Some(c), GRADIENT_FALLBACK))
                        .collect(),
                ),
                None => CanvasBackground::default(),
            }
        }
        Some(Value::String(text)) => {
            if is_unsupported_color_function(text) {
                return CanvasBackground::default();
            }
            CanvasBackground::Solid(color_or(raw, DEFAULT_BACKGROUND))
        }
        _ => CanvasBackground::default(),
    }
}

/// Sanitize an optional opaque reference (asset URL, product id).
#[must_use]
pub fn sanitize_reference(raw: Option<&Value>) -> Option<String> {
    match raw {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Sanitize an element list, preserving order and dropping unknown types.
///
/// Returns the surviving elements and the number dropped. Ids that are
/// missing or repeat an earlier element's id are replaced with fresh ones.
#[must_use]
pub fn sanitize_elements(
    raw: Option<&Value>,
    canvas: CanvasSize,
    prior: Option<&DesignDocument>,
) -> (Vec<Element>, usize) {
    let Some(items) = raw.and_then(Value::as_array) else {
        return (Vec::new(), 0);
    };

    let mut seen = HashSet::with_capacity(items.len());
    let mut elements = Vec::with_capacity(items.len());
    let mut dropped = 0;

    for item in items {
        let Some(mut element) = sanitize_element(item, canvas) else {
            dropped += 1;
            continue;
        };
        if !seen.insert(element.id.clone()) {
            element.id = ElementId::new();
            seen.insert(element.id.clone());
        }
        if let (Some(prior), ElementKind::Image(image)) = (prior, &mut element.kind) {
            let content_absent = item.get("content").is_none();
            if content_absent {
                if let Some(ElementKind::Image(previous)) =
                    prior.element(&element.id).map(|e| &e.kind)
                {
                    image.content.clone_from(&previous.content);
                }
            }
        }
        elements.push(element);
    }

    (elements, dropped)
}

/// Sanitize one element against the canvas it sits on.
///
/// Returns `None` for non-objects and unrecognized `type` values.
#[must_use]
pub fn sanitize_element(raw: &Value, canvas: CanvasSize) -> Option<Element> {
    let Some(fields) = raw.as_object() else {
        tracing::warn!("Dropping design element that is not an object");
        return None;
    };
    let type_tag = fields.get("type").and_then(Value::as_str).unwrap_or("");
    let kind = match type_tag {
        "text" => ElementKind::Text(sanitize_text(fields)),
        "image" => ElementKind::Image(sanitize_image(fields)),
        "graphic" => ElementKind::Graphic(sanitize_graphic(fields)),
        "icon" => ElementKind::Icon(sanitize_icon(fields)),
        "table" => ElementKind::Table(TableData {
            content: fields.get("content").cloned().unwrap_or(Value::Null),
        }),
        other => {
            tracing::warn!(
                "Dropping design element with unrecognized type {other:?} (expected one of {:?})",
                ElementKind::TYPE_TAGS
            );
            return None;
        }
    };

    let id = match fields.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => ElementId::from(s.as_str()),
        Some(Value::Number(n)) => ElementId::from(n.to_string()),
        _ => ElementId::new(),
    };
    let (default_width, default_height) = kind.default_size();

    Some(Element {
        id,
        x: number_in_range(fields.get("x"), 0.0, canvas.width, 0.0),
        y: number_in_range(fields.get("y"), 0.0, canvas.height, 0.0),
        width: number_at_least(fields.get("width"), MIN_ELEMENT_SIZE, default_width),
        height: number_at_least(fields.get("height"), MIN_ELEMENT_SIZE, default_height),
        z_index: integer(fields.get("zIndex"), 0),
        rotation: number_in_range(fields.get("rotation"), -MAX_ROTATION, MAX_ROTATION, 0.0),
        view: if fields.get("view").and_then(Value::as_str) == Some("Back") {
            View::Back
        } else {
            View::Front
        },
        locked: boolean(fields.get("locked"), false),
        kind,
    })
}

fn opacity(fields: &Map<String, Value>) -> f64 {
    number_in_range(fields.get("opacity"), 0.0, 1.0, 1.0)
}

fn sanitize_text(fields: &Map<String, Value>) -> TextStyle {
    let defaults = TextStyle::default();
    let font_family = string(fields.get("fontFamily"), &defaults.font_family);
    TextStyle {
        content: string(fields.get("content"), ""),
        font_family: if font_family.trim().is_empty() {
            defaults.font_family
        } else {
            font_family
        },
        font_size: number_in_range(
            fields.get("fontSize"),
            MIN_FONT_SIZE,
            MAX_FONT_SIZE,
            defaults.font_size,
        ),
        font_weight: keyword(fields.get("fontWeight"), FontWeight::from_keyword, defaults.font_weight),
        font_style: keyword(fields.get("fontStyle"), FontStyle::from_keyword, defaults.font_style),
        text_decoration: keyword(
            fields.get("textDecoration"),
            TextDecoration::from_keyword,
            defaults.text_decoration,
        ),
        text_align: keyword(fields.get("textAlign"), TextAlign::from_keyword, defaults.text_align),
        color: color_or(fields.get("color"), &defaults.color),
        background_color: color_or_transparent(
            fields.get("backgroundColor"),
            &defaults.background_color,
        ),
        stroke: color(fields.get("stroke")),
        stroke_width: number_in_range(fields.get("strokeWidth"), 0.0, MAX_STROKE_WIDTH, 0.0),
        opacity: opacity(fields),
        is_curved: boolean(fields.get("isCurved"), false),
    }
}

fn sanitize_image(fields: &Map<String, Value>) -> ImageStyle {
    let defaults = ImageStyle::default();
    ImageStyle {
        content: string(fields.get("content"), ""),
        filter: string(fields.get("filter"), &defaults.filter),
        hue: number_in_range(fields.get("hue"), 0.0, MAX_HUE, defaults.hue),
        sat: number_in_range(fields.get("sat"), 0.0, MAX_SAT_BR, defaults.sat),
        br: number_in_range(fields.get("br"), 0.0, MAX_SAT_BR, defaults.br),
        opacity: opacity(fields),
        border_radius: number_in_range(
            fields.get("borderRadius"),
            0.0,
            MAX_BORDER_RADIUS,
            defaults.border_radius,
        ),
    }
}

fn sanitize_graphic(fields: &Map<String, Value>) -> GraphicStyle {
    let defaults = GraphicStyle::default();
    GraphicStyle {
        shape_type: keyword(fields.get("shapeType"), ShapeType::from_keyword, defaults.shape_type),
        fill_color: color_or(fields.get("fillColor"), &defaults.fill_color),
        stroke_color: color_or_transparent(fields.get("strokeColor"), &defaults.stroke_color),
        stroke_width: number_in_range(fields.get("strokeWidth"), 0.0, MAX_STROKE_WIDTH, 0.0),
        stroke_style: keyword(
            fields.get("strokeStyle"),
            StrokeStyle::from_keyword,
            defaults.stroke_style,
        ),
        opacity: opacity(fields),
        flip: optional_keyword(fields.get("flip"), Flip::from_keyword),
    }
}

fn sanitize_icon(fields: &Map<String, Value>) -> IconStyle {
    let defaults = IconStyle::default();
    IconStyle {
        icon: string(fields.get("icon"), &defaults.icon),
        color: color_or(fields.get("color"), &defaults.color),
        opacity: opacity(fields),
    }
}
