//! Canonical serialized representation of a product design shared by the
//! in-browser editor and the save pipeline.

use serde::{Deserialize, Serialize};

use crate::{Element, ElementId};

/// Default canvas width in canvas units.
pub const DEFAULT_CANVAS_WIDTH: f64 = 1050.0;

/// Default canvas height in canvas units.
pub const DEFAULT_CANVAS_HEIGHT: f64 = 600.0;

/// Default solid background.
pub const DEFAULT_BACKGROUND: &str = "#ffffff";

/// Outline of the printable canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanvasShape {
    /// Square canvas.
    Square,
    /// Rectangular canvas.
    #[default]
    Rectangle,
    /// Circular canvas.
    Circle,
    /// Product-specific outline.
    Custom,
}

impl CanvasShape {
    /// Every accepted value.
    pub const ALL: &'static [Self] = &[Self::Square, Self::Rectangle, Self::Circle, Self::Custom];

    /// The wire spelling of this value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Square => "square",
            Self::Rectangle => "rectangle",
            Self::Circle => "circle",
            Self::Custom => "custom",
        }
    }

    /// Look up a value by its exact wire spelling.
    #[must_use]
    pub fn from_keyword(text: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.as_str() == text)
    }
}

/// Canvas dimensions in canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl CanvasSize {
    /// Create a canvas size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT)
    }
}

/// Tag carried by gradient backgrounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientTag {
    /// The only tag value.
    #[default]
    Gradient,
}

/// Canvas background: a solid color or a gradient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CanvasBackground {
    /// Solid color string.
    Solid(String),
    /// Multi-stop gradient.
    Gradient {
        /// Always `"gradient"`.
        #[serde(rename = "type")]
        tag: GradientTag,
        /// Color stops, in order.
        colors: Vec<String>,
    },
}

impl CanvasBackground {
    /// Solid background of the given color.
    #[must_use]
    pub fn solid(color: impl Into<String>) -> Self {
        Self::Solid(color.into())
    }

    /// Gradient through the given colors.
    #[must_use]
    pub fn gradient(colors: Vec<String>) -> Self {
        Self::Gradient {
            tag: GradientTag::Gradient,
            colors,
        }
    }
}

impl Default for CanvasBackground {
    fn default() -> Self {
        Self::Solid(DEFAULT_BACKGROUND.to_string())
    }
}

/// The full canvas state for one product design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignDocument {
    /// Canvas outline.
    #[serde(default)]
    pub canvas_shape: CanvasShape,
    /// Canvas dimensions.
    #[serde(default)]
    pub canvas_size: CanvasSize,
    /// Canvas background.
    #[serde(default)]
    pub canvas_background: CanvasBackground,
    /// Elements in render order. Order is the z fallback, not z-index order.
    #[serde(default)]
    pub design_elements: Vec<Element>,
    /// Rendered preview asset reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_image: Option<String>,
    /// External product reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
}

impl Default for DesignDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl DesignDocument {
    /// An empty document on the default canvas.
    #[must_use]
    pub fn new() -> Self {
        Self {
            canvas_shape: CanvasShape::default(),
            canvas_size: CanvasSize::default(),
            canvas_background: CanvasBackground::default(),
            design_elements: Vec::new(),
            preview_image: None,
            product_id: None,
        }
    }

    /// An empty document with the given canvas dimensions.
    #[must_use]
    pub fn with_size(width: f64, height: f64) -> Self {
        Self {
            canvas_size: CanvasSize::new(width, height),
            ..Self::new()
        }
    }

    /// Get an element by ID.
    #[must_use]
    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.design_elements.iter().find(|e| &e.id == id)
    }

    /// Get a mutable reference to an element by ID.
    pub fn element_mut(&mut self, id: &ElementId) -> Option<&mut Element> {
        self.design_elements.iter_mut().find(|e| &e.id == id)
    }

    /// Whether an element with this id exists.
    #[must_use]
    pub fn contains(&self, id: &ElementId) -> bool {
        self.element(id).is_some()
    }

    /// Number of elements.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.design_elements.len()
    }

    /// Whether the document has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.design_elements.is_empty()
    }

    /// Highest z-index in use, if any element exists.
    #[must_use]
    pub fn max_z_index(&self) -> Option<i32> {
        self.design_elements.iter().map(|e| e.z_index).max()
    }

    /// Lowest z-index in use, if any element exists.
    #[must_use]
    pub fn min_z_index(&self) -> Option<i32> {
        self.design_elements.iter().map(|e| e.z_index).min()
    }

    /// Elements sorted for drawing: by z-index, ties broken by list order.
    #[must_use]
    pub fn draw_order(&self) -> Vec<&Element> {
        let mut ordered: Vec<_> = self.design_elements.iter().collect();
        ordered.sort_by_key(|e| e.z_index);
        ordered
    }

    /// Serialize the document to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> crate::DesignResult<String> {
        serde_json::to_string(self).map_err(crate::DesignError::Serialization)
    }

    /// Deserialize a well-formed document from JSON.
    ///
    /// This is strict: it is meant for documents this crate produced. Untrusted
    /// input goes through [`crate::normalize::sanitize_document`] instead.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> crate::DesignResult<Self> {
        serde_json::from_str(json).map_err(crate::DesignError::Serialization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ElementKind;

    #[test]
    fn test_default_document() {
        let doc = DesignDocument::new();
        assert!(doc.is_empty());
        assert!((doc.canvas_size.width - 1050.0).abs() < f64::EPSILON);
        assert!((doc.canvas_size.height - 600.0).abs() < f64::EPSILON);
        assert_eq!(doc.canvas_background, CanvasBackground::solid("#ffffff"));
    }

    #[test]
    fn test_background_serializes_as_string_or_gradient() {
        let solid = serde_json::to_value(CanvasBackground::solid("#123456")).expect("solid");
        assert_eq!(solid, serde_json::json!("#123456"));

        let gradient = CanvasBackground::gradient(vec!["#000".into(), "#fff".into()]);
        let value = serde_json::to_value(&gradient).expect("gradient");
        assert_eq!(value["type"], "gradient");
        assert_eq!(value["colors"][1], "#fff");

        let back: CanvasBackground = serde_json::from_value(value).expect("parse");
        assert_eq!(back, gradient);
    }

    #[test]
    fn test_document_json_roundtrip() {
        let mut doc = DesignDocument::with_size(800.0, 600.0);
        doc.design_elements.push(Element::new(ElementKind::text("Hi")));
        doc.product_id = Some("prod-1".into());

        let json = doc.to_json().expect("to_json");
        assert!(json.contains("designElements"));
        assert!(!json.contains("previewImage"));

        let back = DesignDocument::from_json(&json).expect("from_json");
        assert_eq!(back, doc);
    }

    #[test]
    fn test_draw_order_is_stable_for_equal_z() {
        let mut doc = DesignDocument::new();
        let mut top = Element::new(ElementKind::text("top"));
        top.z_index = 5;
        let a = Element::new(ElementKind::text("a"));
        let b = Element::new(ElementKind::text("b"));
        doc.design_elements = vec![top.clone(), a.clone(), b.clone()];

        let order: Vec<_> = doc.draw_order().into_iter().map(|e| e.id.clone()).collect();
        assert_eq!(order, vec![a.id, b.id, top.id]);
    }
}
