//! Canvas elements - the building blocks of a design.
//!
//! An [`Element`] carries the placement fields shared by every variant and an
//! [`ElementKind`] holding the variant payload. On the wire the two are
//! flattened into one object discriminated by `type`:
//!
//! ```json
//! { "id": "el-…", "type": "text", "x": 10, "y": 20, "width": 200, "height": 50,
//!   "zIndex": 0, "rotation": 0, "view": "Front", "locked": false,
//!   "content": "Hello", "fontFamily": "Arial", "fontSize": 24, … }
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an element.
///
/// Ids are opaque strings. Freshly generated ids combine a millisecond
/// timestamp with a random suffix, so they stay unique for the life of an
/// editing session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        let millis = now_millis();
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("el-{millis:x}-{}", &suffix[..12]))
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(not(all(feature = "wasm", target_arch = "wasm32")))]
fn now_millis() -> u128 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

// std::time is unavailable in browsers.
#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn now_millis() -> u128 {
    js_sys::Date::now() as u128
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ElementId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Declares a closed keyword enum with its wire spelling.
macro_rules! keyword_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Every accepted value, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The wire spelling of this value.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }

            /// Look up a value by its exact wire spelling.
            #[must_use]
            pub fn from_keyword(text: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|v| v.as_str() == text)
            }
        }
    };
}

keyword_enum! {
    /// Which face of the product an element is printed on.
    View {
        /// Front face.
        Front => "Front",
        /// Back face.
        Back => "Back",
    }
}

impl Default for View {
    fn default() -> Self {
        Self::Front
    }
}

keyword_enum! {
    /// Text weight.
    FontWeight {
        /// Regular weight.
        Normal => "normal",
        /// Bold weight.
        Bold => "bold",
    }
}

keyword_enum! {
    /// Text slant.
    FontStyle {
        /// Upright.
        Normal => "normal",
        /// Italic.
        Italic => "italic",
    }
}

keyword_enum! {
    /// Text decoration line.
    TextDecoration {
        /// No decoration.
        None => "none",
        /// Underlined.
        Underline => "underline",
    }
}

keyword_enum! {
    /// Horizontal text alignment.
    TextAlign {
        /// Left aligned.
        Left => "left",
        /// Centered.
        Center => "center",
        /// Right aligned.
        Right => "right",
        /// Justified.
        Justify => "justify",
    }
}

keyword_enum! {
    /// Vector shape drawn by a graphic element.
    ShapeType {
        /// Square / rectangle.
        Square => "square",
        /// Circle / ellipse.
        Circle => "circle",
        /// Triangle.
        Triangle => "triangle",
        /// Five-pointed star.
        Star => "star",
        /// Regular pentagon.
        Pentagon => "pentagon",
        /// Regular hexagon.
        Hexagon => "hexagon",
        /// Diamond.
        Diamond => "diamond",
        /// Straight line.
        Line => "line",
        /// Arrow.
        Arrow => "arrow",
    }
}

keyword_enum! {
    /// Outline dash pattern.
    StrokeStyle {
        /// Continuous outline.
        Solid => "solid",
        /// Dashed outline.
        Dashed => "dashed",
        /// Dotted outline.
        Dotted => "dotted",
    }
}

keyword_enum! {
    /// Mirror axis for a graphic.
    Flip {
        /// Mirrored left-to-right.
        Horizontal => "horizontal",
        /// Mirrored top-to-bottom.
        Vertical => "vertical",
    }
}

/// Text element payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    /// Text content.
    pub content: String,
    /// Font family name.
    pub font_family: String,
    /// Font size in canvas units.
    pub font_size: f64,
    /// Font weight.
    pub font_weight: FontWeight,
    /// Font slant.
    pub font_style: FontStyle,
    /// Decoration line.
    pub text_decoration: TextDecoration,
    /// Alignment.
    pub text_align: TextAlign,
    /// Fill color.
    pub color: String,
    /// Box background; a color or `transparent`.
    pub background_color: String,
    /// Outline color, if outlined.
    pub stroke: Option<String>,
    /// Outline width.
    pub stroke_width: f64,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
    /// Whether the text is laid out on an arc.
    pub is_curved: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            content: String::new(),
            font_family: "Arial".to_string(),
            font_size: 24.0,
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
            text_decoration: TextDecoration::None,
            text_align: TextAlign::Left,
            color: "#000000".to_string(),
            background_color: "transparent".to_string(),
            stroke: None,
            stroke_width: 0.0,
            opacity: 1.0,
            is_curved: false,
        }
    }
}

/// Image element payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStyle {
    /// Asset reference URL. Never a data URI once persisted.
    pub content: String,
    /// CSS-like filter name.
    pub filter: String,
    /// Hue rotation in degrees.
    pub hue: f64,
    /// Saturation multiplier.
    pub sat: f64,
    /// Brightness multiplier.
    pub br: f64,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
    /// Corner radius as a percentage.
    pub border_radius: f64,
}

impl Default for ImageStyle {
    fn default() -> Self {
        Self {
            content: String::new(),
            filter: "none".to_string(),
            hue: 0.0,
            sat: 1.0,
            br: 1.0,
            opacity: 1.0,
            border_radius: 0.0,
        }
    }
}

/// Vector graphic payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphicStyle {
    /// Shape to draw.
    pub shape_type: ShapeType,
    /// Fill color.
    pub fill_color: String,
    /// Outline color or `transparent`.
    pub stroke_color: String,
    /// Outline width.
    pub stroke_width: f64,
    /// Outline dash pattern.
    pub stroke_style: StrokeStyle,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
    /// Mirror axis, if mirrored.
    pub flip: Option<Flip>,
}

impl Default for GraphicStyle {
    fn default() -> Self {
        Self {
            shape_type: ShapeType::Square,
            fill_color: "#000000".to_string(),
            stroke_color: "transparent".to_string(),
            stroke_width: 0.0,
            stroke_style: StrokeStyle::Solid,
            opacity: 1.0,
            flip: None,
        }
    }
}

/// Icon payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconStyle {
    /// Symbolic icon identifier.
    pub icon: String,
    /// Fill color.
    pub color: String,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
}

impl Default for IconStyle {
    fn default() -> Self {
        Self {
            icon: String::new(),
            color: "#000000".to_string(),
            opacity: 1.0,
        }
    }
}

/// Table payload. Rows and columns are carried opaquely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    /// Row/column payload.
    #[serde(default)]
    pub content: serde_json::Value,
}

/// The variant-specific part of an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    /// A text label.
    Text(TextStyle),
    /// A raster image backed by an asset reference.
    Image(ImageStyle),
    /// A vector shape.
    Graphic(GraphicStyle),
    /// A symbolic icon.
    Icon(IconStyle),
    /// A table.
    Table(TableData),
}

impl ElementKind {
    /// Every recognized `type` tag.
    pub const TYPE_TAGS: &'static [&'static str] = &["text", "image", "graphic", "icon", "table"];

    /// The `type` tag of this variant.
    #[must_use]
    pub const fn type_tag(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Image(_) => "image",
            Self::Graphic(_) => "graphic",
            Self::Icon(_) => "icon",
            Self::Table(_) => "table",
        }
    }

    /// Default width and height for a new element of this kind.
    #[must_use]
    pub const fn default_size(&self) -> (f64, f64) {
        match self {
            Self::Text(_) => (200.0, 50.0),
            Self::Image(_) => (200.0, 200.0),
            Self::Graphic(_) => (100.0, 100.0),
            Self::Icon(_) => (48.0, 48.0),
            Self::Table(_) => (300.0, 150.0),
        }
    }

    /// Text element with the given content and default styling.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(TextStyle {
            content: content.into(),
            ..TextStyle::default()
        })
    }

    /// Image element pointing at an asset reference.
    #[must_use]
    pub fn image(content: impl Into<String>) -> Self {
        Self::Image(ImageStyle {
            content: content.into(),
            ..ImageStyle::default()
        })
    }

    /// Graphic element of the given shape with default styling.
    #[must_use]
    pub fn graphic(shape_type: ShapeType) -> Self {
        Self::Graphic(GraphicStyle {
            shape_type,
            ..GraphicStyle::default()
        })
    }

    /// Icon element with the given identifier.
    #[must_use]
    pub fn icon(icon: impl Into<String>) -> Self {
        Self::Icon(IconStyle {
            icon: icon.into(),
            ..IconStyle::default()
        })
    }
}

/// A placed element: shared placement fields plus its variant payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Unique identifier.
    pub id: ElementId,
    /// Left edge in canvas units.
    pub x: f64,
    /// Top edge in canvas units.
    pub y: f64,
    /// Width in canvas units.
    pub width: f64,
    /// Height in canvas units.
    pub height: f64,
    /// Draw order.
    pub z_index: i32,
    /// Rotation in degrees.
    pub rotation: f64,
    /// Product face.
    #[serde(default)]
    pub view: View,
    /// Locked elements are not meant to be moved by the editor.
    #[serde(default)]
    pub locked: bool,
    /// Variant payload.
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl Element {
    /// Create a new element of the given kind at the origin with its default size.
    #[must_use]
    pub fn new(kind: ElementKind) -> Self {
        let (width, height) = kind.default_size();
        Self {
            id: ElementId::new(),
            x: 0.0,
            y: 0.0,
            width,
            height,
            z_index: 0,
            rotation: 0.0,
            view: View::Front,
            locked: false,
            kind,
        }
    }

    /// Set the position.
    #[must_use]
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Set the size.
    #[must_use]
    pub fn sized(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Shallow-merge a patch into this element. The id is never touched.
    pub fn apply(&mut self, patch: ElementPatch) {
        let ElementPatch {
            x,
            y,
            width,
            height,
            z_index,
            rotation,
            view,
            locked,
            kind,
        } = patch;
        if let Some(x) = x {
            self.x = x;
        }
        if let Some(y) = y {
            self.y = y;
        }
        if let Some(width) = width {
            self.width = width;
        }
        if let Some(height) = height {
            self.height = height;
        }
        if let Some(z_index) = z_index {
            self.z_index = z_index;
        }
        if let Some(rotation) = rotation {
            self.rotation = rotation;
        }
        if let Some(view) = view {
            self.view = view;
        }
        if let Some(locked) = locked {
            self.locked = locked;
        }
        if let Some(kind) = kind {
            self.kind = kind;
        }
    }
}

/// Fields to overwrite on an element. `None` leaves a field unchanged.
///
/// Deserializes from a camelCase object of placement fields; the variant
/// payload is never read from JSON.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementPatch {
    /// New left edge.
    pub x: Option<f64>,
    /// New top edge.
    pub y: Option<f64>,
    /// New width.
    pub width: Option<f64>,
    /// New height.
    pub height: Option<f64>,
    /// New draw order.
    pub z_index: Option<i32>,
    /// New rotation.
    pub rotation: Option<f64>,
    /// New product face.
    pub view: Option<View>,
    /// New lock state.
    pub locked: Option<bool>,
    /// Replacement variant payload.
    #[serde(skip)]
    pub kind: Option<ElementKind>,
}

impl ElementPatch {
    /// Patch that moves an element.
    #[must_use]
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Patch that resizes an element.
    #[must_use]
    pub fn size(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    /// Patch that rotates an element.
    #[must_use]
    pub fn rotation(degrees: f64) -> Self {
        Self {
            rotation: Some(degrees),
            ..Self::default()
        }
    }

    /// Patch that replaces the variant payload.
    #[must_use]
    pub fn kind(kind: ElementKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }
}

/// Patch that overwrites every field except the id.
impl From<Element> for ElementPatch {
    fn from(element: Element) -> Self {
        Self {
            x: Some(element.x),
            y: Some(element.y),
            width: Some(element.width),
            height: Some(element.height),
            z_index: Some(element.z_index),
            rotation: Some(element.rotation),
            view: Some(element.view),
            locked: Some(element.locked),
            kind: Some(element.kind),
        }
    }
}
