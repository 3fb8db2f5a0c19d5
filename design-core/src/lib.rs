//! # Design Core
//!
//! Document model, field sanitizer and editor store for the product canvas
//! design tool. Compiles to WASM for the in-browser editor; the save server
//! links it natively so both sides normalize documents identically.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              design-core.wasm               │
//! ├─────────────────────────────────────────────┤
//! │  Element Model   │  Field Sanitizer         │
//! │  - Elements      │  - Numbers / keywords    │
//! │  - Document      │  - Color grammar         │
//! │  - Patches       │  - Data URIs             │
//! ├─────────────────────────────────────────────┤
//! │  Normalizer      │  Design Store            │
//! │  - Documents     │  - Selection / zoom      │
//! │  - Update merge  │  - Linear undo/redo      │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod data_uri;
pub mod document;
pub mod element;
pub mod error;
pub mod history;
pub mod normalize;
pub mod sanitize;
pub mod store;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use data_uri::{has_data_scheme, is_data_uri, DataUri};
pub use document::{CanvasBackground, CanvasShape, CanvasSize, DesignDocument};
pub use element::{
    Element, ElementId, ElementKind, ElementPatch, GraphicStyle, IconStyle, ImageStyle,
    ShapeType, TableData, TextStyle, View,
};
pub use error::{DesignError, DesignResult};
pub use history::History;
pub use normalize::{normalize, parse_document, sanitize_document, Normalized};
pub use store::{DesignStore, ElementDraft};

/// Design core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
