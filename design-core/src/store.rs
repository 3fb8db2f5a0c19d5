//! The editor-side design store.
//!
//! [`DesignStore`] owns the live [`DesignDocument`], the selection and a linear
//! [`History`] of committed snapshots. It is a plain value owned by one editor
//! session: construct it when the session opens, pass `&mut` to the views
//! that edit, drop it when the session closes. Every method is synchronous.
//!
//! The store is *clean* when the document equals the snapshot under the
//! history cursor, and *dirty* after [`DesignStore::update_elements`] until the
//! next [`DesignStore::finalize_update`], [`DesignStore::undo`] or
//! [`DesignStore::redo`]. Interactive gestures call `update_elements` on every
//! frame and `finalize_update` once at the end, so one gesture is one undo step.

use std::collections::HashSet;

use crate::document::{CanvasBackground, CanvasShape, CanvasSize, DesignDocument};
use crate::element::{Element, ElementId, ElementKind, ElementPatch, View};
use crate::error::{DesignError, DesignResult};
use crate::history::History;

/// Smallest allowed zoom factor.
pub const MIN_ZOOM: f64 = 0.1;
/// Largest allowed zoom factor.
pub const MAX_ZOOM: f64 = 3.0;
/// Offset applied to duplicated elements.
pub const DUPLICATE_OFFSET: f64 = 10.0;

/// A partially specified element for [`DesignStore::add_element`].
///
/// Unset placement fields are filled in by the store: the element is centered
/// on the canvas at its kind's default size, placed above every existing
/// element, on the store's active view.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDraft {
    /// Variant payload.
    pub kind: ElementKind,
    /// Explicit id; generated when absent.
    pub id: Option<ElementId>,
    /// Explicit left edge.
    pub x: Option<f64>,
    /// Explicit top edge.
    pub y: Option<f64>,
    /// Explicit width.
    pub width: Option<f64>,
    /// Explicit height.
    pub height: Option<f64>,
    /// Explicit draw order.
    pub z_index: Option<i32>,
    /// Explicit product face.
    pub view: Option<View>,
    /// Initial lock state.
    pub locked: bool,
}

impl ElementDraft {
    /// Draft of the given kind with every placement field left to the store.
    #[must_use]
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            id: None,
            x: None,
            y: None,
            width: None,
            height: None,
            z_index: None,
            view: None,
            locked: false,
        }
    }

    /// Use a caller-chosen id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<ElementId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Place at an explicit position.
    #[must_use]
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Use an explicit size.
    #[must_use]
    pub fn sized(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Place on an explicit product face.
    #[must_use]
    pub fn on_view(mut self, view: View) -> Self {
        self.view = Some(view);
        self
    }
}

impl From<ElementKind> for ElementDraft {
    fn from(kind: ElementKind) -> Self {
        Self::new(kind)
    }
}

/// In-memory editor state: document, selection and undo/redo history.
#[derive(Debug, Clone)]
pub struct DesignStore {
    document: DesignDocument,
    selection: HashSet<ElementId>,
    history: History<DesignDocument>,
    zoom: f64,
    active_view: View,
    dirty: bool,
}

impl Default for DesignStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DesignStore {
    /// A store holding an empty default document.
    #[must_use]
    pub fn new() -> Self {
        Self::with_document(DesignDocument::new())
    }

    /// A store seeded from an existing document, e.g. a product template.
    ///
    /// The seed is the first history entry, so undo never goes past it.
    #[must_use]
    pub fn with_document(document: DesignDocument) -> Self {
        Self {
            history: History::new(document.clone()),
            document,
            selection: HashSet::new(),
            zoom: 1.0,
            active_view: View::Front,
            dirty: false,
        }
    }

    /// Replace the document and start a fresh history from it.
    pub fn load_document(&mut self, document: DesignDocument) {
        self.history.reset(document.clone());
        self.document = document;
        self.selection.clear();
        self.dirty = false;
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    /// The live document.
    #[must_use]
    pub fn document(&self) -> &DesignDocument {
        &self.document
    }

    /// The selected ids. Ids that no longer resolve are inert.
    #[must_use]
    pub fn selection(&self) -> &HashSet<ElementId> {
        &self.selection
    }

    /// Whether `id` is selected.
    #[must_use]
    pub fn is_selected(&self, id: &ElementId) -> bool {
        self.selection.contains(id)
    }

    /// Selected elements, in document order.
    pub fn selected_elements(&self) -> impl Iterator<Item = &Element> {
        self.document
            .design_elements
            .iter()
            .filter(|e| self.selection.contains(&e.id))
    }

    /// Elements placed on the given product face, in document order.
    pub fn elements_in_view(&self, view: View) -> impl Iterator<Item = &Element> {
        self.document
            .design_elements
            .iter()
            .filter(move |e| e.view == view)
    }

    /// Current zoom factor.
    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Product face new elements are placed on.
    #[must_use]
    pub fn active_view(&self) -> View {
        self.active_view
    }

    /// Whether uncommitted element updates exist.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether [`DesignStore::undo`] would move.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether [`DesignStore::redo`] would move.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Number of history entries.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// History cursor.
    #[must_use]
    pub fn history_index(&self) -> usize {
        self.history.index()
    }

    // -----------------------------------------------------------------------
    // Elements
    // -----------------------------------------------------------------------

    /// Add an element, select only it, and commit.
    ///
    /// Always succeeds and returns the new element's id.
    pub fn add_element(&mut self, draft: impl Into<ElementDraft>) -> ElementId {
        let draft = draft.into();
        let (default_width, default_height) = draft.kind.default_size();
        let width = draft.width.unwrap_or(default_width);
        let height = draft.height.unwrap_or(default_height);
        let canvas = self.document.canvas_size;

        let mut id = draft.id.unwrap_or_default();
        while self.document.contains(&id) {
            id = ElementId::new();
        }

        let element = Element {
            id: id.clone(),
            x: draft.x.unwrap_or((canvas.width - width) / 2.0),
            y: draft.y.unwrap_or((canvas.height - height) / 2.0),
            width,
            height,
            z_index: draft
                .z_index
                .unwrap_or_else(|| self.document.max_z_index().map_or(0, |z| z.saturating_add(1))),
            rotation: 0.0,
            view: draft.view.unwrap_or(self.active_view),
            locked: draft.locked,
            kind: draft.kind,
        };
        tracing::debug!("Adding {} element {id}", element.kind.type_tag());

        self.document.design_elements.push(element);
        self.selection.clear();
        self.selection.insert(id.clone());
        self.commit();
        id
    }

    /// Change the selection.
    ///
    /// Non-additive: the selection becomes exactly `ids`. Additive: each id is
    /// toggled (shift-click). Selection is not part of history.
    pub fn select(&mut self, ids: &[ElementId], additive: bool) {
        if !additive {
            self.selection = ids.iter().cloned().collect();
            return;
        }
        for id in ids {
            if !self.selection.remove(id) {
                self.selection.insert(id.clone());
            }
        }
    }

    /// Select every element.
    pub fn select_all(&mut self) {
        self.selection = self
            .document
            .design_elements
            .iter()
            .map(|e| e.id.clone())
            .collect();
    }

    /// Empty the selection.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Merge the patch returned by `patch_fn` into each element whose id is in
    /// `ids`.
    ///
    /// Does not commit; call [`DesignStore::finalize_update`] at the end of
    /// the gesture. Returns how many elements were patched.
    pub fn update_elements<F>(&mut self, ids: &[ElementId], mut patch_fn: F) -> usize
    where
        F: FnMut(&Element) -> ElementPatch,
    {
        let targets: HashSet<&ElementId> = ids.iter().collect();
        let mut patched = 0;
        for element in &mut self.document.design_elements {
            if targets.contains(&element.id) {
                let patch = patch_fn(element);
                element.apply(patch);
                patched += 1;
            }
        }
        if patched > 0 {
            self.dirty = true;
        }
        patched
    }

    /// Merge `patch` into one element without committing.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::ElementNotFound`] if no element has `id`.
    pub fn update_element(&mut self, id: &ElementId, patch: ElementPatch) -> DesignResult<()> {
        let element = self
            .document
            .element_mut(id)
            .ok_or_else(|| DesignError::ElementNotFound(id.to_string()))?;
        element.apply(patch);
        self.dirty = true;
        Ok(())
    }

    /// Commit the current document as one undo step.
    pub fn finalize_update(&mut self) {
        self.commit();
    }

    /// Remove every selected element that exists, clear the selection, and
    /// commit. Returns how many elements were removed; nothing is committed
    /// when none were.
    pub fn delete_selected(&mut self) -> usize {
        let before = self.document.design_elements.len();
        let selection = std::mem::take(&mut self.selection);
        self.document
            .design_elements
            .retain(|e| !selection.contains(&e.id));
        let removed = before - self.document.design_elements.len();
        if removed > 0 {
            tracing::debug!("Deleted {removed} selected elements");
            self.commit();
        }
        removed
    }

    /// Copy every selected element with a fresh id, offset and stacked on top,
    /// select the copies, and commit. Returns the new ids.
    pub fn duplicate_selected(&mut self) -> Vec<ElementId> {
        let canvas = self.document.canvas_size;
        let mut next_z = self
            .document
            .max_z_index()
            .map_or(0, |z| z.saturating_add(1));
        let copies: Vec<Element> = self
            .selected_elements()
            .map(|original| {
                let mut copy = original.clone();
                copy.id = ElementId::new();
                copy.x = (copy.x + DUPLICATE_OFFSET).clamp(0.0, canvas.width.max(0.0));
                copy.y = (copy.y + DUPLICATE_OFFSET).clamp(0.0, canvas.height.max(0.0));
                copy.z_index = next_z;
                next_z = next_z.saturating_add(1);
                copy
            })
            .collect();
        if copies.is_empty() {
            return Vec::new();
        }

        let ids: Vec<ElementId> = copies.iter().map(|e| e.id.clone()).collect();
        self.document.design_elements.extend(copies);
        self.selection = ids.iter().cloned().collect();
        self.commit();
        ids
    }

    /// Move the given elements above every other element, keeping their
    /// relative order, and commit.
    pub fn bring_to_front(&mut self, ids: &[ElementId]) {
        let mut next = self
            .document
            .max_z_index()
            .map_or(0, |z| z.saturating_add(1));
        self.restack(ids, |_| {
            let z = next;
            next = next.saturating_add(1);
            z
        });
    }

    /// Move the given elements below every other element, keeping their
    /// relative order, and commit.
    pub fn send_to_back(&mut self, ids: &[ElementId]) {
        let count = i32::try_from(ids.len()).unwrap_or(i32::MAX);
        let mut next = self
            .document
            .min_z_index()
            .map_or(0, |z| z.saturating_sub(count));
        self.restack(ids, |_| {
            let z = next;
            next = next.saturating_add(1);
            z
        });
    }

    fn restack<F>(&mut self, ids: &[ElementId], mut next_z: F)
    where
        F: FnMut(&Element) -> i32,
    {
        let targets: HashSet<&ElementId> = ids.iter().collect();
        let mut ordered: Vec<&mut Element> = self
            .document
            .design_elements
            .iter_mut()
            .filter(|e| targets.contains(&e.id))
            .collect();
        if ordered.is_empty() {
            return;
        }
        ordered.sort_by_key(|e| e.z_index);
        for element in ordered {
            element.z_index = next_z(element);
        }
        self.commit();
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    /// Step back one commit. Clears the selection. Returns whether it moved.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        self.document = snapshot.clone();
        self.selection.clear();
        self.dirty = false;
        true
    }

    /// Step forward one commit. Clears the selection. Returns whether it moved.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo() else {
            return false;
        };
        self.document = snapshot.clone();
        self.selection.clear();
        self.dirty = false;
        true
    }

    fn commit(&mut self) {
        self.history.commit(self.document.clone());
        self.dirty = false;
    }

    // -----------------------------------------------------------------------
    // Canvas and view
    // -----------------------------------------------------------------------

    /// Change the canvas background and commit.
    pub fn set_canvas_background(&mut self, background: CanvasBackground) {
        self.document.canvas_background = background;
        self.commit();
    }

    /// Change the canvas size and commit. Non-positive sides are ignored.
    pub fn set_canvas_size(&mut self, size: CanvasSize) {
        let current = self.document.canvas_size;
        self.document.canvas_size = CanvasSize::new(
            if size.width > 0.0 { size.width } else { current.width },
            if size.height > 0.0 { size.height } else { current.height },
        );
        self.commit();
    }

    /// Change the canvas outline and commit.
    pub fn set_canvas_shape(&mut self, shape: CanvasShape) {
        self.document.canvas_shape = shape;
        self.commit();
    }

    /// Set the zoom factor, clamped to `[MIN_ZOOM, MAX_ZOOM]`. Non-finite
    /// input leaves the zoom unchanged. Returns the applied zoom.
    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
        self.zoom
    }

    /// Choose the product face new elements are placed on.
    pub fn set_active_view(&mut self, view: View) {
        self.active_view = view;
    }
}
