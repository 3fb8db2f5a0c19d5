//! WebAssembly bindings for design-core.
//!
//! This module provides JavaScript-callable functions when compiled to WASM.
//! Documents and elements cross the boundary as JSON strings in the same
//! camelCase shape the save server accepts.

use std::collections::HashMap;

use wasm_bindgen::prelude::*;

use crate::normalize::{parse_document, sanitize_element};
use crate::{
    CanvasBackground, DesignStore, Element, ElementDraft, ElementId, ElementPatch, View,
};

/// Initialize the design WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Editor store instance for WASM.
#[wasm_bindgen]
pub struct WasmDesignStore {
    store: DesignStore,
}

#[wasm_bindgen]
impl WasmDesignStore {
    /// Create a store holding an empty default document.
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: DesignStore::new(),
        }
    }

    /// Get the live document as JSON.
    #[wasm_bindgen(js_name = getDocumentJson)]
    #[must_use]
    pub fn get_document_json(&self) -> String {
        self.store.document().to_json().unwrap_or_default()
    }

    /// Replace the document with a sanitized copy of `json` and reset history.
    ///
    /// # Errors
    ///
    /// Returns an error string if `json` is not a JSON object.
    #[wasm_bindgen(js_name = loadDocumentJson)]
    pub fn load_document_json(&mut self, json: &str) -> Result<(), String> {
        let normalized = parse_document(json, None).map_err(|e| e.to_string())?;
        self.store.load_document(normalized.document);
        Ok(())
    }

    /// Add an element described by `json` (a raw element object) and return
    /// its id. Placement fields absent from `json` are filled in by the store.
    ///
    /// # Errors
    ///
    /// Returns an error string if `json` is not an element of a known type.
    #[wasm_bindgen(js_name = addElementJson)]
    pub fn add_element_json(&mut self, json: &str) -> Result<String, String> {
        let raw: serde_json::Value = serde_json::from_str(json).map_err(|e| e.to_string())?;
        let element = sanitize_element(&raw, self.store.document().canvas_size)
            .ok_or_else(|| "Unsupported element type".to_string())?;

        let mut draft = ElementDraft::new(element.kind);
        if raw.get("id").is_some() {
            draft = draft.with_id(element.id);
        }
        if raw.get("x").is_some() || raw.get("y").is_some() {
            draft = draft.at(element.x, element.y);
        }
        if raw.get("width").is_some() || raw.get("height").is_some() {
            draft = draft.sized(element.width, element.height);
        }
        if raw.get("view").is_some() {
            draft = draft.on_view(element.view);
        }
        Ok(self.store.add_element(draft).to_string())
    }

    /// Replace the selection (or toggle ids when `additive`).
    ///
    /// # Errors
    ///
    /// Returns an error string if `ids_json` is not an array of strings.
    #[wasm_bindgen(js_name = select)]
    pub fn select(&mut self, ids_json: &str, additive: bool) -> Result<(), String> {
        let ids: Vec<ElementId> = serde_json::from_str(ids_json).map_err(|e| e.to_string())?;
        self.store.select(&ids, additive);
        Ok(())
    }

    /// Selected ids as a JSON array.
    #[wasm_bindgen(js_name = getSelectionJson)]
    #[must_use]
    pub fn get_selection_json(&self) -> String {
        let mut ids: Vec<&ElementId> = self.store.selection().iter().collect();
        ids.sort();
        serde_json::to_string(&ids).unwrap_or_default()
    }

    /// Apply a placement patch (`{x, y, width, height, rotation, zIndex,
    /// view, locked}`) to one element without committing.
    ///
    /// # Errors
    ///
    /// Returns an error string if the patch is malformed or the id is unknown.
    #[wasm_bindgen(js_name = updateElement)]
    pub fn update_element(&mut self, id: &str, patch_json: &str) -> Result<(), String> {
        let patch: ElementPatch = serde_json::from_str(patch_json).map_err(|e| e.to_string())?;
        self.store
            .update_element(&ElementId::from(id), patch)
            .map_err(|e| e.to_string())
    }

    /// Shallow-merge `patch_json` onto each listed element's JSON and
    /// re-sanitize it without committing. `type` and `id` in the patch are
    /// ignored. Returns how many elements were updated.
    ///
    /// # Errors
    ///
    /// Returns an error string if `ids_json` is not an array of strings or
    /// `patch_json` is not a JSON object.
    #[wasm_bindgen(js_name = updateElements)]
    pub fn update_elements(&mut self, ids_json: &str, patch_json: &str) -> Result<usize, String> {
        let ids: Vec<ElementId> = serde_json::from_str(ids_json).map_err(|e| e.to_string())?;
        let patch: serde_json::Value =
            serde_json::from_str(patch_json).map_err(|e| e.to_string())?;
        let patch = patch
            .as_object()
            .ok_or_else(|| "Element patch must be a JSON object".to_string())?;

        let document = self.store.document();
        let mut replacements: HashMap<ElementId, Element> = HashMap::new();
        for id in &ids {
            let Some(element) = document.element(id) else {
                continue;
            };
            let mut merged = serde_json::to_value(element).map_err(|e| e.to_string())?;
            if let Some(fields) = merged.as_object_mut() {
                for (key, value) in patch {
                    if key != "type" && key != "id" {
                        fields.insert(key.clone(), value.clone());
                    }
                }
            }
            if let Some(updated) = sanitize_element(&merged, document.canvas_size) {
                replacements.insert(id.clone(), updated);
            }
        }

        let ids: Vec<ElementId> = replacements.keys().cloned().collect();
        Ok(self.store.update_elements(&ids, |element| {
            replacements
                .remove(&element.id)
                .map(ElementPatch::from)
                .unwrap_or_default()
        }))
    }

    /// Commit pending updates as one undo step.
    #[wasm_bindgen(js_name = finalizeUpdate)]
    pub fn finalize_update(&mut self) {
        self.store.finalize_update();
    }

    /// Delete the selected elements. Returns how many were removed.
    #[wasm_bindgen(js_name = deleteSelected)]
    pub fn delete_selected(&mut self) -> usize {
        self.store.delete_selected()
    }

    /// Undo one step.
    #[wasm_bindgen]
    pub fn undo(&mut self) -> bool {
        self.store.undo()
    }

    /// Redo one step.
    #[wasm_bindgen]
    pub fn redo(&mut self) -> bool {
        self.store.redo()
    }

    /// Set a solid canvas background.
    #[wasm_bindgen(js_name = setBackgroundColor)]
    pub fn set_background_color(&mut self, color: &str) {
        self.store
            .set_canvas_background(CanvasBackground::solid(color));
    }

    /// Set the zoom factor; returns the clamped value.
    #[wasm_bindgen(js_name = setZoom)]
    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        self.store.set_zoom(zoom)
    }

    /// Choose the product face (`"Front"` or `"Back"`) for new elements.
    #[wasm_bindgen(js_name = setActiveView)]
    pub fn set_active_view(&mut self, view: &str) {
        self.store
            .set_active_view(View::from_keyword(view).unwrap_or_default());
    }

    /// Whether undo would move.
    #[wasm_bindgen(js_name = canUndo)]
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.store.can_undo()
    }

    /// Whether redo would move.
    #[wasm_bindgen(js_name = canRedo)]
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.store.can_redo()
    }
}

impl Default for WasmDesignStore {
    fn default() -> Self {
        Self::new()
    }
}
