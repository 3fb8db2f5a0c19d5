//! Save-time document sanitization.
//!
//! Runs the core normalizer over an untrusted payload and then replaces every
//! inline image (element `content` and `previewImage`) with a stored-asset
//! URL. On create, an image that cannot be stored fails the whole save. On
//! update, it falls back to the previously persisted value.

use design_core::normalize::{json_kind, normalize, Normalized};
use design_core::{has_data_scheme, is_data_uri, DesignDocument, ElementId, ElementKind};
use serde_json::Value;
use thiserror::Error;

use crate::resolver::AssetResolver;

/// Errors that reject a save.
#[derive(Debug, Error)]
pub enum SaveError {
    /// An inline image could not be stored while creating a design.
    #[error("asset upload failed for {0}")]
    AssetUpload(String),
    /// The payload root was not a JSON object.
    #[error("design payload must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Whether a save creates a design or updates a persisted one.
#[derive(Debug, Clone, Copy)]
pub enum SaveMode<'a> {
    /// New design; no fallback values exist.
    Create,
    /// Existing design; absent fields and failed uploads keep these values.
    Update(&'a DesignDocument),
}

impl<'a> SaveMode<'a> {
    /// The persisted document to fall back on, if any.
    #[must_use]
    pub fn prior(self) -> Option<&'a DesignDocument> {
        match self {
            Self::Create => None,
            Self::Update(doc) => Some(doc),
        }
    }
}

/// A sanitized design ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedDesign {
    /// The normalized document. No image content is a data URI.
    pub document: DesignDocument,
    /// Elements dropped for an unrecognized `type`.
    pub dropped_elements: usize,
    /// Inline images replaced by a fallback value because they could not be
    /// stored (update mode only).
    pub failed_uploads: usize,
}

/// Canvas document sanitizer.
#[derive(Clone)]
pub struct DocumentSanitizer {
    resolver: AssetResolver,
}

impl DocumentSanitizer {
    /// Create a sanitizer that stores inline images through `resolver`.
    #[must_use]
    pub fn new(resolver: AssetResolver) -> Self {
        Self { resolver }
    }

    /// Sanitize `raw` for persistence.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::NotAnObject`] if `raw` is not a JSON object.
    /// Returns [`SaveError::AssetUpload`] in create mode if an inline image
    /// could not be stored. No partial document is returned in that case.
    pub async fn sanitize(
        &self,
        raw: &Value,
        mode: SaveMode<'_>,
    ) -> Result<SanitizedDesign, SaveError> {
        if !raw.is_object() {
            return Err(SaveError::NotAnObject(json_kind(raw)));
        }
        let prior = mode.prior();

        let Normalized {
            mut document,
            dropped_elements,
        } = normalize(raw, prior);
        let mut failed_uploads = 0;

        for element in &mut document.design_elements {
            let ElementKind::Image(style) = &mut element.kind else {
                continue;
            };
            if !has_data_scheme(&style.content) {
                continue;
            }
            match self.resolve(&style.content).await {
                Some(url) => style.content = url,
                None => {
                    let Some(prior) = prior else {
                        return Err(SaveError::AssetUpload(format!("image element {}", element.id)));
                    };
                    failed_uploads += 1;
                    style.content = prior_image_content(prior, &element.id);
                }
            }
        }

        if let Some(preview) = document.preview_image.take() {
            if has_data_scheme(&preview) {
                match self.resolve(&preview).await {
                    Some(url) => document.preview_image = Some(url),
                    None => {
                        let Some(prior) = prior else {
                            return Err(SaveError::AssetUpload("previewImage".to_string()));
                        };
                        failed_uploads += 1;
                        document.preview_image = prior
                            .preview_image
                            .clone()
                            .filter(|p| !has_data_scheme(p));
                    }
                }
            } else {
                document.preview_image = Some(preview);
            }
        }

        if dropped_elements > 0 {
            tracing::debug!("Dropped {dropped_elements} elements with unsupported types");
        }
        Ok(SanitizedDesign {
            document,
            dropped_elements,
            failed_uploads,
        })
    }

    /// Resolve a `data:` string. Strings that only look like data URIs
    /// cannot be resolved.
    async fn resolve(&self, content: &str) -> Option<String> {
        let content = content.trim();
        if !is_data_uri(content) {
            tracing::warn!("Discarding malformed data URI");
            return None;
        }
        self.resolver.resolve(content).await
    }
}

/// Content of the persisted image element with `id`, or empty.
fn prior_image_content(prior: &DesignDocument, id: &ElementId) -> String {
    match prior.element(id).map(|e| &e.kind) {
        Some(ElementKind::Image(style)) if !has_data_scheme(&style.content) => {
            style.content.clone()
        }
        _ => String::new(),
    }
}
