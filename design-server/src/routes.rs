//! API route handlers.
//!
//! Handlers are thin: decode and validate at the boundary, hand the payload to
//! the [`DocumentSanitizer`](crate::sanitizer::DocumentSanitizer), persist the
//! result. Every error leaves as `{ "error": "...", "code": "..." }`.

use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::metrics;
use crate::payload::SavePayload;
use crate::repository::{DesignRecord, DesignSummary, RepositoryError};
use crate::sanitizer::{SaveError, SaveMode};
use crate::validation::{
    validate_design_id, validate_document_limits, validate_owner_id, ValidationError,
};
use crate::AppState;

/// Errors returned by the HTTP API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The body could not be read or parsed as JSON.
    #[error("{message}")]
    Body {
        /// Status chosen by the extractor (400, 413, 415, ...).
        status: StatusCode,
        /// Extractor message.
        message: String,
    },
    /// A boundary check failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Sanitization rejected the save.
    #[error(transparent)]
    Save(#[from] SaveError),
    /// Persistence failed or the design does not exist.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Body {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl ApiError {
    /// HTTP status and machine-readable code.
    #[must_use]
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Body { status, .. } => (*status, "invalid_body"),
            Self::Validation(e) if e.is_limit() => (StatusCode::UNPROCESSABLE_ENTITY, e.kind()),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "invalid_id"),
            Self::Save(SaveError::AssetUpload(_)) => (StatusCode::BAD_GATEWAY, "asset_upload_failed"),
            Self::Save(SaveError::NotAnObject(_)) => (StatusCode::BAD_REQUEST, "invalid_payload"),
            Self::Repository(RepositoryError::NotFound(_)) => (StatusCode::NOT_FOUND, "not_found"),
            Self::Repository(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if let Self::Validation(e) = &self {
            metrics::record_validation_failure(e.kind());
        }
        if status.is_server_error() {
            tracing::error!("Request failed: {self}");
        } else {
            tracing::debug!("Request rejected ({code}): {self}");
        }
        (status, Json(json!({ "error": self.to_string(), "code": code }))).into_response()
    }
}

/// Query parameters for listing designs.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// Only list designs owned by this user.
    pub owner_id: Option<String>,
}

/// Create a design.
#[tracing::instrument(name = "create_design", skip_all)]
pub async fn create_design(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<DesignRecord>), ApiError> {
    let started = Instant::now();
    let result = save_new(&state, payload).await;
    record_outcome("create", &result, started);
    result.map(|record| (StatusCode::CREATED, Json(record)))
}

/// Update an existing design.
#[tracing::instrument(name = "update_design", skip(state, payload))]
pub async fn update_design(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<DesignRecord>, ApiError> {
    let started = Instant::now();
    let result = save_existing(&state, &id, payload).await;
    record_outcome("update", &result, started);
    result.map(Json)
}

/// Get one design.
#[tracing::instrument(name = "get_design", skip(state))]
pub async fn get_design(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DesignRecord>, ApiError> {
    validate_design_id(&id)?;
    let record = state
        .repository
        .get(&id)
        .ok_or(RepositoryError::NotFound(id))?;
    Ok(Json(record))
}

/// List design summaries.
#[tracing::instrument(name = "list_designs", skip(state))]
pub async fn list_designs(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<DesignSummary>>, ApiError> {
    if let Some(owner) = &query.owner_id {
        validate_owner_id(owner)?;
    }
    Ok(Json(state.repository.list(query.owner_id.as_deref())))
}

/// Delete a design.
#[tracing::instrument(name = "delete_design", skip(state))]
pub async fn delete_design(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    validate_design_id(&id)?;
    state.repository.delete(&id)?;
    tracing::info!("Deleted design {id}");
    Ok(StatusCode::NO_CONTENT)
}

async fn save_new(
    state: &AppState,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<DesignRecord, ApiError> {
    let payload = decode(payload)?;
    let saved = state
        .sanitizer
        .sanitize(&payload.document, SaveMode::Create)
        .await?;
    metrics::record_elements_dropped(saved.dropped_elements);

    let record = state.repository.create(payload.owner_id, saved.document)?;
    tracing::info!(
        "Created design {} with {} elements",
        record.id,
        record.document.element_count()
    );
    Ok(record)
}

async fn save_existing(
    state: &AppState,
    id: &str,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<DesignRecord, ApiError> {
    validate_design_id(id)?;
    let prior = state
        .repository
        .get(id)
        .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
    let payload = decode(payload)?;

    let saved = state
        .sanitizer
        .sanitize(&payload.document, SaveMode::Update(&prior.document))
        .await?;
    metrics::record_elements_dropped(saved.dropped_elements);
    if saved.failed_uploads > 0 {
        tracing::warn!(
            "Design {id}: {} inline images kept their previous value",
            saved.failed_uploads
        );
    }

    let record = state
        .repository
        .update(id, payload.owner_id, saved.document)?;
    tracing::info!("Updated design {id}");
    Ok(record)
}

fn decode(payload: Result<Json<Value>, JsonRejection>) -> Result<SavePayload, ApiError> {
    let Json(body) = payload?;
    let payload = SavePayload::decode(body)?;
    if let Some(owner) = &payload.owner_id {
        validate_owner_id(owner)?;
    }
    validate_document_limits(&payload.document)?;
    Ok(payload)
}

fn record_outcome<T>(operation: &str, result: &Result<T, ApiError>, started: Instant) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => e.status_and_code().1,
    };
    metrics::record_save(operation, outcome, started.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (
                ApiError::Save(SaveError::AssetUpload("x".into())),
                StatusCode::BAD_GATEWAY,
                "asset_upload_failed",
            ),
            (
                ApiError::Save(SaveError::NotAnObject("array")),
                StatusCode::BAD_REQUEST,
                "invalid_payload",
            ),
            (
                ApiError::Validation(ValidationError::TooManyElements),
                StatusCode::UNPROCESSABLE_ENTITY,
                "element_count",
            ),
            (
                ApiError::Validation(ValidationError::DesignIdInvalidChars),
                StatusCode::BAD_REQUEST,
                "invalid_id",
            ),
            (
                ApiError::Repository(RepositoryError::NotFound("d".into())),
                StatusCode::NOT_FOUND,
                "not_found",
            ),
        ];
        for (error, status, code) in cases {
            assert_eq!(error.status_and_code(), (status, code), "{error}");
        }
    }

    #[test]
    fn test_error_body_shape() {
        let response = ApiError::Repository(RepositoryError::NotFound("abc".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
