//! Design persistence.
//!
//! Provides a thread-safe [`DesignRepository`] shared by the HTTP handlers.
//! Records live in memory and, when a data directory is configured, are
//! mirrored to `<data_dir>/<id>.json` on every mutation and loaded back at
//! startup. Concurrent saves to the same id are not coordinated: the last
//! write wins.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use design_core::DesignDocument;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors that can occur during repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The requested design does not exist.
    #[error("Design not found: {0}")]
    NotFound(String),
    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One persisted design.
///
/// Serializes flat: the record fields followed by the document fields. This
/// is both the on-disk format and the read model returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignRecord {
    /// Server-assigned id.
    pub id: String,
    /// Owning user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    /// Creation time, Unix milliseconds.
    pub created_at: u64,
    /// Last update time, Unix milliseconds.
    pub updated_at: u64,
    /// The sanitized document.
    #[serde(flatten)]
    pub document: DesignDocument,
}

impl DesignRecord {
    /// Product the design belongs to.
    #[must_use]
    pub fn product_id(&self) -> Option<&str> {
        self.document.product_id.as_deref()
    }

    /// Listing view of this record.
    #[must_use]
    pub fn summary(&self) -> DesignSummary {
        DesignSummary {
            id: self.id.clone(),
            owner_id: self.owner_id.clone(),
            product_id: self.product_id().map(str::to_string),
            element_count: self.document.element_count(),
            updated_at: self.updated_at,
        }
    }
}

/// Listing view of a design.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignSummary {
    /// Design id.
    pub id: String,
    /// Owning user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    /// Product reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    /// Number of elements in the document.
    pub element_count: usize,
    /// Last update time, Unix milliseconds.
    pub updated_at: u64,
}

/// Thread-safe design storage shared across HTTP handlers.
#[derive(Debug, Clone, Default)]
pub struct DesignRepository {
    records: Arc<RwLock<HashMap<String, DesignRecord>>>,
    /// Optional data directory for filesystem persistence.
    data_dir: Option<PathBuf>,
}

impl DesignRepository {
    /// Create an in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository backed by `data_dir`, loading any designs already
    /// stored there.
    ///
    /// Files that fail to parse are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Io`] if the directory cannot be created or read.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        let records = load_records(&data_dir)?;
        tracing::info!(
            "Loaded {} designs from {}",
            records.len(),
            data_dir.display()
        );
        Ok(Self {
            records: Arc::new(RwLock::new(records)),
            data_dir: Some(data_dir),
        })
    }

    /// Persistence directory, if any.
    #[must_use]
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// Store a new design under a fresh id.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written to disk. The record
    /// is not kept in memory in that case.
    pub fn create(
        &self,
        owner_id: Option<String>,
        document: DesignDocument,
    ) -> Result<DesignRecord, RepositoryError> {
        let now = current_timestamp_ms();
        let record = DesignRecord {
            id: Uuid::new_v4().to_string(),
            owner_id,
            created_at: now,
            updated_at: now,
            document,
        };
        self.persist(&record)?;
        let mut records = self
            .records
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    /// Get a design by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<DesignRecord> {
        let records = self
            .records
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        records.get(id).cloned()
    }

    /// Replace a design's document. The owner is kept unless `owner_id` is
    /// given.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if the design does not exist.
    /// Returns an error if the record cannot be written to disk.
    pub fn update(
        &self,
        id: &str,
        owner_id: Option<String>,
        document: DesignDocument,
    ) -> Result<DesignRecord, RepositoryError> {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let existing = records
            .get(id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;

        let record = DesignRecord {
            id: existing.id.clone(),
            owner_id: owner_id.or_else(|| existing.owner_id.clone()),
            created_at: existing.created_at,
            updated_at: current_timestamp_ms().max(existing.updated_at),
            document,
        };
        self.persist(&record)?;
        records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    /// Remove a design.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if the design does not exist.
    pub fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        {
            let mut records = self
                .records
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            records
                .remove(id)
                .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        }
        self.delete_file(id);
        Ok(())
    }

    /// Summaries of every design, most recently updated first, optionally
    /// restricted to one owner.
    #[must_use]
    pub fn list(&self, owner_id: Option<&str>) -> Vec<DesignSummary> {
        let records = self
            .records
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut summaries: Vec<DesignSummary> = records
            .values()
            .filter(|r| owner_id.map_or(true, |owner| r.owner_id.as_deref() == Some(owner)))
            .map(DesignRecord::summary)
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
        summaries
    }

    /// Number of stored designs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Whether no designs are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the repository can currently serve requests: the lock is
    /// healthy and, if configured, the data directory exists.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        let lock_ok = !self.records.is_poisoned();
        let dir_ok = self.data_dir.as_ref().map_or(true, |dir| dir.is_dir());
        lock_ok && dir_ok
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Write a record to disk as JSON. No-op without a data directory.
    fn persist(&self, record: &DesignRecord) -> Result<(), RepositoryError> {
        let Some(ref data_dir) = self.data_dir else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(record)?;
        let path = data_dir.join(format!("{}.json", sanitize_filename(&record.id)));
        std::fs::write(&path, json)?;
        Ok(())
    }

    /// Remove a record's file. No-op without a data directory.
    fn delete_file(&self, id: &str) {
        let Some(ref data_dir) = self.data_dir else {
            return;
        };
        let path = data_dir.join(format!("{}.json", sanitize_filename(id)));
        if path.exists() {
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::warn!("Failed to delete design file {}: {e}", path.display());
            }
        }
    }
}

/// Read every `*.json` record in `data_dir`.
fn load_records(data_dir: &Path) -> Result<HashMap<String, DesignRecord>, RepositoryError> {
    let mut records = HashMap::new();
    for entry in std::fs::read_dir(data_dir)? {
        let path = entry?.path();
        if !path.extension().is_some_and(|ext| ext == "json") {
            continue;
        }
        let parsed = std::fs::read_to_string(&path)
            .map_err(RepositoryError::from)
            .and_then(|text| serde_json::from_str::<DesignRecord>(&text).map_err(Into::into));
        match parsed {
            Ok(record) => {
                records.insert(record.id.clone(), record);
            }
            Err(e) => tracing::warn!("Skipping unreadable design file {}: {e}", path.display()),
        }
    }
    Ok(records)
}

/// Sanitize a design ID for use as a filename.
///
/// Replaces any character that is not alphanumeric, `-`, or `_` with `_`.
fn sanitize_filename(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Get the current Unix timestamp in milliseconds.
pub(crate) fn current_timestamp_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| {
        // Timestamp will not exceed u64 max for millennia
        #[allow(clippy::cast_possible_truncation)]
        {
            d.as_millis() as u64
        }
    })
}
