//! Liveness and readiness checks.
//!
//! `/health/live` answers while the process runs. `/health/ready` (and its
//! alias `/health`) reports whether a save could succeed right now.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::repository::DesignRepository;
use crate::AppState;

/// Overall health verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Saves are accepted.
    Healthy,
    /// Saves would fail.
    Unhealthy,
}

/// Storage part of the readiness report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageCheck {
    /// Repository lock is usable and its directory (if any) exists.
    pub ok: bool,
    /// Persistence directory, absent for in-memory storage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Designs currently held.
    pub designs: usize,
}

/// Body of `/health/ready`.
#[derive(Debug, Serialize)]
pub struct ReadinessReport {
    pub status: HealthStatus,
    pub version: &'static str,
    pub storage: StorageCheck,
}

impl ReadinessReport {
    /// Inspect `repository`.
    #[must_use]
    pub fn collect(repository: &DesignRepository) -> Self {
        let ok = repository.is_ready();
        Self {
            status: if ok {
                HealthStatus::Healthy
            } else {
                HealthStatus::Unhealthy
            },
            version: env!("CARGO_PKG_VERSION"),
            storage: StorageCheck {
                ok,
                data_dir: repository.data_dir().map(|d| d.display().to_string()),
                designs: repository.len(),
            },
        }
    }

    /// 200 when healthy, 503 otherwise.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self.status {
            HealthStatus::Healthy => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Liveness check.
#[tracing::instrument(name = "liveness_check")]
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Readiness check.
#[tracing::instrument(name = "readiness_check", skip(state))]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadinessReport>) {
    let report = ReadinessReport::collect(&state.repository);
    if report.status == HealthStatus::Unhealthy {
        tracing::warn!("Readiness check failed: design storage unavailable");
    }
    (report.status_code(), Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_repository_is_ready() {
        let report = ReadinessReport::collect(&DesignRepository::new());
        assert_eq!(report.status, HealthStatus::Healthy);
        assert_eq!(report.status_code(), StatusCode::OK);

        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["storage"]["designs"], 0);
        assert!(json["storage"].get("dataDir").is_none());
    }

    #[test]
    fn test_missing_data_dir_is_unhealthy() {
        let dir = tempfile::tempdir().expect("tempdir");
        let data_dir = dir.path().join("designs");
        let repository = DesignRepository::with_data_dir(&data_dir).expect("repository");
        assert_eq!(
            ReadinessReport::collect(&repository).status,
            HealthStatus::Healthy
        );

        std::fs::remove_dir_all(&data_dir).expect("remove");
        let report = ReadinessReport::collect(&repository);
        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert_eq!(report.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(report.storage.data_dir.is_some());
    }
}
