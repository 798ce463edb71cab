//! Health probes
//!
//! `/health` and `/health/live` answer as long as the process serves
//! requests; `/health/ready` also pings the database and answers 503 when
//! it is unreachable.

use crate::{db, state::AppState};
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

const SERVICE: &str = "fitpro-backend";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DependencyStatus>,
}

#[derive(Debug, Serialize)]
pub struct DependencyStatus {
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn probe(status: &'static str, database: Option<DependencyStatus>) -> HealthResponse {
    HealthResponse {
        status,
        service: SERVICE,
        version: env!("CARGO_PKG_VERSION"),
        database,
    }
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(probe("healthy", None))
}

pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    match db::health_check(state.db()).await {
        Ok(()) => Ok(Json(probe(
            "ready",
            Some(DependencyStatus {
                healthy: true,
                error: None,
            }),
        ))),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(probe(
                    "not_ready",
                    Some(DependencyStatus {
                        healthy: false,
                        error: Some(e.to_string()),
                    }),
                )),
            ))
        }
    }
}

pub async fn liveness_check() -> Json<HealthResponse> {
    Json(probe("alive", None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check_reports_service() {
        let response = health_check().await;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.service, "fitpro-backend");
        assert!(response.database.is_none());
    }

    #[tokio::test]
    async fn test_liveness_check_returns_alive() {
        assert_eq!(liveness_check().await.status, "alive");
    }
}
