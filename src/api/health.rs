//! Health check endpoints
//!
//! This module provides health check endpoints for monitoring
//! and container orchestration (Kubernetes, ECS, etc.)

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::server::state::AppState;

/// Response for the main health check endpoint
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub uptime_seconds: u64,
    pub credentials: usize,
}

/// Response for readiness probe
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub checks: ReadinessChecks,
}

/// Individual readiness checks
#[derive(Debug, Serialize)]
pub struct ReadinessChecks {
    pub config_loaded: bool,
    pub healthy_credential: bool,
}

/// Response for liveness probe
#[derive(Serialize)]
pub struct LivenessResponse {
    pub alive: bool,
}

/// Main health check endpoint
///
/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.settings.app_version.clone(),
        environment: state.settings.environment.to_string(),
        uptime_seconds: state.uptime_seconds(),
        credentials: state.dispatcher.pool().len(),
    })
}

/// Readiness probe endpoint
///
/// Ready while at least one credential is healthy.
///
/// GET /ready
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let checks = ReadinessChecks {
        config_loaded: true,
        healthy_credential: state.dispatcher.has_healthy_credential(),
    };

    let ready = checks.config_loaded && checks.healthy_credential;
    let status = if ready {
        StatusCode::OK
    } else {
        tracing::warn!(checks = ?checks, "Service not ready");
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(ReadinessResponse { ready, checks }))
}

/// Liveness probe endpoint
///
/// GET /liveness
pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse { alive: true })
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{get_json, test_app};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health_reports_pool_size() {
        let (app, _, _) = test_app(&["GEMINI_API_KEY", "GEMINI_API_KEY_1"]);
        let (status, body) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["credentials"], 2);
    }

    #[tokio::test]
    async fn test_ready_tracks_credential_health() {
        let (app, state, _) = test_app(&["GEMINI_API_KEY"]);
        let (status, body) = get_json(app.clone(), "/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ready"], true);

        state.dispatcher.mark_unhealthy("GEMINI_API_KEY");
        let (status, body) = get_json(app, "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["checks"]["healthy_credential"], false);
    }

    #[tokio::test]
    async fn test_liveness() {
        let (app, _, _) = test_app(&["GEMINI_API_KEY"]);
        let (status, body) = get_json(app, "/liveness").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["alive"], true);
    }
}
