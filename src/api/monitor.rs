//! Credential monitoring endpoints
//!
//! GET returns usage and pool snapshots, POST resets a single credential.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};

use crate::schemas::studio::{
    MonitorCommand, MonitorError, MonitorOverview, MonitorQuery, MonitorResponse, ResetResponse,
};
use crate::server::state::AppState;

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn envelope<T: serde::Serialize>(data: T) -> Response {
    Json(MonitorResponse {
        success: true,
        data,
        timestamp: timestamp(),
    })
    .into_response()
}

/// GET /api/monitor-keys?action=stats|status
///
/// Without a recognized action both snapshots are returned.
pub async fn key_stats(
    State(state): State<AppState>,
    Query(query): Query<MonitorQuery>,
) -> Response {
    let dispatcher = &state.dispatcher;
    match query.action.as_deref() {
        Some("stats") => envelope(dispatcher.usage_snapshot()),
        Some("status") => envelope(dispatcher.system_snapshot()),
        _ => envelope(MonitorOverview {
            system: dispatcher.system_snapshot(),
            keys: dispatcher.usage_snapshot(),
        }),
    }
}

/// POST /api/monitor-keys `{"action": "reset", "keyName": ...}`
pub async fn manage_key(
    State(state): State<AppState>,
    payload: Result<Json<MonitorCommand>, JsonRejection>,
) -> Result<Json<ResetResponse>, (StatusCode, Json<MonitorError>)> {
    let invalid = || {
        (
            StatusCode::BAD_REQUEST,
            Json(MonitorError {
                success: false,
                error: "Invalid action or missing keyName".to_string(),
            }),
        )
    };

    let Ok(Json(command)) = payload else {
        return Err(invalid());
    };

    let key_name = match (command.action.as_deref(), command.key_name) {
        (Some("reset"), Some(key_name)) if !key_name.is_empty() => key_name,
        _ => return Err(invalid()),
    };

    let success = state.dispatcher.reset_one(&key_name);
    let message = if success {
        format!("API key {} rate limit has been reset", key_name)
    } else {
        format!("API key {} was not rate limited or doesn't exist", key_name)
    };

    Ok(Json(ResetResponse {
        success,
        message,
        timestamp: timestamp(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{get_json, post_json, test_app, ALL_KEYS};
    use crate::dispatcher::Feature;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_stats_reflect_usage() {
        let (app, state, _) = test_app(&ALL_KEYS);
        state
            .studio
            .generate_image("a fox", Feature::StyleTransfer)
            .await
            .unwrap();

        let (status, body) = get_json(app, "/api/monitor-keys?action=stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(body["timestamp"].is_string());

        let keys = body["data"].as_array().unwrap();
        assert_eq!(keys.len(), 10);
        assert_eq!(
            keys[0],
            json!({
                "keyName": "GEMINI_API_KEY_3",
                "usageCount": 1,
                "isRateLimited": false,
                "feature": "style-transfer"
            })
        );
    }

    #[tokio::test]
    async fn test_status_counts_rate_limited() {
        let (app, state, _) = test_app(&ALL_KEYS);
        state.dispatcher.mark_unhealthy("GEMINI_API_KEY_8");

        let (status, body) = get_json(app, "/api/monitor-keys?action=status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["data"],
            json!({
                "totalKeys": 10,
                "availableKeys": 9,
                "rateLimitedKeys": 1,
                "totalRequests": 0
            })
        );
    }

    #[tokio::test]
    async fn test_default_returns_both() {
        let (app, _, _) = test_app(&ALL_KEYS);
        let (status, body) = get_json(app, "/api/monitor-keys").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["system"]["totalKeys"], 10);
        assert_eq!(body["data"]["keys"].as_array().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_reset_key() {
        let (app, state, _) = test_app(&ALL_KEYS);
        state.dispatcher.mark_unhealthy("GEMINI_API_KEY_2");

        let (status, body) = post_json(
            app.clone(),
            "/api/monitor-keys",
            json!({"action": "reset", "keyName": "GEMINI_API_KEY_2"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "API key GEMINI_API_KEY_2 rate limit has been reset");
        assert!(state.dispatcher.is_healthy("GEMINI_API_KEY_2"));

        let (status, body) = post_json(
            app,
            "/api/monitor-keys",
            json!({"action": "reset", "keyName": "GEMINI_API_KEY_2"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(
            body["message"],
            "API key GEMINI_API_KEY_2 was not rate limited or doesn't exist"
        );
    }

    #[tokio::test]
    async fn test_invalid_command() {
        let (app, _, _) = test_app(&ALL_KEYS);
        let (status, body) =
            post_json(app, "/api/monitor-keys", json!({"action": "purge"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"success": false, "error": "Invalid action or missing keyName"})
        );
    }
}
