use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::{auth, handlers, AppState};

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .route("/ws", get(handlers::ws::ws_handler));

    let protected_routes = Router::new()
        // Check-ins
        .route(
            "/api/check-ins",
            post(handlers::check_ins::record_check_in).get(handlers::check_ins::list_check_ins),
        )
        .route("/api/check-ins/today", get(handlers::check_ins::checked_in_on))
        .route("/api/check-ins/trend", get(handlers::check_ins::get_trend))
        // Streaks & achievements
        .route("/api/streak", get(handlers::streaks::get_streak))
        .route("/api/achievements", get(handlers::achievements::list_achievements))
        // Challenges
        .route(
            "/api/challenges/complete",
            post(handlers::challenges::complete_challenge),
        )
        // Prompts
        .route("/api/prompts/:mood", get(handlers::prompts::get_prompt))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(|| async { AppError::NotFound("Route not found".into()) })
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use chrono::Duration;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tokio::sync::broadcast;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::auth::jwt::issue_test_token;
    use crate::config::Config;
    use crate::engine::MoodEngine;
    use crate::handlers::server_today;
    use crate::models::preferences::SubscriptionTier;
    use crate::prompts::TemplatePromptGenerator;
    use crate::store::MemoryStore;

    fn app() -> (MemoryStore, Router) {
        let store = MemoryStore::new();
        let (ws_tx, _) = broadcast::channel::<String>(16);
        let state = AppState {
            store: Arc::new(store.clone()),
            engine: MoodEngine::new(Arc::new(store.clone())),
            config: Arc::new(Config::for_tests()),
            ws_tx: Some(ws_tx),
            prompts: Arc::new(TemplatePromptGenerator),
        };
        (store, router(state, CorsLayer::new()))
    }

    fn bearer(user: Uuid) -> String {
        format!("Bearer {}", issue_test_token(user, "test-secret", 600))
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_json(uri: &str, user: Uuid, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::AUTHORIZATION, bearer(user))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_as(uri: &str, user: Uuid) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, bearer(user))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let (_, app) = app();
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "moodarc-api");
    }

    #[tokio::test]
    async fn test_readyz_reports_store_outage() {
        let (store, app) = app();
        store.set_offline(true);
        let req = Request::builder().uri("/readyz").body(Body::empty()).unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["checks"]["store"], "failed");
    }

    #[tokio::test]
    async fn test_check_in_requires_token() {
        let (_, app) = app();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/check-ins")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "mood": "happy" }).to_string()))
            .unwrap();
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_check_in_then_duplicate_is_friendly_conflict() {
        let (_, app) = app();
        let user = Uuid::new_v4();

        let (status, body) = send(
            &app,
            post_json("/api/check-ins", user, json!({ "mood": "happy", "notes": "good day" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["check_in"]["mood"], "happy");
        assert_eq!(body["streak"]["current_streak"], 1);
        assert_eq!(body["new_achievements"], json!([]));

        let (status, body) = send(
            &app,
            post_json("/api/check-ins", user, json!({ "mood": "sad" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["kind"], "duplicate_check_in");
        assert_eq!(
            body["error"]["message"],
            "You already checked in today. Come back tomorrow!"
        );

        let (status, body) = send(&app, get_as("/api/check-ins/today", user)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checked_in"], true);
    }

    #[tokio::test]
    async fn test_unknown_mood_is_invalid_input() {
        let (_, app) = app();
        let (status, body) = send(
            &app,
            post_json("/api/check-ins", Uuid::new_v4(), json!({ "mood": "anxious" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["kind"], "invalid_input");
    }

    #[tokio::test]
    async fn test_date_outside_window_is_rejected() {
        let (_, app) = app();
        let stale = server_today() - Duration::days(3);
        let (status, _) = send(
            &app,
            post_json(
                "/api/check-ins",
                Uuid::new_v4(),
                json!({ "mood": "neutral", "date": stale }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_store_outage_is_retryable_error() {
        let (store, app) = app();
        store.set_offline(true);
        let (status, body) = send(
            &app,
            post_json("/api/check-ins", Uuid::new_v4(), json!({ "mood": "happy" })),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["kind"], "persistence");
    }

    #[tokio::test]
    async fn test_streak_and_list_reflect_yesterday_and_today() {
        let (_, app) = app();
        let user = Uuid::new_v4();
        let today = server_today();
        let yesterday = today - Duration::days(1);

        for date in [yesterday, today] {
            let (status, _) = send(
                &app,
                post_json("/api/check-ins", user, json!({ "mood": "neutral", "date": date })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = send(&app, get_as("/api/streak", user)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["current_streak"], 2);

        let (status, body) = send(&app, get_as("/api/check-ins", user)).await;
        assert_eq!(status, StatusCode::OK);
        let dates: Vec<String> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["date"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(dates, vec![yesterday.to_string(), today.to_string()]);
    }

    #[tokio::test]
    async fn test_first_challenge_unlocks_badge() {
        let (_, app) = app();
        let user = Uuid::new_v4();

        let (status, body) = send(
            &app,
            post_json("/api/challenges/complete", user, json!({ "response": "I went for a walk" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_completed"], 1);
        assert_eq!(body["new_achievements"][0]["id"], "first_challenge");

        let (_, body) = send(&app, get_as("/api/achievements", user)).await;
        let first = body
            .as_array()
            .unwrap()
            .iter()
            .find(|a| a["id"] == "first_challenge")
            .unwrap();
        assert!(first["earned_at"].is_string());
    }

    #[tokio::test]
    async fn test_free_tier_gets_template_prompt() {
        let (_, app) = app();
        let (status, body) = send(&app, get_as("/api/prompts/sad", Uuid::new_v4())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mood"], "sad");
        assert_eq!(body["source"], "template");
    }

    #[tokio::test]
    async fn test_premium_prompt_still_succeeds_without_llm() {
        let (store, app) = app();
        let user = Uuid::new_v4();
        store.set_tier(user, SubscriptionTier::Premium).await;
        let (status, body) = send(&app, get_as("/api/prompts/fearful", user)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body["prompt"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_trend_window_is_clamped_to_entitlement() {
        let (_, app) = app();
        let (status, body) = send(&app, get_as("/api/check-ins/trend?days=400", Uuid::new_v4())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["series"].as_array().unwrap().len(), 30);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let (_, app) = app();
        let req = Request::builder().uri("/nope").body(Body::empty()).unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["kind"], "not_found");
    }
}
