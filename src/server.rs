//! HTTP server wiring
//!
//! Assembles the axum application: health endpoint, rate-limited API routes,
//! and a guarded transaction endpoint that maps authorization failures to
//! structured HTTP denials.

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::authz::catalog::{actions, resources};
use crate::authz::{AuthorizationService, AuthzError, Role};
use crate::config::Config;
use crate::rate_limit::{
    rate_limit_middleware, InMemoryQuotaStore, RateLimitState, RateLimiter, API_REQUESTS,
    AUTH_ATTEMPTS,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Authorization facade
    pub authz: AuthorizationService,
}

/// Run the HTTP server until shutdown
pub async fn serve(config: &Config) -> Result<()> {
    let store = Arc::new(InMemoryQuotaStore::new());
    let limiter = Arc::new(
        RateLimiter::new(store, config.rate_limit.policy_set())
            .with_store_timeout(config.rate_limit.store_timeout()),
    );

    let app = router(limiter);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind server address")?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}

/// Build the application router
pub fn router(limiter: Arc<RateLimiter>) -> Router {
    let state = AppState {
        authz: AuthorizationService::new(),
    };

    let api = Router::new()
        .route("/api/transactions/issue", post(issue_handler))
        .layer(middleware::from_fn_with_state(
            RateLimitState::new(limiter.clone(), API_REQUESTS),
            rate_limit_middleware,
        ));

    let auth = Router::new()
        .route("/api/auth/login", post(login_handler))
        .layer(middleware::from_fn_with_state(
            RateLimitState::new(limiter, AUTH_ATTEMPTS),
            rate_limit_middleware,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .merge(api)
        .merge(auth)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Health check endpoint
async fn health_handler() -> impl IntoResponse {
    StatusCode::OK
}

#[derive(Debug, Deserialize)]
struct IssueRequest {
    role: String,
    item: String,
    quantity: u32,
}

/// Issue stock from inventory, enforcing the caller's role
async fn issue_handler(
    State(state): State<AppState>,
    Json(request): Json<IssueRequest>,
) -> Response {
    let role: Role = match request.role.parse() {
        Ok(role) => role,
        Err(err) => {
            let err = AuthzError::InvalidRole(err.0);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response();
        }
    };

    let outcome = state
        .authz
        .guard(role, actions::ISSUE, resources::INVENTORY, || {
            json!({
                "status": "issued",
                "item": request.item,
                "quantity": request.quantity,
            })
        });

    match outcome {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
}

/// Login stub behind the auth-attempts policy
///
/// Credential verification belongs to the external auth provider; this
/// endpoint exists so login traffic passes through the limiter.
async fn login_handler(Json(request): Json<LoginRequest>) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "username": request.username })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::PolicySet;
    use axum::body::Body;
    use axum::extract::ConnectInfo;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_app() -> Router {
        let limiter = Arc::new(RateLimiter::new(
            Arc::new(InMemoryQuotaStore::new()),
            PolicySet::default(),
        ));
        router(limiter)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        let mut request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo("127.0.0.1:9000".parse::<SocketAddr>().unwrap()));
        request
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_issue_allowed_for_storeman() {
        let body = json!({ "role": "storeman", "item": "pallet-jack", "quantity": 2 });
        let response = test_app()
            .oneshot(post_json("/api/transactions/issue", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_issue_forbidden_for_clerk() {
        let body = json!({ "role": "clerk", "item": "pallet-jack", "quantity": 2 });
        let response = test_app()
            .oneshot(post_json("/api/transactions/issue", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_issue_rejects_unknown_role() {
        let body = json!({ "role": "superuser", "item": "pallet-jack", "quantity": 1 });
        let response = test_app()
            .oneshot(post_json("/api/transactions/issue", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_rate_limited_after_five_attempts() {
        let app = test_app();

        for _ in 0..5 {
            let body = json!({ "username": "dock-clerk" });
            let response = app
                .clone()
                .oneshot(post_json("/api/auth/login", body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let body = json!({ "username": "dock-clerk" });
        let response = app
            .oneshot(post_json("/api/auth/login", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
