//! Rate Limit Middleware
//!
//! HTTP boundary for the limiter: derives the caller identifier from the
//! connection's network address and answers 429 with a JSON body when the
//! quota is exhausted. Allowed requests pass through unmodified apart from an
//! `X-RateLimit-Remaining` header.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, warn};

use super::limiter::RateLimiter;

/// Identifier reported when the caller's address cannot be determined
pub const UNKNOWN_IDENTIFIER: &str = "unknown";

/// State handed to the middleware: the limiter plus the policy it enforces
#[derive(Clone)]
pub struct RateLimitState {
    /// Shared limiter
    pub limiter: Arc<RateLimiter>,

    /// Name of the policy this layer enforces
    pub policy: String,
}

impl RateLimitState {
    /// Create middleware state for one policy
    pub fn new(limiter: Arc<RateLimiter>, policy: &str) -> Self {
        Self {
            limiter,
            policy: policy.to_string(),
        }
    }
}

/// Check the caller against the configured policy before running the request
///
/// Wire with `axum::middleware::from_fn_with_state` and serve the app with
/// `into_make_service_with_connect_info::<SocketAddr>()` so the caller address
/// is available.
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    let identifier = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_IDENTIFIER.to_string());

    match state.limiter.check(&identifier, &state.policy).await {
        Ok(decision) if decision.allowed => {
            let remaining = decision.remaining;
            let mut response = next.run(request).await;
            if let Ok(value) = HeaderValue::from_str(&remaining.to_string()) {
                response
                    .headers_mut()
                    .insert("x-ratelimit-remaining", value);
            }
            response
        }
        Ok(decision) => {
            warn!(identifier, policy = %state.policy, "rate limit exceeded");
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({
                    "error": "Too many requests, please try again later",
                    "resetTime": decision.reset_at.timestamp_millis(),
                })),
            )
                .into_response()
        }
        Err(err) => {
            // Unknown policy is a wiring bug, not caller traffic
            error!(policy = %state.policy, error = %err, "rate limit middleware misconfigured");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal server error" })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::policy::{PolicySet, RateLimitPolicy};
    use crate::rate_limit::store::InMemoryQuotaStore;
    use axum::{body::Body, middleware, routing::get, Router};
    use tower::ServiceExt;

    fn app(max_requests: u32) -> Router {
        let policies = PolicySet::empty().with_policy("test", RateLimitPolicy::new(max_requests, 60));
        let limiter = Arc::new(RateLimiter::new(Arc::new(InMemoryQuotaStore::new()), policies));
        let state = RateLimitState::new(limiter, "test");

        Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(middleware::from_fn_with_state(state, rate_limit_middleware))
    }

    fn request_from(addr: &str) -> Request {
        let mut request = Request::builder()
            .uri("/ping")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(addr.parse::<SocketAddr>().unwrap()));
        request
    }

    #[tokio::test]
    async fn test_allowed_request_passes_through() {
        let app = app(2);

        let response = app.oneshot(request_from("203.0.113.5:4000")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("x-ratelimit-remaining").unwrap(),
            "1"
        );
    }

    #[tokio::test]
    async fn test_denied_request_gets_429_with_reset_time() {
        let app = app(1);

        let response = app
            .clone()
            .oneshot(request_from("203.0.113.5:4000"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(request_from("203.0.113.5:4001")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let bytes = axum::body::to_bytes(response.into_body(), 16 * 1024)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].as_str().unwrap().contains("Too many requests"));
        assert!(body["resetTime"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_missing_connect_info_uses_sentinel() {
        let app = app(1);

        let request = Request::builder()
            .uri("/ping")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Second anonymous request shares the sentinel quota
        let request = Request::builder()
            .uri("/ping")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_different_addresses_have_separate_quotas() {
        let app = app(1);

        let response = app
            .clone()
            .oneshot(request_from("198.51.100.1:1000"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(request_from("198.51.100.2:1000")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
