//! Auth + rate-limit middleware for public endpoints.
//!
//! Key verification short-circuits before any rate-limit call; store
//! failures fail closed with 500 (a 429 would misreport limit state).

#[cfg(test)]
use crate::api_key::ApiScope;
use crate::api_key::OrgEnrichedApiKey;
use crate::error::AuthError;
use crate::rate_limit::{RateLimitResource, RateLimitResult, RateLimitService};
use crate::verifier::ApiKeyVerifier;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::headers::{authorization::Basic, Authorization};
use axum_extra::TypedHeader;
use axum_helpers::ErrorResponse;
use std::sync::Arc;

/// State for [`auth_and_rate_limit`], bound to one resource per route.
#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn ApiKeyVerifier>,
    pub rate_limiter: RateLimitService,
    pub resource: RateLimitResource,
}

impl AuthState {
    pub fn new(
        verifier: Arc<dyn ApiKeyVerifier>,
        rate_limiter: RateLimitService,
        resource: RateLimitResource,
    ) -> Self {
        Self {
            verifier,
            rate_limiter,
            resource,
        }
    }
}

/// Verify Basic-auth credentials, then consume one rate-limit token.
///
/// On admission the resolved [`ApiScope`] is attached as a request
/// extension for handlers downstream.
pub async fn auth_and_rate_limit(
    State(state): State<AuthState>,
    auth: Option<TypedHeader<Authorization<Basic>>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(TypedHeader(basic)) = auth else {
        return AuthError::Unauthorized("Missing Authorization header".to_string())
            .into_response();
    };

    let scope = match state.verifier.verify(basic.username(), basic.password()).await {
        Ok(scope) => scope,
        Err(e) => return e.into_response(),
    };

    match state.rate_limiter.check(&scope.api_key, state.resource).await {
        Ok(Some(result)) if !result.allowed() => {
            return rate_limit_response(&scope.api_key, &result);
        }
        Ok(_) => {}
        Err(e) => return e.into_response(),
    }

    request.extensions_mut().insert(scope);
    next.run(request).await
}

/// Build the 429 response for a depleted budget, with the standard
/// `Retry-After` and `X-RateLimit-*` headers, and count the rejection.
pub fn rate_limit_response(api_key: &OrgEnrichedApiKey, result: &RateLimitResult) -> Response {
    observability::record_increment(
        "rate_limit_exceeded",
        1,
        &[
            ("org_id".to_string(), api_key.org_id.to_string()),
            ("plan".to_string(), api_key.plan.to_string()),
            ("resource".to_string(), result.resource.as_str().to_string()),
        ],
    );

    let retry_after_secs = result.ms_before_next.div_ceil(1_000);
    let reset_epoch_secs = chrono::Utc::now().timestamp() as u64 + retry_after_secs;

    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(ErrorResponse {
            error: "TooManyRequests",
            message: format!(
                "Rate limit exceeded for resource '{}'",
                result.resource.as_str()
            ),
            details: None,
        }),
    )
        .into_response();

    let headers = response.headers_mut();
    insert_numeric_header(headers, header::RETRY_AFTER.as_str(), retry_after_secs);
    insert_numeric_header(headers, "x-ratelimit-limit", u64::from(result.points));
    insert_numeric_header(
        headers,
        "x-ratelimit-remaining",
        u64::from(result.remaining_points),
    );
    insert_numeric_header(headers, "x-ratelimit-reset", reset_epoch_secs);

    response
}

fn insert_numeric_header(headers: &mut axum::http::HeaderMap, name: &str, value: u64) {
    if let (Ok(name), Ok(value)) = (
        axum::http::HeaderName::try_from(name.to_string()),
        HeaderValue::try_from(value.to_string()),
    ) {
        headers.insert(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_key::{AccessLevel, Plan};
    use crate::verifier::MockApiKeyVerifier;
    use axum::{body::Body, http::Request as HttpRequest, middleware, routing::post, Router};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn test_scope() -> ApiScope {
        let project_id = Uuid::new_v4();
        ApiScope {
            project_id,
            access_level: AccessLevel::All,
            api_key: OrgEnrichedApiKey {
                id: Uuid::new_v4(),
                org_id: Uuid::new_v4(),
                project_id,
                plan: Plan::Default,
                rate_limit_overrides: vec![],
            },
        }
    }

    fn test_app(verifier: MockApiKeyVerifier) -> Router {
        let state = AuthState::new(
            Arc::new(verifier),
            RateLimitService::disabled(),
            RateLimitResource::Ingestion,
        );

        async fn handler(scope: axum::Extension<ApiScope>) -> String {
            scope.project_id.to_string()
        }

        Router::new()
            .route("/ingest", post(handler))
            .layer(middleware::from_fn_with_state(state, auth_and_rate_limit))
    }

    fn basic_auth_header(user: &str, pass: &str) -> String {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{user}:{pass}"));
        format!("Basic {encoded}")
    }

    #[tokio::test]
    async fn missing_auth_header_is_401_without_verifier_call() {
        let mut verifier = MockApiKeyVerifier::new();
        verifier.expect_verify().times(0);

        let app = test_app(verifier);
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/ingest")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_credentials_are_401() {
        let mut verifier = MockApiKeyVerifier::new();
        verifier
            .expect_verify()
            .returning(|_, _| Err(AuthError::Unauthorized("Invalid credentials".to_string())));

        let app = test_app(verifier);
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/ingest")
                    .header("authorization", basic_auth_header("pk-bad", "sk-bad"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_credentials_attach_scope() {
        let scope = test_scope();
        let project_id = scope.project_id;

        let mut verifier = MockApiKeyVerifier::new();
        verifier
            .expect_verify()
            .withf(|pk, sk| pk == "pk-good" && sk == "sk-good")
            .returning(move |_, _| Ok(scope.clone()));

        let app = test_app(verifier);
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/ingest")
                    .header("authorization", basic_auth_header("pk-good", "sk-good"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(body, project_id.to_string().as_bytes());
    }

    #[test]
    fn rate_limit_response_carries_standard_headers() {
        let scope = test_scope();
        let result = RateLimitResult {
            resource: RateLimitResource::Ingestion,
            points: 100,
            remaining_points: 0,
            ms_before_next: 42_000,
            consumed_points: 101,
            is_first_in_duration: false,
        };

        let response = rate_limit_response(&scope.api_key, &result);
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let headers = response.headers();
        assert_eq!(headers.get("retry-after").unwrap(), "42");
        assert_eq!(headers.get("x-ratelimit-limit").unwrap(), "100");
        assert_eq!(headers.get("x-ratelimit-remaining").unwrap(), "0");
        assert!(headers.contains_key("x-ratelimit-reset"));

        let retry_after: u64 = headers
            .get("retry-after")
            .unwrap()
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        assert!(retry_after <= 60);
    }
}
