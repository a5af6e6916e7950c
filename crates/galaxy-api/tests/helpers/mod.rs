//! Shared helpers for the HTTP tests.
//!
//! The application runs against the in-memory repositories and the moka
//! cache, so no external services are needed.

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use galaxy_cache::CacheManager;
use galaxy_core::config::{AppConfig, RuntimeEnvironment};
use galaxy_database::Repositories;

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Repositories behind the router
    pub repositories: Repositories,
}

impl TestApp {
    /// Create a new test application
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.server.environment = RuntimeEnvironment::Test;
        config.database.provider = "memory".to_string();
        config.cache.provider = "memory".to_string();

        let repositories = Repositories::in_memory();
        let state = galaxy_api::build_state(config, repositories.clone(), CacheManager::in_memory())
            .expect("Failed to build state");

        Self {
            router: galaxy_api::build_app(state),
            repositories,
        }
    }

    /// Register an account and return the response.
    pub async fn register(&self, email: &str, password: &str) -> TestResponse {
        self.request(
            "POST",
            "/api/auth/register",
            Some(serde_json::json!({ "email": email, "password": password })),
            None,
            None,
        )
        .await
    }

    /// Log in and return the response.
    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({ "email": email, "password": password })),
            None,
            None,
        )
        .await
    }

    /// Make an HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
        refresh_cookie: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::USER_AGENT, "galaxy-tests")
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1");

        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(cookie) = refresh_cookie {
            req = req.header(header::COOKIE, format!("refresh_token={cookie}"));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        self.send(req).await
    }

    /// GET `path` with a raw `Authorization` header value.
    pub async fn get_with_authorization(&self, path: &str, authorization: &str) -> TestResponse {
        let req = Request::builder()
            .method("GET")
            .uri(path)
            .header(header::AUTHORIZATION, authorization)
            .body(Body::empty())
            .expect("Failed to build request");

        self.send(req).await
    }

    async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// The `access_token` field of the body.
    pub fn access_token(&self) -> String {
        self.body["access_token"]
            .as_str()
            .expect("No access_token in response")
            .to_string()
    }

    /// The raw `Set-Cookie` header for the refresh cookie.
    pub fn refresh_set_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("refresh_token="))
            .map(String::from)
    }

    /// The refresh token value set by this response.
    pub fn refresh_token(&self) -> String {
        let cookie = self.refresh_set_cookie().expect("No refresh cookie set");
        cookie
            .trim_start_matches("refresh_token=")
            .split(';')
            .next()
            .unwrap_or_default()
            .to_string()
    }

    /// The `error` code of an error body.
    pub fn error_code(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}
