//! HTTP tests for the authentication flow.

mod helpers;

use axum::http::StatusCode;

use galaxy_database::SessionRepository;

const EMAIL: &str = "a@x.com";
const PASSWORD: &str = "Str0ng!Pass";

#[tokio::test]
async fn test_register_sets_refresh_cookie() {
    let app = helpers::TestApp::new();
    let response = app.register(EMAIL, PASSWORD).await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert!(response.body.get("access_token").is_some());
    assert!(response.body.get("refresh_token").is_none());
    assert_eq!(response.body["user"]["email"], EMAIL);
    assert!(response.body["user"].get("password_hash").is_none());

    let cookie = response.refresh_set_cookie().expect("refresh cookie");
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Path=/api/auth"));
    assert!(cookie.contains("Max-Age="));
    assert!(!cookie.contains("Secure"));
}

#[tokio::test]
async fn test_register_rejections() {
    let app = helpers::TestApp::new();
    app.register(EMAIL, PASSWORD).await;

    let duplicate = app.register(EMAIL, PASSWORD).await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let weak = app.register("b@x.com", "password").await;
    assert_eq!(weak.status, StatusCode::BAD_REQUEST);
    assert_eq!(weak.error_code(), "WEAK_PASSWORD");
    assert_eq!(weak.body["details"]["checks"]["not_common"], false);
    assert_eq!(weak.body["details"]["strength"], "weak");

    let malformed = app.register("not-an-email", PASSWORD).await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert_eq!(malformed.error_code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_login_failures_are_uniform() {
    let app = helpers::TestApp::new();
    app.register(EMAIL, PASSWORD).await;

    let wrong = app.login(EMAIL, "Wr0ng!Pass").await;
    let unknown = app.login("nobody@x.com", PASSWORD).await;

    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.body, unknown.body);
    assert_eq!(wrong.error_code(), "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_lockout_returns_429() {
    let app = helpers::TestApp::new();
    app.register(EMAIL, PASSWORD).await;

    for _ in 0..4 {
        assert_eq!(
            app.login(EMAIL, "Wr0ng!Pass").await.status,
            StatusCode::UNAUTHORIZED
        );
    }
    assert_eq!(
        app.login(EMAIL, "Wr0ng!Pass").await.status,
        StatusCode::TOO_MANY_REQUESTS
    );

    let correct = app.login(EMAIL, PASSWORD).await;
    assert_eq!(correct.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(correct.error_code(), "ACCOUNT_LOCKED");
}

#[tokio::test]
async fn test_full_token_lifecycle() {
    let app = helpers::TestApp::new();
    app.register(EMAIL, PASSWORD).await;

    let login = app.login(EMAIL, PASSWORD).await;
    assert_eq!(login.status, StatusCode::OK);
    let access = login.access_token();
    let refresh = login.refresh_token();

    let rotated = app
        .request("POST", "/api/auth/refresh", None, None, Some(&refresh))
        .await;
    assert_eq!(rotated.status, StatusCode::OK);
    let new_refresh = rotated.refresh_token();
    assert_ne!(new_refresh, refresh);

    let replay = app
        .request("POST", "/api/auth/refresh", None, None, Some(&refresh))
        .await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);
    assert_eq!(replay.error_code(), "INVALID_REFRESH_TOKEN");

    let verify = app
        .request("GET", "/api/auth/verify", None, Some(&access), None)
        .await;
    assert_eq!(verify.status, StatusCode::OK);
    assert_eq!(verify.body["valid"], true);
    assert_eq!(verify.body["role"], "user");

    let logout = app
        .request("POST", "/api/auth/logout", None, Some(&access), Some(&new_refresh))
        .await;
    assert_eq!(logout.status, StatusCode::OK);
    let cleared = logout.refresh_set_cookie().expect("cleared cookie");
    assert!(cleared.contains("Max-Age=0"));

    let verify = app
        .request("GET", "/api/auth/verify", None, Some(&access), None)
        .await;
    assert_eq!(verify.status, StatusCode::FORBIDDEN);
    assert_eq!(verify.body["valid"], false);
    assert_eq!(verify.body["error"], "TOKEN_REVOKED");

    let after_logout = app
        .request("POST", "/api/auth/refresh", None, None, Some(&new_refresh))
        .await;
    assert_eq!(after_logout.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_audit_row_records_client() {
    let app = helpers::TestApp::new();
    let response = app.register(EMAIL, PASSWORD).await;
    let access = response.access_token();

    let me = app
        .request("GET", "/api/auth/me", None, Some(&access), None)
        .await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["email"], EMAIL);

    let verify = app
        .request("GET", "/api/auth/verify", None, Some(&access), None)
        .await;
    let user_id = verify.body["user_id"].as_str().unwrap().parse().unwrap();
    let sessions = app
        .repositories
        .sessions
        .list_for_user(user_id)
        .await
        .unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].ip_address.as_deref(), Some("203.0.113.7"));
    assert_eq!(sessions[0].user_agent.as_deref(), Some("galaxy-tests"));
}

#[tokio::test]
async fn test_missing_tokens() {
    let app = helpers::TestApp::new();

    let verify = app.request("GET", "/api/auth/verify", None, None, None).await;
    assert_eq!(verify.status, StatusCode::UNAUTHORIZED);
    assert_eq!(verify.body["valid"], false);
    assert_eq!(verify.body["error"], "NO_AUTH_TOKEN");

    let logout = app.request("POST", "/api/auth/logout", None, None, None).await;
    assert_eq!(logout.status, StatusCode::UNAUTHORIZED);
    assert_eq!(logout.error_code(), "NO_AUTH_TOKEN");

    let refresh = app.request("POST", "/api/auth/refresh", None, None, None).await;
    assert_eq!(refresh.status, StatusCode::UNAUTHORIZED);
    assert_eq!(refresh.error_code(), "NO_AUTH_TOKEN");

    let garbage = app
        .request("GET", "/api/auth/verify", None, Some("not.a.jwt"), None)
        .await;
    assert_eq!(garbage.status, StatusCode::FORBIDDEN);
    assert_eq!(garbage.body["error"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_verify_with_non_bearer_authorization() {
    let app = helpers::TestApp::new();

    let basic = app
        .get_with_authorization("/api/auth/verify", "Basic dXNlcjpwYXNz")
        .await;
    assert_eq!(basic.status, StatusCode::UNAUTHORIZED);
    assert_eq!(basic.body["valid"], false);
    assert_eq!(basic.body["error"], "NO_AUTH_TOKEN");

    let me = app
        .get_with_authorization("/api/auth/me", "Basic dXNlcjpwYXNz")
        .await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
    assert_eq!(me.error_code(), "NO_AUTH_TOKEN");
}

#[tokio::test]
async fn test_revoke_all() {
    let app = helpers::TestApp::new();
    let first = app.register(EMAIL, PASSWORD).await;
    let second = app.login(EMAIL, PASSWORD).await;

    let response = app
        .request(
            "POST",
            "/api/auth/revoke-all",
            None,
            Some(&second.access_token()),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["revoked"], 2);

    let replay = app
        .request(
            "POST",
            "/api/auth/refresh",
            None,
            None,
            Some(&first.refresh_token()),
        )
        .await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_change_password() {
    let app = helpers::TestApp::new();
    let registered = app.register(EMAIL, PASSWORD).await;

    let weak = app
        .request(
            "POST",
            "/api/auth/password",
            Some(serde_json::json!({
                "current_password": PASSWORD,
                "new_password": "lowercaseonly",
            })),
            Some(&registered.access_token()),
            None,
        )
        .await;
    assert_eq!(weak.status, StatusCode::BAD_REQUEST);
    assert_eq!(weak.error_code(), "WEAK_PASSWORD");
    assert_eq!(weak.body["details"]["checks"]["has_upper_case"], false);
    assert_eq!(weak.body["details"]["checks"]["has_numbers"], false);

    let response = app
        .request(
            "POST",
            "/api/auth/password",
            Some(serde_json::json!({
                "current_password": PASSWORD,
                "new_password": "N3w!Passphrase",
            })),
            Some(&registered.access_token()),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    assert_eq!(app.login(EMAIL, PASSWORD).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.login(EMAIL, "N3w!Passphrase").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_health() {
    let app = helpers::TestApp::new();
    let response = app.request("GET", "/api/health", None, None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["database"], "memory");
    assert_eq!(response.body["cache"], "memory");
}
