//! Request pipeline tests: dispatch, sessions, CSRF, and guards, driven
//! end-to-end through a host router with a mock provider behind it.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use tower::ServiceExt;

use authbridge::session::SessionData;
use authbridge::Options;
use common::{body_string, build_app, mock_provider, session_cookie, session_from_response, test_options};

fn get(path: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(path)
        .body(Body::empty())
        .expect("failed to build request")
}

fn form_post(path: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

fn with_cookie(mut req: Request<Body>, cookie: &str) -> Request<Body> {
    req.headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    req
}

fn authed_session() -> SessionData {
    SessionData {
        account_id: Some("acc1".to_string()),
        csrf_token: None,
    }
}

// -- Dispatch

#[tokio::test]
async fn login_prefix_matches_loosely() {
    let server = mock_provider().await;
    let adapter = authbridge::init(test_options(&server.url())).await.unwrap();
    let app = build_app(&adapter);

    // Literal prefix semantics: /loginXYZ is claimed by the login controller.
    let response = app.oneshot(get("/loginXYZ")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("<form"), "expected the login form, got: {}", body);
}

#[tokio::test]
async fn unmatched_path_passes_through_to_the_host() {
    let server = mock_provider().await;
    let adapter = authbridge::init(test_options(&server.url())).await.unwrap();
    let app = build_app(&adapter);

    let response = app.oneshot(get("/other")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "fallthrough");
}

#[tokio::test]
async fn disabled_route_is_not_dispatched() {
    let server = mock_provider().await;
    let opts = Options {
        enable_login: Some(false),
        ..test_options(&server.url())
    };
    let adapter = authbridge::init(opts).await.unwrap();
    let app = build_app(&adapter);

    // With login disabled the prefix is dead; the host has no /login route,
    // so the request falls through to its 404.
    let response = app.oneshot(get("/login")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn registration_wins_over_login_in_priority_order() {
    let server = mock_provider().await;
    let opts = Options {
        registration_url: Some("/auth".into()),
        login_url: Some("/auth".into()),
        ..test_options(&server.url())
    };
    let adapter = authbridge::init(opts).await.unwrap();
    let app = build_app(&adapter);

    let response = app.oneshot(get("/auth")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("Create an account"), "expected the registration form");
}

// -- Login flow

#[tokio::test]
async fn successful_login_writes_the_session_cookie() {
    let mut server = mock_provider().await;
    server
        .mock("POST", "/applications/app1/login-attempts")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"account": {"id": "acc1", "username": "jdoe", "email": "jdoe@example.com"}}"#)
        .create_async()
        .await;

    let adapter = authbridge::init(test_options(&server.url())).await.unwrap();
    let app = build_app(&adapter);

    let response = app
        .oneshot(form_post("/login?next=/dashboard", "login=jdoe&password=hunter2"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/dashboard");
    let session = session_from_response(&response).expect("session cookie should be set");
    assert_eq!(session.account_id.as_deref(), Some("acc1"));
}

#[tokio::test]
async fn rejected_credentials_rerender_the_form() {
    let mut server = mock_provider().await;
    server
        .mock("POST", "/applications/app1/login-attempts")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status": 400, "message": "Invalid username or password."}"#)
        .create_async()
        .await;

    let adapter = authbridge::init(test_options(&server.url())).await.unwrap();
    let app = build_app(&adapter);

    let response = app
        .oneshot(form_post("/login", "login=jdoe&password=wrong"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_string(response).await;
    assert!(body.contains("Invalid username or password."));
}

#[tokio::test]
async fn logout_expires_the_session_cookie() {
    let mut server = mock_provider().await;
    server
        .mock("GET", "/accounts/acc1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": "acc1", "username": "jdoe", "email": "jdoe@example.com"}"#)
        .create_async()
        .await;

    let adapter = authbridge::init(test_options(&server.url())).await.unwrap();
    let app = build_app(&adapter);

    let response = app
        .oneshot(with_cookie(get("/logout"), &session_cookie(&authed_session())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.starts_with("authbridge_session=;"));
    assert!(set_cookie.contains("Max-Age=0"));
}

// -- Sessions and current user

#[tokio::test]
async fn session_names_an_account_the_provider_rejects() {
    let mut server = mock_provider().await;
    server
        .mock("GET", "/accounts/ghost")
        .with_status(404)
        .create_async()
        .await;

    let adapter = authbridge::init(test_options(&server.url())).await.unwrap();
    let app = build_app(&adapter);

    let session = SessionData {
        account_id: Some("ghost".to_string()),
        csrf_token: None,
    };
    // Resolution failure reads as unauthenticated, not as a request error.
    let response = app
        .oneshot(with_cookie(get("/dashboard"), &session_cookie(&session)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn tampered_session_cookie_reads_as_anonymous() {
    let server = mock_provider().await;
    let adapter = authbridge::init(test_options(&server.url())).await.unwrap();
    let app = build_app(&adapter);

    let response = app
        .oneshot(with_cookie(get("/dashboard"), "authbridge_session=garbage"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
}

// -- Guards

#[tokio::test]
async fn login_required_redirects_anonymous_visitors() {
    let server = mock_provider().await;
    let adapter = authbridge::init(test_options(&server.url())).await.unwrap();
    let app = build_app(&adapter);

    let response = app.oneshot(get("/dashboard")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/login?next=%2Fdashboard"
    );
}

#[tokio::test]
async fn login_required_admits_authenticated_visitors() {
    let mut server = mock_provider().await;
    server
        .mock("GET", "/accounts/acc1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": "acc1", "username": "jdoe", "email": "jdoe@example.com"}"#)
        .create_async()
        .await;

    let adapter = authbridge::init(test_options(&server.url())).await.unwrap();
    let app = build_app(&adapter);

    let response = app
        .oneshot(with_cookie(get("/dashboard"), &session_cookie(&authed_session())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "dashboard");
}

#[tokio::test]
async fn groups_required_rejects_non_members() {
    let mut server = mock_provider().await;
    server
        .mock("GET", "/accounts/acc1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"id": "acc1", "username": "jdoe", "email": "jdoe@example.com", "groups": ["users"]}"#,
        )
        .create_async()
        .await;

    let adapter = authbridge::init(test_options(&server.url())).await.unwrap();
    let app = build_app(&adapter);

    let response = app
        .oneshot(with_cookie(get("/admin"), &session_cookie(&authed_session())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn groups_required_admits_any_matching_group() {
    let mut server = mock_provider().await;
    server
        .mock("GET", "/accounts/acc1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"id": "acc1", "username": "jdoe", "email": "jdoe@example.com", "groups": ["users", "admins"]}"#,
        )
        .create_async()
        .await;

    let adapter = authbridge::init(test_options(&server.url())).await.unwrap();
    let app = build_app(&adapter);

    let response = app
        .oneshot(with_cookie(get("/admin"), &session_cookie(&authed_session())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// -- CSRF

#[tokio::test]
async fn csrf_stage_is_absent_when_disabled() {
    let server = mock_provider().await;
    let adapter = authbridge::init(test_options(&server.url())).await.unwrap();
    let app = build_app(&adapter);

    // No token anywhere, yet the POST reaches the login controller: the
    // controller's own validation answers, not a 403 from a CSRF stage.
    let response = app.oneshot(form_post("/login", "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_string(response).await;
    assert!(body.contains("required"), "expected a form validation error");
}

#[tokio::test]
async fn csrf_rejects_untokened_posts_when_enabled() {
    let server = mock_provider().await;
    let opts = Options {
        use_csrf: Some(true),
        ..test_options(&server.url())
    };
    let adapter = authbridge::init(opts).await.unwrap();
    let app = build_app(&adapter);

    let response = app
        .oneshot(form_post("/login", "login=jdoe&password=hunter2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn csrf_token_is_minted_on_get_and_accepted_on_post() {
    let mut server = mock_provider().await;
    server
        .mock("POST", "/applications/app1/login-attempts")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"account": {"id": "acc1", "username": "jdoe", "email": "jdoe@example.com"}}"#)
        .create_async()
        .await;

    let opts = Options {
        use_csrf: Some(true),
        ..test_options(&server.url())
    };
    let adapter = authbridge::init(opts).await.unwrap();
    let app = build_app(&adapter);

    // GET mints a token, persists it through the session cookie, and embeds
    // it in the rendered form.
    let response = app.clone().oneshot(get("/login")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let session = session_from_response(&response).expect("session cookie should be set");
    let token = session.csrf_token.clone().expect("token should be minted");
    let body = body_string(response).await;
    assert!(body.contains(&token), "form should embed the csrf token");

    // POSTing the token back with the session cookie passes the check.
    let response = app
        .oneshot(with_cookie(
            form_post(
                "/login",
                &format!("login=jdoe&password=hunter2&_csrf={}", token),
            ),
            &session_cookie(&session),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn csrf_accepts_the_header_form() {
    let mut server = mock_provider().await;
    server
        .mock("POST", "/applications/app1/login-attempts")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"account": {"id": "acc1", "username": "jdoe", "email": "jdoe@example.com"}}"#)
        .create_async()
        .await;

    let opts = Options {
        use_csrf: Some(true),
        ..test_options(&server.url())
    };
    let adapter = authbridge::init(opts).await.unwrap();
    let app = build_app(&adapter);

    let session = SessionData {
        account_id: None,
        csrf_token: Some("tok-123".to_string()),
    };
    let mut request = with_cookie(
        form_post("/login", "login=jdoe&password=hunter2"),
        &session_cookie(&session),
    );
    request
        .headers_mut()
        .insert("x-csrf-token", "tok-123".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}
