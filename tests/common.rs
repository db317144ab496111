use axum::body::Body;
use axum::http::header;
use axum::http::Response;
use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;
use mockito::ServerGuard;

use authbridge::session::{SessionData, SESSION_COOKIE};
use authbridge::{Adapter, Options};

pub const TEST_SECRET: &str = "test-secret";

/// Options pointing the adapter at a mock provider.
pub fn test_options(base_url: &str) -> Options {
    Options {
        api_key_id: Some("test-key-id".into()),
        api_key_secret: Some("test-key-secret".into()),
        application: Some("app1".into()),
        base_url: Some(base_url.to_string()),
        secret_key: Some(TEST_SECRET.into()),
        ..Options::default()
    }
}

/// Start a mock provider that knows the test application.
pub async fn mock_provider() -> ServerGuard {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/applications/app1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": "app1", "name": "Test App", "status": "ENABLED"}"#)
        .create_async()
        .await;
    server
}

/// Host application used by the pipeline tests: a plain passthrough route,
/// a login-guarded page, and a group-guarded page.
pub fn build_app(adapter: &Adapter) -> Router {
    let protected = Router::new()
        .route("/dashboard", get(|| async { "dashboard" }))
        .route_layer(from_fn(authbridge::login_required));
    let admin = Router::new()
        .route("/admin", get(|| async { "admin" }))
        .route_layer(from_fn(authbridge::groups_required(["admins"])));

    adapter.attach(
        Router::new()
            .route("/other", get(|| async { "fallthrough" }))
            .merge(protected)
            .merge(admin),
    )
}

/// A signed session cookie header value for the given session data.
pub fn session_cookie(data: &SessionData) -> String {
    let token =
        authbridge::session::codec::encode_session(TEST_SECRET, data, chrono::Duration::minutes(30));
    format!("{}={}", SESSION_COOKIE, token)
}

/// Pull the session data back out of a response's `Set-Cookie` header.
pub fn session_from_response(response: &Response<Body>) -> Option<SessionData> {
    let set_cookie = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    let value = set_cookie
        .split(';')
        .next()?
        .strip_prefix(&format!("{}=", SESSION_COOKIE))?;
    authbridge::session::codec::decode_session(TEST_SECRET, value)
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    String::from_utf8(bytes.to_vec()).expect("body should be utf-8")
}
