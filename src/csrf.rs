//! CSRF protection stage.
//!
//! Attached only when the `use_csrf` setting is on. Safe methods mint a
//! per-session token (persisted through the session cookie) so rendered
//! forms can embed it; state-changing methods must present that token via
//! the `_csrf` form field or the `x-csrf-token` header or they are rejected
//! before the dispatcher ever sees them.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::{Method, StatusCode};
use uuid::Uuid;

use crate::forms::FormData;
use crate::session::SessionHandle;
use crate::utils::http_helpers::HTTPError;

pub const CSRF_FORM_FIELD: &str = "_csrf";
pub const CSRF_HEADER: &str = "x-csrf-token";

pub async fn csrf_middleware(req: Request, next: Next) -> Response {
    let Some(session) = req.extensions().get::<SessionHandle>().cloned() else {
        return HTTPError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "session middleware not installed",
        )
        .into_response();
    };

    if is_safe(req.method()) {
        let mut data = session.data.lock().await;
        if data.csrf_token.is_none() {
            data.csrf_token = Some(Uuid::new_v4().to_string());
        }
        drop(data);
        return next.run(req).await;
    }

    let expected = session.data.lock().await.csrf_token.clone();
    let presented = presented_token(&req);

    match (expected, presented) {
        (Some(expected), Some(presented)) if expected == presented => next.run(req).await,
        _ => HTTPError::forbidden("invalid csrf token").into_response(),
    }
}

fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

fn presented_token(req: &Request) -> Option<String> {
    if let Some(form) = req.extensions().get::<FormData>() {
        if let Some(token) = form.get_str(CSRF_FORM_FIELD) {
            return Some(token.to_string());
        }
    }
    req.headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}
