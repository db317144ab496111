//! Session cookie middleware.
//!
//! Decodes the session cookie into a [`SessionHandle`] before the handler
//! runs, and emits a `Set-Cookie` afterwards when the handler changed the
//! session (or an expired cookie when it destroyed it). Unchanged sessions
//! produce no cookie traffic at all.

use axum::extract::Request;
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;
use tracing::warn;

use super::codec::{decode_session, encode_session};
use super::{SessionData, SessionHandle, SESSION_COOKIE};
use crate::state::AdapterState;

pub async fn session_middleware(
    state: Arc<AdapterState>,
    mut req: Request,
    next: Next,
) -> Response {
    let cookie_header = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let initial = parse_cookie(cookie_header, SESSION_COOKIE)
        .and_then(|value| decode_session(&state.config.secret_key, value))
        .unwrap_or_default();

    let handle = SessionHandle::new(initial.clone());
    req.extensions_mut().insert(handle.clone());

    let mut response = next.run(req).await;

    let destroyed = *handle.destroyed.lock().await;
    let current = handle.data.lock().await.clone();

    let cookie = if destroyed {
        Some(expired_cookie(state.config.enable_https))
    } else if current != initial {
        Some(session_cookie(&state, &current))
    } else {
        None
    };

    if let Some(cookie) = cookie {
        match cookie.parse() {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => warn!("Dropping unwritable session cookie: {}", e),
        }
    }

    response
}

fn session_cookie(state: &AdapterState, data: &SessionData) -> String {
    let token = encode_session(
        &state.config.secret_key,
        data,
        state.config.session_duration(),
    );
    let mut parts = vec![
        format!("{}={}", SESSION_COOKIE, token),
        format!("Max-Age={}", state.config.session_duration_secs),
        "Path=/".to_string(),
        "HttpOnly".to_string(),
        "SameSite=Lax".to_string(),
    ];
    if state.config.enable_https {
        parts.push("Secure".to_string());
    }
    parts.join("; ")
}

fn expired_cookie(secure: bool) -> String {
    let mut parts = vec![
        format!("{}=", SESSION_COOKIE),
        "Max-Age=0".to_string(),
        "Path=/".to_string(),
        "HttpOnly".to_string(),
        "SameSite=Lax".to_string(),
    ];
    if secure {
        parts.push("Secure".to_string());
    }
    parts.join("; ")
}

/// Pull one cookie's value out of a `Cookie` header.
fn parse_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    for part in header.split(';') {
        let trimmed = part.trim();
        if let Some(rest) = trimmed.strip_prefix(name) {
            if let Some(value) = rest.strip_prefix('=') {
                return Some(value);
            }
        }
    }
    None
}
