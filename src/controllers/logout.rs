use std::sync::Arc;

use axum::extract::Request;
use axum::response::{IntoResponse, Redirect, Response};
use http::StatusCode;
use tracing::info;

use crate::session::SessionHandle;
use crate::state::AdapterState;
use crate::utils::http_helpers::HTTPError;

/// Destroy the session and send the visitor home. The session middleware
/// turns the destroyed handle into an expired cookie.
pub async fn logout(_state: Arc<AdapterState>, req: Request) -> Response {
    let Some(session) = req.extensions().get::<SessionHandle>().cloned() else {
        return HTTPError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "session middleware not installed",
        )
        .into_response();
    };

    session.destroy().await;
    info!("Session destroyed");
    Redirect::to("/").into_response()
}
