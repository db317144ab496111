//! Route guards for host applications.
//!
//! Both guards are plain request-time checks over the extensions the
//! dispatcher installed; they hold no state and never retry. Apply them
//! with `axum::middleware::from_fn` on the routes they should protect.

use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use futures::future::BoxFuture;

use crate::dispatch::CurrentUser;
use crate::state::AdapterState;
use crate::utils::http_helpers::HTTPError;

/// Require an authenticated user.
///
/// Unauthenticated visitors are redirected to the configured login page
/// with a `next` parameter pointing back at the guarded path (or get a
/// bare 401 when the adapter pipeline is not attached or login is off).
pub async fn login_required(req: Request, next: Next) -> Response {
    if req.extensions().get::<CurrentUser>().is_some() {
        return next.run(req).await;
    }
    unauthenticated(&req)
}

/// Require membership in at least one of the named groups.
///
/// ```ignore
/// Router::new()
///     .route("/admin", get(admin))
///     .route_layer(axum::middleware::from_fn(authbridge::groups_required(["admins"])));
/// ```
pub fn groups_required<I, S>(
    groups: I,
) -> impl Fn(Request, Next) -> BoxFuture<'static, Response> + Clone
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let required: Arc<Vec<String>> = Arc::new(groups.into_iter().map(Into::into).collect());

    move |req: Request, next: Next| {
        let required = required.clone();
        Box::pin(async move {
            let user = req.extensions().get::<CurrentUser>().cloned();
            match user {
                None => unauthenticated(&req),
                Some(CurrentUser(account)) => {
                    if account.in_any_group(required.as_slice()) {
                        next.run(req).await
                    } else {
                        HTTPError::forbidden("insufficient group membership").into_response()
                    }
                }
            }
        })
    }
}

fn unauthenticated(req: &Request) -> Response {
    match req.extensions().get::<Arc<AdapterState>>() {
        Some(state) if state.config.enable_login => {
            let next_path: String =
                url::form_urlencoded::byte_serialize(req.uri().path().as_bytes()).collect();
            let target = format!("{}?next={}", state.config.login_url, next_path);
            Redirect::temporary(&target).into_response()
        }
        _ => HTTPError::unauthorized("login required").into_response(),
    }
}
