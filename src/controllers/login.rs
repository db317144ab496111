use std::sync::Arc;

use axum::extract::Request;
use axum::response::{Html, IntoResponse, Redirect, Response};
use http::{Method, StatusCode};
use tracing::{debug, info};

use super::{csrf_field, page, redirect_target};
use crate::forms::{FormData, LoginForm};
use crate::session::SessionHandle;
use crate::state::AdapterState;
use crate::utils::http_helpers::HTTPError;

/// GET renders the login form; POST exchanges the submitted credentials
/// for an account and writes it into the session.
pub async fn login(state: Arc<AdapterState>, req: Request) -> Response {
    let Some(session) = req.extensions().get::<SessionHandle>().cloned() else {
        return HTTPError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "session middleware not installed",
        )
        .into_response();
    };

    if req.method() == Method::GET {
        return login_page(&state, &session, None).await.into_response();
    }
    if req.method() != Method::POST {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let form = req
        .extensions()
        .get::<FormData>()
        .cloned()
        .unwrap_or_default();

    let credentials = match LoginForm::from_form(&form) {
        Ok(credentials) => credentials,
        Err(message) => {
            let body = login_page(&state, &session, Some(&message)).await;
            return (StatusCode::BAD_REQUEST, body).into_response();
        }
    };

    match state
        .client
        .authenticate_account(&state.application.id, &credentials.login, &credentials.password)
        .await
    {
        Ok(account) => {
            info!("Account '{}' logged in", account.username);
            session.set_account(account.id).await;
            Redirect::to(&redirect_target(&req)).into_response()
        }
        Err(e) => {
            debug!("Login attempt rejected: {}", e);
            let body = login_page(&state, &session, Some("Invalid username or password.")).await;
            (StatusCode::BAD_REQUEST, body).into_response()
        }
    }
}

async fn login_page(
    state: &AdapterState,
    session: &SessionHandle,
    error: Option<&str>,
) -> Html<String> {
    let csrf = csrf_field(state, session).await;
    let error_html = error
        .map(|message| format!("<p class=\"error\">{}</p>", message))
        .unwrap_or_default();
    page(
        "Log in",
        &format!(
            "{error}<form method=\"post\" action=\"{action}\">{csrf}\
             <label>Username or email <input type=\"text\" name=\"login\"></label>\
             <label>Password <input type=\"password\" name=\"password\"></label>\
             <button type=\"submit\">Log in</button></form>",
            error = error_html,
            action = state.config.login_url,
            csrf = csrf,
        ),
    )
}
