use std::sync::Arc;

use axum::extract::Request;
use axum::response::{Html, IntoResponse, Redirect, Response};
use http::{Method, StatusCode};
use tracing::{info, warn};

use super::{csrf_field, page};
use crate::forms::{FormData, RegistrationForm};
use crate::provider::ProviderError;
use crate::session::SessionHandle;
use crate::state::AdapterState;
use crate::utils::http_helpers::HTTPError;

/// GET renders the registration form; POST creates the account on the
/// provider and logs it straight in.
pub async fn register(state: Arc<AdapterState>, req: Request) -> Response {
    let Some(session) = req.extensions().get::<SessionHandle>().cloned() else {
        return HTTPError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "session middleware not installed",
        )
        .into_response();
    };

    if req.method() == Method::GET {
        return registration_page(&state, &session, None).await.into_response();
    }
    if req.method() != Method::POST {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let form = req
        .extensions()
        .get::<FormData>()
        .cloned()
        .unwrap_or_default();

    let registration = match RegistrationForm::from_form(&form) {
        Ok(registration) => registration,
        Err(message) => {
            let body = registration_page(&state, &session, Some(&message)).await;
            return (StatusCode::BAD_REQUEST, body).into_response();
        }
    };

    match state
        .client
        .create_account(&state.application.id, &registration.into_new_account())
        .await
    {
        Ok(account) => {
            info!("Registered account '{}'", account.username);
            session.set_account(account.id).await;
            Redirect::to("/").into_response()
        }
        Err(ProviderError::Api { message, .. }) => {
            let body = registration_page(&state, &session, Some(&message)).await;
            (StatusCode::BAD_REQUEST, body).into_response()
        }
        Err(e) => {
            warn!("Account creation failed: {}", e);
            let body =
                registration_page(&state, &session, Some("Registration is unavailable.")).await;
            (StatusCode::BAD_GATEWAY, body).into_response()
        }
    }
}

async fn registration_page(
    state: &AdapterState,
    session: &SessionHandle,
    error: Option<&str>,
) -> Html<String> {
    let csrf = csrf_field(state, session).await;
    let error_html = error
        .map(|message| format!("<p class=\"error\">{}</p>", message))
        .unwrap_or_default();
    page(
        "Create an account",
        &format!(
            "{error}<form method=\"post\" action=\"{action}\">{csrf}\
             <label>First name <input type=\"text\" name=\"given_name\"></label>\
             <label>Last name <input type=\"text\" name=\"surname\"></label>\
             <label>Email <input type=\"text\" name=\"email\"></label>\
             <label>Password <input type=\"password\" name=\"password\"></label>\
             <button type=\"submit\">Create account</button></form>",
            error = error_html,
            action = state.config.registration_url,
            csrf = csrf,
        ),
    )
}
