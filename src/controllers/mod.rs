//! Built-in route controllers.
//!
//! The dispatcher hands a matched request straight to one of these; they
//! are not registered on the host router. Each reads what it needs (session
//! handle, parsed form) from the request extensions installed by the
//! earlier pipeline stages.

mod login;
mod logout;
mod register;

pub use login::login;
pub use logout::logout;
pub use register::register;

use axum::extract::Request;
use axum::response::Html;

use crate::session::SessionHandle;
use crate::state::AdapterState;

pub(crate) fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{}\n</body>\n</html>",
        title, body
    ))
}

/// Hidden CSRF input for rendered forms, empty when CSRF is off or no
/// token has been minted yet.
pub(crate) async fn csrf_field(state: &AdapterState, session: &SessionHandle) -> String {
    if !state.config.use_csrf {
        return String::new();
    }
    match session.get().await.csrf_token {
        Some(token) => format!(
            "<input type=\"hidden\" name=\"_csrf\" value=\"{}\">",
            token
        ),
        None => String::new(),
    }
}

/// Post-login destination: the `next` query parameter when it names a
/// same-site path, `/` otherwise.
pub(crate) fn redirect_target(req: &Request) -> String {
    req.uri()
        .query()
        .and_then(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == "next")
                .map(|(_, value)| value.into_owned())
        })
        .filter(|target| target.starts_with('/'))
        .unwrap_or_else(|| "/".to_string())
}
