//! Demo server: a minimal host application wired through the adapter.
//!
//! Loads `config.yaml` (plus `AUTHBRIDGE_`-prefixed environment variables),
//! runs the startup sequence, and serves a few pages: `/dashboard` behind
//! `login_required`, `/admin` behind `groups_required`.

use axum::middleware::from_fn;
use axum::response::Html;
use axum::routing::get;
use axum::{Extension, Router};
use tokio::net::TcpListener;
use tracing::{error, info};

use authbridge::config::{load_config, print_schema};
use authbridge::utils::logger::init_logging;
use authbridge::CurrentUser;

#[tokio::main]
async fn main() {
    if std::env::args().any(|arg| arg == "--schema") {
        print_schema();
        return;
    }

    let server_config = load_config();
    init_logging(&server_config.logging);

    let adapter = match authbridge::init(server_config.adapter).await {
        Ok(adapter) => adapter,
        Err(e) => {
            error!("Startup failed: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        "Adapter ready for application '{}'",
        adapter.application().name
    );

    let protected = Router::new()
        .route("/dashboard", get(dashboard))
        .route_layer(from_fn(authbridge::login_required));
    let admin = Router::new()
        .route("/admin", get(admin_page))
        .route_layer(from_fn(authbridge::groups_required(["admins"])));

    let app = adapter.attach(
        Router::new()
            .route("/", get(home))
            .merge(protected)
            .merge(admin),
    );

    info!("Starting server on {}", server_config.bind_address);
    let listener = TcpListener::bind(&server_config.bind_address)
        .await
        .expect("Could not bind to specified address");
    axum::serve(listener, app).await.unwrap();
}

async fn home(user: Option<Extension<CurrentUser>>) -> Html<String> {
    let body = match user {
        Some(Extension(CurrentUser(account))) => format!(
            "<p>Welcome back, {}.</p><p><a href=\"/dashboard\">Dashboard</a> | <a href=\"/logout\">Log out</a></p>",
            account.full_name()
        ),
        None => "<p><a href=\"/login\">Log in</a> or <a href=\"/register\">create an account</a>.</p>"
            .to_string(),
    };
    Html(format!("<!doctype html>\n<html><body>{}</body></html>", body))
}

async fn dashboard(Extension(CurrentUser(account)): Extension<CurrentUser>) -> Html<String> {
    Html(format!(
        "<!doctype html>\n<html><body><h1>Dashboard</h1><p>Signed in as {}.</p></body></html>",
        account.email
    ))
}

async fn admin_page() -> Html<&'static str> {
    Html("<!doctype html>\n<html><body><h1>Admin</h1></body></html>")
}
