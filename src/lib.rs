//! authbridge wires an axum application to a hosted identity provider:
//! settings, a one-shot startup sequence, session cookies, the built-in
//! register/login/logout routes, and route guards.
//!
//! ```ignore
//! let adapter = authbridge::init(Options {
//!     api_key_id: Some("...".into()),
//!     api_key_secret: Some("...".into()),
//!     application: Some("my-app".into()),
//!     ..Options::default()
//! })
//! .await?;
//!
//! let app = adapter.attach(
//!     Router::new()
//!         .route("/dashboard", get(dashboard))
//!         .route_layer(middleware::from_fn(authbridge::login_required)),
//! );
//! ```

pub mod config;
pub mod controllers;
pub mod csrf;
pub mod dispatch;
pub mod forms;
pub mod guards;
pub mod models;
pub mod provider;
pub mod session;
pub mod startup;
pub mod state;
pub mod utils;

use std::sync::Arc;

use axum::middleware::from_fn;
use axum::Router;

pub use config::Options;
pub use dispatch::CurrentUser;
pub use guards::{groups_required, login_required};
pub use startup::{init, StartupError};

use crate::models::Application;
use crate::state::AdapterState;

/// A fully started adapter: settings resolved and validated, provider
/// client connected, application resource fetched. Only [`init`] produces
/// one, so a reachable `Adapter` implies the startup sequence completed.
#[derive(Clone)]
pub struct Adapter {
    pub(crate) state: Arc<AdapterState>,
}

impl std::fmt::Debug for Adapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter").finish_non_exhaustive()
    }
}

impl Adapter {
    pub fn state(&self) -> Arc<AdapterState> {
        self.state.clone()
    }

    /// The remote application resource cached at startup.
    pub fn application(&self) -> &Application {
        &self.state.application
    }

    /// Install the request pipeline on a router.
    ///
    /// Stages run in a fixed order for every request: session codec, form
    /// body capture, CSRF check, then the dispatcher. When CSRF is disabled
    /// that stage is simply absent from the chain, not a pass-through.
    pub fn attach(&self, router: Router) -> Router {
        let state = self.state.clone();

        // Layers added later run earlier, so this reads inside-out.
        let mut router = router.layer(from_fn({
            let state = state.clone();
            move |req, next| dispatch::dispatch_middleware(state.clone(), req, next)
        }));

        if state.config.use_csrf {
            router = router.layer(from_fn(csrf::csrf_middleware));
        }

        router
            .layer(from_fn(forms::form_body_middleware))
            .layer(from_fn(move |req, next| {
                session::middleware::session_middleware(state.clone(), req, next)
            }))
    }
}
