//! Per-request user resolution and route dispatch.
//!
//! For every request the dispatcher first resolves the current user from
//! the session, then walks an ordered table of (prefix, enabled, controller)
//! entries. The test is a literal prefix match on the request path, so a
//! `/login` prefix also claims `/loginXYZ`; callers relying on exact paths
//! should configure prefixes accordingly. Requests matching no enabled
//! prefix pass through untouched.

use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, warn};

use crate::controllers;
use crate::models::Account;
use crate::provider::Client;
use crate::session::{SessionData, SessionHandle};
use crate::state::AdapterState;

/// The principal resolved for the current request, attached to the request
/// extensions when the session names an account the provider recognizes.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub Account);

/// Seam for turning session state into an authenticated account.
#[async_trait::async_trait]
pub trait UserResolver: Send + Sync {
    async fn resolve(&self, session: &SessionData) -> Option<Account>;
}

/// Default resolver: fetch the account named by the session from the
/// provider. Resolution failures are logged and read as "unauthenticated";
/// they never abort the request.
pub struct RemoteUserResolver {
    client: Client,
}

impl RemoteUserResolver {
    pub fn new(client: Client) -> Self {
        RemoteUserResolver { client }
    }
}

#[async_trait::async_trait]
impl UserResolver for RemoteUserResolver {
    async fn resolve(&self, session: &SessionData) -> Option<Account> {
        let account_id = session.account_id.as_deref()?;
        match self.client.get_account(account_id).await {
            Ok(account) => Some(account),
            Err(e) => {
                warn!("Could not resolve account '{}': {}", account_id, e);
                None
            }
        }
    }
}

enum Controller {
    Register,
    Login,
    Logout,
}

pub async fn dispatch_middleware(
    state: Arc<AdapterState>,
    mut req: Request,
    next: Next,
) -> Response {
    // Resolve the current user before any dispatch decision is made.
    let session = match req.extensions().get::<SessionHandle>() {
        Some(handle) => handle.get().await,
        None => SessionData::default(),
    };
    if let Some(account) = state.resolver.resolve(&session).await {
        debug!("Resolved current user '{}'", account.username);
        req.extensions_mut().insert(CurrentUser(account));
    }
    req.extensions_mut().insert(state.clone());

    let path = req.uri().path().to_string();
    let config = &state.config;

    // Fixed priority order; the first matching enabled prefix wins.
    let table = [
        (
            config.registration_url.as_str(),
            config.enable_registration,
            Controller::Register,
        ),
        (config.login_url.as_str(), config.enable_login, Controller::Login),
        (config.logout_url.as_str(), config.enable_logout, Controller::Logout),
    ];

    for (prefix, enabled, controller) in table {
        if enabled && path.starts_with(prefix) {
            return match controller {
                Controller::Register => controllers::register(state.clone(), req).await,
                Controller::Login => controllers::login(state.clone(), req).await,
                Controller::Logout => controllers::logout(state.clone(), req).await,
            };
        }
    }

    next.run(req).await
}
