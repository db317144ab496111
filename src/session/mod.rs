//! Client-held sessions.
//!
//! All session state travels inside a signed, expiring cookie; nothing is
//! persisted on the server. Controllers mutate the per-request
//! [`SessionHandle`] and the middleware turns the change into a `Set-Cookie`.

pub mod codec;
pub mod middleware;

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "authbridge_session";

/// The decoded content of a session cookie.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionData {
    /// Id of the authenticated account, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// Anti-forgery token bound to this session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csrf_token: Option<String>,
}

/// Shared handle to session state, inserted into request extensions by the
/// session middleware and consumed by the CSRF stage and controllers.
#[derive(Clone)]
pub struct SessionHandle {
    pub data: Arc<Mutex<SessionData>>,
    pub destroyed: Arc<Mutex<bool>>,
}

impl SessionHandle {
    pub fn new(data: SessionData) -> Self {
        SessionHandle {
            data: Arc::new(Mutex::new(data)),
            destroyed: Arc::new(Mutex::new(false)),
        }
    }

    pub async fn get(&self) -> SessionData {
        self.data.lock().await.clone()
    }

    /// Record a successful login.
    pub async fn set_account(&self, account_id: impl Into<String>) {
        self.data.lock().await.account_id = Some(account_id.into());
    }

    /// Drop the session entirely; the middleware answers with an expired cookie.
    pub async fn destroy(&self) {
        *self.destroyed.lock().await = true;
        *self.data.lock().await = SessionData::default();
    }
}
