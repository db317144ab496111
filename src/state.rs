//! Shared adapter state.
//!
//! Everything the request pipeline needs is resolved once at startup and
//! then shared read-only; no request ever mutates it.

use std::sync::Arc;

use crate::config::AdapterConfig;
use crate::dispatch::UserResolver;
use crate::models::Application;
use crate::provider::Client;

/// Immutable state behind the middleware pipeline and the guards.
///
/// Built by [`crate::startup::init`] after the startup sequence completes
/// and passed by `Arc` into every stage; requests only read it, so it is
/// shared without locking.
pub struct AdapterState {
    /// Resolved and validated adapter settings.
    pub config: AdapterConfig,
    /// Authenticated handle to the identity provider, process-lifetime.
    pub client: Client,
    /// The remote application resource fetched at startup.
    pub application: Application,
    /// Seam for resolving the current user from a session.
    pub resolver: Arc<dyn UserResolver>,
}
