//! Adapter startup sequence.
//!
//! Four strictly ordered steps: resolve settings, validate them, construct
//! the provider client, fetch the application resource. Each step fully
//! completes before the next begins and any failure aborts the boot. The
//! ordering exists because the client cannot be built before credentials
//! are known good, and the application cannot be fetched without a client.
//!
//! Readiness falls out of the shape of the API: the middleware pipeline can
//! only be attached through the [`Adapter`] this returns, so no request is
//! ever dispatched against a half-started adapter.

use std::sync::Arc;

use tracing::info;

use crate::config::{AdapterConfig, ConfigError, Options};
use crate::dispatch::RemoteUserResolver;
use crate::provider::{load_api_key, ApiKey, Client, ProviderError};
use crate::state::AdapterState;
use crate::Adapter;

/// A fatal boot error. Nothing is retried; the caller decides whether to
/// exit or surface it.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("identity provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Run the startup sequence and return a ready adapter.
pub async fn init(opts: Options) -> Result<Adapter, StartupError> {
    let config = AdapterConfig::resolve(opts);
    config.validate()?;

    let client = init_client(&config).await?;

    let application = client.get_application(&config.application).await?;
    info!("Using provider application '{}'", application.name);

    let resolver = Arc::new(RemoteUserResolver::new(client.clone()));
    Ok(Adapter {
        state: Arc::new(AdapterState {
            config,
            client,
            application,
            resolver,
        }),
    })
}

/// Construct the provider client from exactly one credential source.
///
/// Inline key material wins and needs no I/O; otherwise the configured key
/// file is read, and a bad file aborts the boot before any network call.
async fn init_client(config: &AdapterConfig) -> Result<Client, StartupError> {
    let inline = match (config.api_key_id.as_deref(), config.api_key_secret.as_deref()) {
        (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
            Some(ApiKey::new(id, secret))
        }
        _ => None,
    };

    let api_key = match (inline, config.api_key_file.as_deref()) {
        (Some(key), _) => key,
        (None, Some(path)) => load_api_key(path).await?,
        (None, None) => return Err(ConfigError::MissingCredentials.into()),
    };

    Ok(Client::new(api_key, &config.base_url))
}
