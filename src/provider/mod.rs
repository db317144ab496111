//! REST client for the hosted identity provider.
//!
//! The client is constructed once at startup from resolved credentials and
//! shared read-only across all requests for the life of the process.

pub mod api_key;
pub mod client;

pub use api_key::{load_api_key, ApiKey};
pub use client::Client;

/// Errors raised while talking to the identity provider or loading its
/// credentials. All of them are fatal when they occur during startup.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request to identity provider failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("resource not found on identity provider")]
    NotFound,

    #[error("identity provider rejected the api credentials")]
    Unauthorized,

    #[error("identity provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("could not read api key file {path}: {source}")]
    KeyFileUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("api key file {0} is missing apiKey.id or apiKey.secret")]
    KeyFileInvalid(String),
}
