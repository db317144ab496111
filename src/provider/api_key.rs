use std::path::Path;

use super::ProviderError;

/// An api key pair identifying this deployment to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey {
    pub id: String,
    pub secret: String,
}

impl ApiKey {
    pub fn new(id: impl Into<String>, secret: impl Into<String>) -> Self {
        ApiKey {
            id: id.into(),
            secret: secret.into(),
        }
    }
}

/// Read an api key from a properties file on disk.
///
/// The file uses the provider's standard download format:
///
/// ```text
/// apiKey.id = 144JVZINOF5EBNCMG9EXAMPLE
/// apiKey.secret = lWxOiKqKPNwJmSldbiSkEbkNjgh2uRSNAb+AEXAMPLE
/// ```
///
/// A missing or malformed file is a fatal startup error.
pub async fn load_api_key(path: impl AsRef<Path>) -> Result<ApiKey, ProviderError> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ProviderError::KeyFileUnreadable {
            path: path.display().to_string(),
            source,
        })?;

    parse_properties(&text)
        .ok_or_else(|| ProviderError::KeyFileInvalid(path.display().to_string()))
}

fn parse_properties(text: &str) -> Option<ApiKey> {
    let mut id = None;
    let mut secret = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = line.split_once('=')?;
        match key.trim() {
            "apiKey.id" => id = Some(value.trim().to_string()),
            "apiKey.secret" => secret = Some(value.trim().to_string()),
            _ => {}
        }
    }

    match (id, secret) {
        (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
            Some(ApiKey { id, secret })
        }
        _ => None,
    }
}
