use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::USER_AGENT;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{ApiKey, ProviderError};
use crate::models::{Account, Application, NewAccount};

/// Fixed token leading the user-agent sent to the provider.
pub const USER_AGENT_PREFIX: &str = "authbridge";

// Host framework version reported for diagnostics, kept in lockstep with
// the axum requirement in Cargo.toml.
const AXUM_VERSION: &str = "0.7";

/// The user-agent is deterministic: adapter version plus host framework
/// version, so provider-side telemetry can attribute traffic.
pub fn user_agent() -> String {
    format!(
        "{}/{} axum/{}",
        USER_AGENT_PREFIX,
        env!("CARGO_PKG_VERSION"),
        AXUM_VERSION
    )
}

/// Handle to the identity provider REST API.
///
/// Authenticates every call with HTTP Basic using the api key pair.
/// Constructed once at startup, never reconstructed, never closed.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    api_key: ApiKey,
    base_url: String,
    user_agent: String,
}

#[derive(Deserialize)]
struct LoginAttemptResponse {
    account: Account,
}

impl Client {
    pub fn new(api_key: ApiKey, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();
        Client {
            http: reqwest::Client::new(),
            api_key,
            base_url,
            user_agent: user_agent(),
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.request(reqwest::Method::GET, path)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.request(reqwest::Method::POST, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .basic_auth(&self.api_key.id, Some(&self.api_key.secret))
            .header(USER_AGENT, &self.user_agent)
    }

    /// Fetch the named application resource.
    pub async fn get_application(&self, id: &str) -> Result<Application, ProviderError> {
        debug!("Fetching application '{}' from provider", id);
        let resp = self.get(&format!("/applications/{}", id)).send().await?;
        Ok(checked(resp).await?.json().await?)
    }

    /// Fetch a single account, typically the one named by a session.
    pub async fn get_account(&self, id: &str) -> Result<Account, ProviderError> {
        let resp = self.get(&format!("/accounts/{}", id)).send().await?;
        Ok(checked(resp).await?.json().await?)
    }

    /// Create an account in the application's default directory.
    pub async fn create_account(
        &self,
        application_id: &str,
        account: &NewAccount,
    ) -> Result<Account, ProviderError> {
        let resp = self
            .post(&format!("/applications/{}/accounts", application_id))
            .json(account)
            .send()
            .await?;
        Ok(checked(resp).await?.json().await?)
    }

    /// Exchange a login and password for the matching account.
    ///
    /// The wire format is a basic login attempt: the credentials travel as a
    /// single base64 `login:password` value.
    pub async fn authenticate_account(
        &self,
        application_id: &str,
        login: &str,
        password: &str,
    ) -> Result<Account, ProviderError> {
        let value = STANDARD.encode(format!("{}:{}", login, password));
        let body = serde_json::json!({ "type": "basic", "value": value });

        let resp = self
            .post(&format!("/applications/{}/login-attempts", application_id))
            .json(&body)
            .send()
            .await?;
        let attempt: LoginAttemptResponse = checked(resp).await?.json().await?;
        Ok(attempt.account)
    }
}

/// Map provider HTTP statuses onto [`ProviderError`] variants.
async fn checked(resp: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    match resp.status() {
        s if s.is_success() => Ok(resp),
        StatusCode::NOT_FOUND => Err(ProviderError::NotFound),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ProviderError::Unauthorized),
        status => {
            let message = resp
                .json::<Value>()
                .await
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
                .unwrap_or_else(|| "unexpected provider response".to_string());
            Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn client_for(server: &Server) -> Client {
        Client::new(ApiKey::new("key-id", "key-secret"), server.url())
    }

    #[test]
    fn user_agent_is_deterministic() {
        let ua = user_agent();
        assert!(ua.starts_with("authbridge/"));
        assert!(ua.ends_with(" axum/0.7"));
        assert_eq!(ua, user_agent());
    }

    #[tokio::test]
    async fn get_application_sends_credentials_and_parses() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/applications/app1")
            .match_header("authorization", Matcher::Regex("^Basic ".into()))
            .match_header("user-agent", Matcher::Regex("^authbridge/".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "app1", "name": "My Site", "status": "ENABLED"}"#)
            .create_async()
            .await;

        let app = client_for(&server)
            .get_application("app1")
            .await
            .expect("application should resolve");
        m.assert_async().await;
        assert_eq!(app.name, "My Site");
    }

    #[tokio::test]
    async fn get_application_maps_missing_resource() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/applications/ghost")
            .with_status(404)
            .create_async()
            .await;

        let err = client_for(&server)
            .get_application("ghost")
            .await
            .expect_err("lookup should fail");
        m.assert_async().await;
        assert!(matches!(err, ProviderError::NotFound));
    }

    #[tokio::test]
    async fn authenticate_account_posts_basic_login_attempt() {
        let mut server = Server::new_async().await;
        let value = STANDARD.encode("jdoe:hunter2");
        let m = server
            .mock("POST", "/applications/app1/login-attempts")
            .match_body(Matcher::Json(serde_json::json!({
                "type": "basic",
                "value": value,
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"account": {"id": "acc1", "username": "jdoe", "email": "jdoe@example.com"}}"#,
            )
            .create_async()
            .await;

        let account = client_for(&server)
            .authenticate_account("app1", "jdoe", "hunter2")
            .await
            .expect("credentials should be accepted");
        m.assert_async().await;
        assert_eq!(account.id, "acc1");
    }

    #[tokio::test]
    async fn authenticate_account_surfaces_provider_message() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/applications/app1/login-attempts")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status": 400, "message": "Invalid username or password."}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .authenticate_account("app1", "jdoe", "wrong")
            .await
            .expect_err("bad credentials should fail");
        m.assert_async().await;
        match err {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid username or password.");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
