use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;

/// Default endpoint of the hosted identity provider API.
pub const DEFAULT_BASE_URL: &str = "https://api.authbridge.io/v1";

const DEFAULT_SESSION_DURATION_SECS: i64 = 30 * 60;
const DEFAULT_SECRET_KEY: &str = "change-me-in-production";

/// User-supplied adapter options. Every field is optional; anything left
/// unset falls back to an environment variable (credentials, application,
/// secret key) or a built-in default. Unknown keys in a config file are
/// ignored rather than rejected.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Default, Clone)]
pub struct Options {
    pub api_key_id: Option<String>,
    pub api_key_secret: Option<String>,
    pub api_key_file: Option<String>,
    pub application: Option<String>,
    pub base_url: Option<String>,
    pub secret_key: Option<String>,
    pub session_duration_secs: Option<i64>,
    pub enable_https: Option<bool>,
    pub use_csrf: Option<bool>,
    pub enable_registration: Option<bool>,
    pub enable_login: Option<bool>,
    pub enable_logout: Option<bool>,
    pub registration_url: Option<String>,
    pub login_url: Option<String>,
    pub logout_url: Option<String>,
}

/// Fully resolved adapter settings. Produced once by [`AdapterConfig::resolve`]
/// and read-only for the life of the process.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone)]
pub struct AdapterConfig {
    pub api_key_id: Option<String>,
    pub api_key_secret: Option<String>,
    pub api_key_file: Option<String>,
    pub application: String,
    pub base_url: String,
    pub secret_key: String,
    pub session_duration_secs: i64,
    pub enable_https: bool,
    pub use_csrf: bool,
    pub enable_registration: bool,
    pub enable_login: bool,
    pub enable_logout: bool,
    pub registration_url: String,
    pub login_url: String,
    pub logout_url: String,
}

/// A fatal configuration error. Startup must not reach the network once one
/// of these is raised.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("either an api key id/secret pair or an api key file must be configured")]
    MissingCredentials,

    #[error("no application id configured")]
    MissingApplication,
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

impl AdapterConfig {
    /// Merge user options over environment fallbacks and defaults.
    ///
    /// This never fails: missing optional settings fall back to defaults,
    /// and validation of required combinations happens in [`Self::validate`].
    pub fn resolve(opts: Options) -> Self {
        AdapterConfig {
            api_key_id: opts.api_key_id.or_else(|| env_opt("AUTHBRIDGE_API_KEY_ID")),
            api_key_secret: opts
                .api_key_secret
                .or_else(|| env_opt("AUTHBRIDGE_API_KEY_SECRET")),
            api_key_file: opts
                .api_key_file
                .or_else(|| env_opt("AUTHBRIDGE_API_KEY_FILE")),
            application: opts
                .application
                .or_else(|| env_opt("AUTHBRIDGE_APPLICATION"))
                .unwrap_or_default(),
            base_url: opts.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            secret_key: opts
                .secret_key
                .or_else(|| env_opt("AUTHBRIDGE_SECRET_KEY"))
                .unwrap_or_else(|| DEFAULT_SECRET_KEY.to_string()),
            session_duration_secs: opts
                .session_duration_secs
                .unwrap_or(DEFAULT_SESSION_DURATION_SECS),
            enable_https: opts.enable_https.unwrap_or(false),
            use_csrf: opts.use_csrf.unwrap_or(false),
            enable_registration: opts.enable_registration.unwrap_or(true),
            enable_login: opts.enable_login.unwrap_or(true),
            enable_logout: opts.enable_logout.unwrap_or(true),
            registration_url: opts.registration_url.unwrap_or_else(|| "/register".into()),
            login_url: opts.login_url.unwrap_or_else(|| "/login".into()),
            logout_url: opts.logout_url.unwrap_or_else(|| "/logout".into()),
        }
    }

    /// Check that required settings are present together.
    ///
    /// The credential invariant: an inline key id AND secret, or a key file
    /// path. Absence of both is fatal, as is a missing application id.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let has_key_pair = is_set(&self.api_key_id) && is_set(&self.api_key_secret);
        let has_key_file = is_set(&self.api_key_file);

        if !has_key_pair && !has_key_file {
            return Err(ConfigError::MissingCredentials);
        }

        if self.application.is_empty() {
            return Err(ConfigError::MissingApplication);
        }

        Ok(())
    }

    pub fn session_duration(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session_duration_secs)
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

/// Top-level configuration for the demo server binary.
#[derive(Deserialize, Serialize, JsonSchema, Debug)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub adapter: Options,
}

fn default_bind_address() -> String {
    "127.0.0.1:8080".to_string()
}

/// Load config from a YAML file named "config.yaml" in the current directory,
/// with `AUTHBRIDGE_`-prefixed environment variables merged on top.
pub fn load_config() -> ServerConfig {
    let figment = Figment::new()
        .merge(Yaml::file("./config.yaml"))
        .merge(Env::prefixed("AUTHBRIDGE_").split("__"));
    match figment.extract::<ServerConfig>() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() {
    let schema = schema_for!(ServerConfig);
    println!("{}", serde_json::to_string_pretty(&schema).unwrap());
}
