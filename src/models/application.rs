use serde::{Deserialize, Serialize};

/// The remote application resource registered on the identity provider for
/// this deployment. Fetched exactly once at startup and immutable for the
/// process lifetime.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "enabled")]
    pub status: String,
}

fn enabled() -> String {
    "ENABLED".to_string()
}
