use serde::{Deserialize, Serialize};

/// An account resource on the identity provider, as resolved for the
/// current request. Attached to the request extensions by the dispatcher
/// and consumed by guards and controllers; discarded when the request ends.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default = "enabled")]
    pub status: String,
    /// Names of the directory groups this account belongs to.
    #[serde(default)]
    pub groups: Vec<String>,
}

fn enabled() -> String {
    "ENABLED".to_string()
}

impl Account {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_name, self.surname)
            .trim()
            .to_string()
    }

    /// True when the account belongs to at least one of the named groups.
    pub fn in_any_group<S: AsRef<str>>(&self, groups: &[S]) -> bool {
        groups
            .iter()
            .any(|g| self.groups.iter().any(|mine| mine == g.as_ref()))
    }
}

/// Payload for creating an account on the provider.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub given_name: String,
    pub surname: String,
}
