use serde::{Deserialize, Serialize};

/// Identity handed over by the identity provider for one sign-in attempt.
///
/// Field names follow the provider profile shape (`name`, `image`).
/// Never persisted as-is; the reconciler maps it onto a `UserRecord`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExternalIdentity {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "name")]
    pub display_name: Option<String>,
    #[serde(default, rename = "image")]
    pub avatar_url: Option<String>,
}

impl ExternalIdentity {
    /// Provider-supplied name when present and non-empty, unmodified.
    pub fn provided_name(&self) -> Option<&str> {
        self.display_name.as_deref().filter(|name| !name.is_empty())
    }
}
