//! Claim propagation: identity -> session token -> per-request session view.
//!
//! Lifecycle of one login:
//! - `SessionToken::from_identity` starts a token from the provider identity.
//! - `ClaimPropagator::mint_or_refresh_token` with the identity present binds the
//!   token to the stored user (first materialization). Later calls pass no identity
//!   and get the token back untouched, so the store is hit once per login.
//! - `ClaimPropagator::project_session` copies the token claims into a fresh
//!   `SessionView` on every request.

use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::repos::UserStore;
use crate::services::auth::display_name::derive_name;
use crate::services::auth::identity::ExternalIdentity;

/// Canonical identity carried by the signed session token.
///
/// All four claims are always present. `id` is `""` until the token is bound
/// to a stored user, and stays `""` if that lookup failed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    id: String,
    email: String,
    name: String,
    picture: Option<String>,
}

impl SessionToken {
    /// Unbound token for a freshly authenticated identity.
    pub fn from_identity(identity: &ExternalIdentity) -> Self {
        let email = identity.email.clone().unwrap_or_default();
        let name = identity
            .provided_name()
            .map(str::to_string)
            .unwrap_or_else(|| derive_name(&email));

        Self {
            id: String::new(),
            email,
            name,
            picture: identity.avatar_url.clone(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn picture(&self) -> Option<&str> {
        self.picture.as_deref()
    }

    /// Whether the token is bound to a stored user.
    pub fn is_bound(&self) -> bool {
        !self.id.is_empty()
    }
}

/// User half of a `SessionView`. Every field is a string; absent values are `""`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub image: String,
}

impl SessionUser {
    /// Stored user id, or `None` when the session is not bound to a user.
    ///
    /// Anything keyed on the user id must go through here: the empty-id
    /// sentinel (and any non-UUID value) yields `None`.
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.id).ok()
    }
}

/// Per-request session. Built fresh for each request and never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub user: Option<SessionUser>,
    pub expires: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ClaimPropagator {
    users: Arc<dyn UserStore>,
    session_max_age_seconds: u64,
}

impl std::fmt::Debug for ClaimPropagator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimPropagator")
            .field("users", &self.users.backend_name())
            .field("session_max_age_seconds", &self.session_max_age_seconds)
            .finish()
    }
}

impl ClaimPropagator {
    pub fn new(users: Arc<dyn UserStore>, session_max_age_seconds: u64) -> Self {
        Self {
            users,
            session_max_age_seconds,
        }
    }

    /// Token materialization.
    ///
    /// - `identity` present: first materialization for this login. The stored user
    ///   is looked up by email and its id/email/name/picture are written into the
    ///   token (name and picture keep the token's values when the record has none).
    ///   If no user is found, or the lookup fails, `id` is set to `""`.
    /// - `identity` absent: routine refresh, `current` is returned unchanged.
    pub async fn mint_or_refresh_token(
        &self,
        current: SessionToken,
        identity: Option<&ExternalIdentity>,
    ) -> SessionToken {
        let Some(identity) = identity else {
            return current;
        };

        let mut token = current;
        let email = identity
            .email
            .clone()
            .unwrap_or_else(|| token.email.clone());

        match self.users.get_user_by_email(&email).await {
            Ok(Some(record)) => {
                debug!(user_id = %record.id, email = %record.email, "session token bound to user");
                token.id = record.id.to_string();
                token.email = record.email;
                if !record.name.is_empty() {
                    token.name = record.name;
                }
                if record.avatar_url.is_some() {
                    token.picture = record.avatar_url;
                }
            }
            Ok(None) => {
                warn!(email = %email, "no user record for authenticated email; token left unbound");
                token.id = String::new();
            }
            Err(e) => {
                error!(
                    email = %email,
                    backend = self.users.backend_name(),
                    error = %e,
                    "user lookup failed while minting session token; token left unbound"
                );
                token.id = String::new();
            }
        }

        token
    }

    /// Empty session whose expiry is one max-age from now.
    pub fn new_session_shell(&self) -> SessionView {
        let max_age = i64::try_from(self.session_max_age_seconds).unwrap_or(i64::MAX);
        let expires = ChronoDuration::try_seconds(max_age)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        SessionView {
            user: None,
            expires,
        }
    }

    /// Copy token claims into `shell.user`. Without a token the shell is returned as-is.
    pub fn project_session(&self, shell: SessionView, token: Option<&SessionToken>) -> SessionView {
        let Some(token) = token else {
            return shell;
        };

        SessionView {
            user: Some(SessionUser {
                id: token.id().to_string(),
                email: token.email().to_string(),
                name: token.name().to_string(),
                image: token.picture().unwrap_or_default().to_string(),
            }),
            ..shell
        }
    }
}
