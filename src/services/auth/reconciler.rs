use std::sync::Arc;

use tracing::{debug, error, info};

use crate::repos::{NewUser, UserRecord, UserStore};
use crate::services::auth::display_name::derive_name;
use crate::services::auth::domain_policy::DomainPolicy;
use crate::services::auth::identity::ExternalIdentity;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DenialReason {
    MissingEmail,
    DomainNotAllowed,
}

impl DenialReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingEmail => "missing_email",
            Self::DomainNotAllowed => "domain_not_allowed",
        }
    }
}

/// Outcome of the user directory sync during an authorized sign-in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncStatus {
    Synced(UserRecord),
    SyncFailed,
}

/// Sign-in verdict.
///
/// `Authorized(SyncFailed)` still lets the user in: login availability wins over
/// keeping the user directory in step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignInDecision {
    Denied(DenialReason),
    Authorized(SyncStatus),
}

impl SignInDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Authorized(_))
    }

    pub fn denial_reason(&self) -> Option<DenialReason> {
        match self {
            Self::Denied(reason) => Some(*reason),
            Self::Authorized(_) => None,
        }
    }
}

/// Maps a verified external identity onto the internal user directory.
#[derive(Clone)]
pub struct UserReconciler {
    policy: DomainPolicy,
    users: Arc<dyn UserStore>,
}

impl std::fmt::Debug for UserReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserReconciler")
            .field("policy", &self.policy)
            .field("users", &self.users.backend_name())
            .finish()
    }
}

impl UserReconciler {
    pub fn new(policy: DomainPolicy, users: Arc<dyn UserStore>) -> Self {
        Self { policy, users }
    }

    /// Decide whether `identity` may sign in, syncing the user record on the way.
    ///
    /// The upsert is awaited before returning, but its failure never turns an
    /// authorized identity into a denial. No retries.
    pub async fn reconcile(&self, identity: &ExternalIdentity) -> SignInDecision {
        let Some(email) = identity.email.as_deref() else {
            debug!("sign-in rejected: identity carries no email");
            return SignInDecision::Denied(DenialReason::MissingEmail);
        };

        if !self.policy.is_allowed(Some(email)) {
            info!(email = %email, "sign-in rejected: email domain not allowed");
            return SignInDecision::Denied(DenialReason::DomainNotAllowed);
        }

        let name = identity
            .provided_name()
            .map(str::to_string)
            .unwrap_or_else(|| derive_name(email));

        let input = NewUser {
            email: email.to_string(),
            name,
            avatar_url: identity.avatar_url.clone(),
        };

        match self.users.create_or_update_user(input).await {
            Ok(record) => {
                info!(email = %email, user_id = %record.id, "user synced to directory");
                SignInDecision::Authorized(SyncStatus::Synced(record))
            }
            Err(e) => {
                error!(
                    email = %email,
                    backend = self.users.backend_name(),
                    error = %e,
                    "user directory sync failed; continuing sign-in"
                );
                SignInDecision::Authorized(SyncStatus::SyncFailed)
            }
        }
    }
}
