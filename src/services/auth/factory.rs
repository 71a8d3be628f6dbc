//! Factories: `AuthCallbacks` from `Config` and a user store, plus the identity-assertion verifier.
use std::sync::Arc;

use crate::config::Config;
use crate::repos::UserStore;
use crate::services::auth::{
    AuthCallbacks, claims::ClaimPropagator, domain_policy::DomainPolicy,
    events::TracingLifecycle, identity_assertion::IdentityAssertionVerifier,
    reconciler::UserReconciler, session_token::SessionTokenCodec,
};

pub fn build_auth_callbacks(config: &Config, users: Arc<dyn UserStore>) -> Arc<AuthCallbacks> {
    let policy = DomainPolicy::new(config.allowed_email_domains.iter().cloned());
    let reconciler = UserReconciler::new(policy, users.clone());
    let claims = ClaimPropagator::new(users, config.session_max_age_seconds);
    let codec = SessionTokenCodec::new(&config.session_secret, config.session_max_age_seconds);

    Arc::new(AuthCallbacks::new(
        reconciler,
        claims,
        codec,
        Arc::new(TracingLifecycle),
    ))
}

pub fn build_identity_verifier(config: &Config) -> Arc<IdentityAssertionVerifier> {
    Arc::new(IdentityAssertionVerifier::new(&config.signin_callback_secret))
}
