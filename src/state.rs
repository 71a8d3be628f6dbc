/*
 * Responsibility
 * - Shared context bound to the Router (AppState)
 * - Cheap to clone (Arc inside); no per-user mutable state lives here
 */
use std::sync::Arc;

use crate::services::auth::{AuthCallbacks, IdentityAssertionVerifier};

#[derive(Clone, Debug)]
pub struct AppState {
    pub auth: Arc<AuthCallbacks>,
    pub assertions: Arc<IdentityAssertionVerifier>,
}

impl AppState {
    pub fn new(auth: Arc<AuthCallbacks>, assertions: Arc<IdentityAssertionVerifier>) -> Self {
        Self { auth, assertions }
    }
}
