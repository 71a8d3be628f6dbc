//! Sign-in / sign-out lifecycle notifications.
//!
//! Logging only. Implementations must not fail or block; callers never look at
//! a result.

use tracing::info;

use crate::services::auth::reconciler::DenialReason;

pub trait LifecycleEvents: Send + Sync {
    fn on_sign_in(&self, email: &str);

    fn on_sign_in_denied(&self, email: Option<&str>, reason: DenialReason);

    fn on_sign_out(&self, email: Option<&str>);
}

/// Writes lifecycle events to the `tracing` subscriber.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLifecycle;

impl LifecycleEvents for TracingLifecycle {
    fn on_sign_in(&self, email: &str) {
        info!(event = "sign_in", email = %email, "login successful");
    }

    fn on_sign_in_denied(&self, email: Option<&str>, reason: DenialReason) {
        info!(
            event = "sign_in_denied",
            email = email.unwrap_or("<none>"),
            reason = reason.as_str(),
            "login denied"
        );
    }

    fn on_sign_out(&self, email: Option<&str>) {
        info!(event = "sign_out", email = email.unwrap_or("<unknown>"), "logout");
    }
}
