pub mod callbacks;
pub mod claims;
pub mod display_name;
pub mod domain_policy;
pub mod events;
pub mod factory;
pub mod identity;
pub mod identity_assertion;
pub mod reconciler;
pub mod session_token;

pub use callbacks::{AuthCallbacks, IssuedSession};
pub use claims::{SessionToken, SessionUser, SessionView};
pub use factory::{build_auth_callbacks, build_identity_verifier};
pub use identity::ExternalIdentity;
pub use identity_assertion::IdentityAssertionVerifier;
