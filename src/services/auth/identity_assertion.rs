//! Signed identity assertions handed over by the provider integration.
//!
//! The integration finishes the OAuth exchange, then signs the verified
//! profile as an HS256 JWT with the shared callback secret. Nothing reaches
//! the reconciler unless that signature, the audience and the expiry check out.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::services::auth::identity::ExternalIdentity;

pub const IDENTITY_ASSERTION_AUDIENCE: &str = "campus-auth:signin";

#[derive(Debug, Error)]
pub enum IdentityAssertionError {
    #[error("identity assertion has expired")]
    Expired,
    #[error("identity assertion has the wrong audience")]
    InvalidAudience,
    #[error("invalid identity assertion: {0}")]
    Invalid(jsonwebtoken::errors::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct AssertionClaims {
    #[serde(flatten)]
    identity: ExternalIdentity,
    aud: String,
    exp: i64,
}

#[derive(Clone)]
pub struct IdentityAssertionVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for IdentityAssertionVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityAssertionVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl IdentityAssertionVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[IDENTITY_ASSERTION_AUDIENCE]);
        validation.set_required_spec_claims(&["exp", "aud"]);

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Check signature, audience and expiry, then hand back the asserted identity.
    pub fn verify(&self, raw: &str) -> Result<ExternalIdentity, IdentityAssertionError> {
        let data = jsonwebtoken::decode::<AssertionClaims>(raw, &self.decoding_key, &self.validation)
            .map_err(|e| {
                let err = match e.kind() {
                    ErrorKind::ExpiredSignature => IdentityAssertionError::Expired,
                    ErrorKind::InvalidAudience => IdentityAssertionError::InvalidAudience,
                    _ => IdentityAssertionError::Invalid(e),
                };
                warn!(error = %err, "rejected identity assertion");
                err
            })?;

        Ok(data.claims.identity)
    }
}

/// Sign `identity` the way the provider integration does.
#[cfg(test)]
pub(crate) fn sign_identity_assertion(
    secret: &str,
    identity: &ExternalIdentity,
    audience: &str,
    ttl_seconds: i64,
) -> String {
    use jsonwebtoken::{EncodingKey, Header};

    let claims = AssertionClaims {
        identity: identity.clone(),
        aud: audience.to_string(),
        exp: chrono::Utc::now().timestamp() + ttl_seconds,
    };
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "callback-secret-that-is-32-bytes-long";

    fn alice() -> ExternalIdentity {
        ExternalIdentity {
            email: Some("alice@gmail.com".to_string()),
            display_name: Some("Alice".to_string()),
            avatar_url: None,
        }
    }

    #[test]
    fn test_valid_assertion_yields_identity() {
        let raw = sign_identity_assertion(SECRET, &alice(), IDENTITY_ASSERTION_AUDIENCE, 300);
        let identity = IdentityAssertionVerifier::new(SECRET).verify(&raw).unwrap();
        assert_eq!(identity, alice());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let raw = sign_identity_assertion(
            "some-other-secret-that-is-32-bytes!!",
            &alice(),
            IDENTITY_ASSERTION_AUDIENCE,
            300,
        );
        assert!(matches!(
            IdentityAssertionVerifier::new(SECRET).verify(&raw),
            Err(IdentityAssertionError::Invalid(_))
        ));
    }

    #[test]
    fn test_wrong_audience_is_rejected() {
        let raw = sign_identity_assertion(SECRET, &alice(), "someone-else", 300);
        assert!(matches!(
            IdentityAssertionVerifier::new(SECRET).verify(&raw),
            Err(IdentityAssertionError::InvalidAudience)
        ));
    }

    #[test]
    fn test_expired_assertion_is_rejected() {
        let raw = sign_identity_assertion(SECRET, &alice(), IDENTITY_ASSERTION_AUDIENCE, -3600);
        assert!(matches!(
            IdentityAssertionVerifier::new(SECRET).verify(&raw),
            Err(IdentityAssertionError::Expired)
        ));
    }

    #[test]
    fn test_plain_json_is_not_an_assertion() {
        assert!(matches!(
            IdentityAssertionVerifier::new(SECRET).verify(r#"{"email":"alice@gmail.com"}"#),
            Err(IdentityAssertionError::Invalid(_))
        ));
    }
}
