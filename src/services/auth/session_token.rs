use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::services::auth::claims::SessionToken;

#[derive(Debug, Error)]
pub enum SessionTokenError {
    #[error("failed to sign session token: {0}")]
    Sign(jsonwebtoken::errors::Error),
    #[error("session token has expired")]
    Expired,
    #[error("invalid session token: {0}")]
    Invalid(jsonwebtoken::errors::Error),
}

/// Wire form: the four identity claims plus issue/expiry times.
#[derive(Debug, Serialize, Deserialize)]
struct SessionTokenClaims {
    #[serde(flatten)]
    token: SessionToken,
    iat: i64,
    exp: i64,
}

/// HS256 signer/verifier for session tokens.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct SessionTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    max_age_seconds: u64,
}

impl std::fmt::Debug for SessionTokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokenCodec")
            .field("validation", &self.validation)
            .field("max_age_seconds", &self.max_age_seconds)
            .finish()
    }
}

impl SessionTokenCodec {
    pub fn new(secret: &str, max_age_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            max_age_seconds,
        }
    }

    pub fn max_age_seconds(&self) -> u64 {
        self.max_age_seconds
    }

    /// Sign `token`; it expires one max-age from now.
    pub fn encode(&self, token: &SessionToken) -> Result<String, SessionTokenError> {
        self.encode_issued_at(token, Utc::now())
    }

    pub fn encode_issued_at(
        &self,
        token: &SessionToken,
        issued_at: DateTime<Utc>,
    ) -> Result<String, SessionTokenError> {
        let iat = issued_at.timestamp();
        let claims = SessionTokenClaims {
            token: token.clone(),
            iat,
            exp: iat.saturating_add(i64::try_from(self.max_age_seconds).unwrap_or(i64::MAX)),
        };

        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());
        jsonwebtoken::encode(&header, &claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "failed to sign session token");
            SessionTokenError::Sign(e)
        })
    }

    /// Verify signature and expiry, then return the carried claims.
    pub fn decode(&self, raw: &str) -> Result<SessionToken, SessionTokenError> {
        let data = jsonwebtoken::decode::<SessionTokenClaims>(raw, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => SessionTokenError::Expired,
                _ => SessionTokenError::Invalid(e),
            })?;

        Ok(data.claims.token)
    }
}
