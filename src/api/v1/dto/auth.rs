/*
 * Responsibility
 * - Request/response DTOs for the auth endpoints
 * - The sign-in request carries a signed identity assertion, never a bare profile
 */
use serde::{Deserialize, Serialize};

use crate::services::auth::{IssuedSession, SessionView};

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub id_token: String,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub token: String,
    /// Always "Bearer"
    pub token_type: &'static str,
    /// Seconds until the token expires.
    pub expires_in: u64,
    pub session: SessionView,
}

impl From<IssuedSession> for SignInResponse {
    fn from(issued: IssuedSession) -> Self {
        Self {
            token: issued.token,
            token_type: "Bearer",
            expires_in: issued.expires_in,
            session: issued.session,
        }
    }
}
