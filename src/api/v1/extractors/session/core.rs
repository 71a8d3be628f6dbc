use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::error::AppError;
use crate::state::AppState;

use super::{BearerToken, CurrentUser};

fn bearer_from_parts(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(BearerToken(bearer_from_parts(parts)))
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = bearer_from_parts(parts).ok_or(AppError::Unauthorized)?;
        let session = state.auth.current_session(Some(&raw)).await;

        match session.user {
            Some(user) if user.user_id().is_some() => Ok(CurrentUser(user)),
            Some(user) => {
                tracing::warn!(email = %user.email, "session is not bound to a stored user");
                Err(AppError::Unauthorized)
            }
            None => Err(AppError::Unauthorized),
        }
    }
}
