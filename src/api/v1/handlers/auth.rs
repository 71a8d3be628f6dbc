/*
 * Responsibility
 * - Identity-provider callback surface over HTTP
 *   - POST /auth/callback/signin: signed identity assertion in, signed session token out
 *   - GET  /auth/session: current session (user null when there is none)
 *   - POST /auth/signout: lifecycle event only; tokens are stateless
 */
use axum::{Json, extract::State, http::StatusCode};

use crate::api::v1::dto::auth::{SignInRequest, SignInResponse};
use crate::api::v1::extractors::BearerToken;
use crate::error::AppError;
use crate::services::auth::SessionView;
use crate::state::AppState;

pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> Result<Json<SignInResponse>, AppError> {
    // Unverified callers never reach the reconciler.
    let identity = state.assertions.verify(&req.id_token)?;
    let issued = state.auth.complete_sign_in(&identity).await?;
    Ok(Json(issued.into()))
}

pub async fn session(State(state): State<AppState>, bearer: BearerToken) -> Json<SessionView> {
    Json(state.auth.current_session(bearer.as_deref()).await)
}

pub async fn sign_out(State(state): State<AppState>, bearer: BearerToken) -> StatusCode {
    state.auth.sign_out_raw(bearer.as_deref());
    StatusCode::NO_CONTENT
}
