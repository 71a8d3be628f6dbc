/*
 * Responsibility
 * - URL layout of v1
 * - Sign-in callback requires a signed identity assertion in its body
 * - Session and signout routes are open; /me requires a bound session via its extractor
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::v1::handlers::{
    auth::{session, sign_in, sign_out},
    me::me,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/callback/signin", post(sign_in))
        .route("/auth/session", get(session))
        .route("/auth/signout", post(sign_out))
        .route("/me", get(me))
}
