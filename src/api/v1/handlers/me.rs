use axum::Json;

use crate::api::v1::extractors::CurrentUser;
use crate::services::auth::SessionUser;

/// GET /me: the signed-in user. Only sessions bound to a stored user get here.
pub async fn me(CurrentUser(user): CurrentUser) -> Json<SessionUser> {
    Json(user)
}
