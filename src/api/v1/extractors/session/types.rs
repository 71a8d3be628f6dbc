use crate::services::auth::SessionUser;

/// Raw `Authorization: Bearer <token>` value, if the request carries one.
///
/// Not verified; the auth service decides what an unusable token means.
#[derive(Debug, Clone, Default)]
pub struct BearerToken(pub Option<String>);

impl BearerToken {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

/// Session user whose id resolves to a stored user.
///
/// Extraction fails closed: no token, an invalid token, or a token carrying the
/// empty-id sentinel are all rejected with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub SessionUser);
