/*!
 * Session extractors
 *
 * Responsibility:
 * - Hand handlers the raw bearer token (optional) or a session bound to a stored user
 * - HTTP / axum specifics stay in core; the types live in types
 */

mod core;
mod types;

pub use types::{BearerToken, CurrentUser};
