pub mod session;

pub use session::{BearerToken, CurrentUser};
