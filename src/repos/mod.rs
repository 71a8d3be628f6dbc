/*
 * Responsibility
 * - Public surface of the user persistence layer
 */
pub mod error;
pub mod memory_user_repo;
pub mod user_repo;

pub use error::{RepoError, RepoResult};
pub use memory_user_repo::InMemoryUserRepo;
pub use user_repo::{NewUser, PgUserRepo, UserRecord, UserStore};
