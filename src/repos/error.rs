/*
 * Responsibility
 * - What the persistence layer reports upward
 * - Callers decide the policy (the sign-in path absorbs these)
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("db error")]
    Db(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;
