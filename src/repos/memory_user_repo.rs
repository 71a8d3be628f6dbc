//! In-process user store.
//!
//! Used when `DATABASE_URL` is not configured (local development) and by tests.
//! State lives only as long as the process.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::repos::error::RepoResult;
use crate::repos::user_repo::{NewUser, UserRecord, UserStore};

#[derive(Debug, Default)]
pub struct InMemoryUserRepo {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserRepo {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create_or_update_user(&self, input: NewUser) -> RepoResult<UserRecord> {
        let now = Utc::now();
        let mut users = self.users.write().await;

        let record = users
            .entry(input.email.clone())
            .and_modify(|existing| {
                existing.name = input.name.clone();
                existing.avatar_url = input.avatar_url.clone();
                existing.updated_at = now;
            })
            .or_insert_with(|| UserRecord {
                id: Uuid::new_v4(),
                email: input.email.clone(),
                name: input.name.clone(),
                avatar_url: input.avatar_url.clone(),
                created_at: now,
                updated_at: now,
            });

        Ok(record.clone())
    }

    async fn get_user_by_email(&self, email: &str) -> RepoResult<Option<UserRecord>> {
        Ok(self.users.read().await.get(email).cloned())
    }
}
