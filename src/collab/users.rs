//! User store collaborator
//!
//! Executions run on behalf of an owner; handlers fetch the owner's
//! email (default notification recipient) and source-control token.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::{Result, StrixError};

/// Principal an execution runs on behalf of
#[derive(Debug, Clone)]
pub struct Owner {
    pub id: Uuid,
    pub email: String,
    pub access_token: Option<String>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, owner: Uuid) -> Result<Owner>;
}

/// DashMap-backed store, the crate's default implementation
#[derive(Default)]
pub struct InMemoryUserStore {
    users: DashMap<Uuid, Owner>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, owner: Owner) {
        self.users.insert(owner.id, owner);
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get_user(&self, owner: Uuid) -> Result<Owner> {
        self.users
            .get(&owner)
            .map(|o| o.clone())
            .ok_or_else(|| StrixError::UnknownOwner {
                owner: owner.to_string(),
            })
    }
}
