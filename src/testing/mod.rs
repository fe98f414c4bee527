//! Shared fixtures for unit tests.

use std::sync::Arc;

use crate::auth::{Identity, Role};
use crate::store::{MemoryStore, Store};

/// Non-admin caller with the given user id
pub fn user(id: i64) -> Identity {
    Identity { user_id: id, username: format!("user{}", id), role: Role::User }
}

pub fn admin() -> Identity {
    Identity { user_id: 1, username: "admin".to_string(), role: Role::Admin }
}

pub fn memory_store() -> Arc<dyn Store> {
    Arc::new(MemoryStore::new())
}
