//! Ownership & visibility policy
//!
//! Pure decision logic: who may see or mutate which record. Admins bypass
//! ownership; everyone else is confined to records where
//! `created_by == identity.user_id`.

use serde_json::{json, Value};

use super::error::{ServiceError, ServiceResult};
use crate::auth::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ReadList,
    ReadOne,
    Create,
    Update,
    SoftDelete,
    Restore,
    HardDelete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ReadList => "read_list",
            Action::ReadOne => "read_one",
            Action::Create => "create",
            Action::Update => "update",
            Action::SoftDelete => "soft_delete",
            Action::Restore => "restore",
            Action::HardDelete => "hard_delete",
        }
    }
}

/// An allowed action plus the ownership constraint every query for it must carry.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    /// `{"created_by": id}` for non-admins, `None` for admins
    pub scope: Option<Value>,
}

impl Decision {
    /// Scope as a filter fragment (`null` when unrestricted)
    pub fn scope_filter(&self) -> Value {
        self.scope.clone().unwrap_or(Value::Null)
    }
}

fn ownership_scope(identity: &Identity) -> Option<Value> {
    if identity.is_admin() {
        None
    } else {
        Some(json!({ "created_by": identity.user_id }))
    }
}

/// Decide whether `identity` may perform `action` on a record owned by
/// `target_owner`. List actions and `Create` take no owner.
pub fn authorize(identity: &Identity, action: Action, target_owner: Option<i64>) -> ServiceResult<Decision> {
    let scope = ownership_scope(identity);
    match action {
        Action::ReadList | Action::Create => Ok(Decision { scope }),
        _ => {
            let allowed = identity.is_admin() || target_owner == Some(identity.user_id);
            if allowed {
                Ok(Decision { scope })
            } else {
                Err(ServiceError::forbidden(format!(
                    "Not allowed to {} this record",
                    action.as_str().replace('_', " ")
                )))
            }
        }
    }
}

/// Gate for admin-only routes. Always 403, never remapped.
pub fn require_admin(identity: &Identity) -> ServiceResult<()> {
    if identity.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::forbidden("Admin access required"))
    }
}
