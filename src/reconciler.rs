//! Grant/assignment reconciliation.
//!
//! Per (holder, target) pair the state is `Absent` or `Present`:
//!
//! | desired | Absent            | Present           |
//! |---------|-------------------|-------------------|
//! | true    | create → Present  | no-op             |
//! | false   | no-op             | delete → Absent   |
//!
//! Each transition is a single conditional store operation, so concurrent
//! calls on the same pair cannot create a duplicate row or delete twice.

use std::fmt;

use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::rbac::{Link, Relation};
use crate::store::AuthStore;
use crate::utils::utc_now;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Created,
    Deleted,
    Unchanged,
}

impl ReconcileOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileOutcome::Created => "created",
            ReconcileOutcome::Deleted => "deleted",
            ReconcileOutcome::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct Reconciler<'a> {
    store: &'a dyn AuthStore,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a dyn AuthStore) -> Self {
        Self { store }
    }

    /// Makes "role may perform action type" equal to `permission`.
    pub async fn set_grant(&self, role_id: Uuid, action_id: Uuid, permission: bool) -> AppResult<ReconcileOutcome> {
        let relation = Relation::RolePermission;

        let role = self.store.find_role(role_id).await?.ok_or_else(|| missing_holder(relation, role_id))?;
        let action_type = self
            .store
            .find_action_type(action_id)
            .await?
            .ok_or_else(|| missing_target(relation, action_id))?;

        self.apply(relation, role.id, action_type.id, &action_type.name, permission).await
    }

    /// Makes "user holds role" equal to `active`.
    pub async fn set_assignment(&self, user_id: Uuid, role_id: Uuid, active: bool) -> AppResult<ReconcileOutcome> {
        let relation = Relation::UserRole;

        let user = self.store.find_identity(user_id).await?.ok_or_else(|| missing_holder(relation, user_id))?;
        let role = self.store.find_role(role_id).await?.ok_or_else(|| missing_target(relation, role_id))?;

        self.apply(relation, user.id, role.id, &role.name, active).await
    }

    async fn apply(
        &self,
        relation: Relation,
        holder_id: Uuid,
        target_id: Uuid,
        display_name: &str,
        desired: bool,
    ) -> AppResult<ReconcileOutcome> {
        let outcome = if desired {
            let link = Link::new(relation, holder_id, target_id, display_name, utc_now());
            if self.store.link_if_absent(&link).await? {
                ReconcileOutcome::Created
            } else {
                ReconcileOutcome::Unchanged
            }
        } else {
            match self.store.unlink_if_present(relation, holder_id, target_id).await? {
                Some(_) => ReconcileOutcome::Deleted,
                None => ReconcileOutcome::Unchanged,
            }
        };

        tracing::info!(
            relation = relation.as_str(),
            holder_id = %holder_id,
            target_id = %target_id,
            desired,
            outcome = %outcome,
            "reconciled"
        );

        Ok(outcome)
    }
}

fn missing_holder(relation: Relation, id: Uuid) -> AppError {
    AppError::not_found(format!("{} with ID {} does not exist", relation.holder_kind(), id))
}

fn missing_target(relation: Relation, id: Uuid) -> AppError {
    AppError::not_found(format!("{} with ID {} does not exist", relation.target_kind(), id))
}
