//! In-memory store guarded by a Tokio mutex. Mirrors the uniqueness rules of
//! the SQL schema.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::rbac::{ActionType, Link, Relation, Role};
use crate::models::user::Identity;

use super::AuthStore;

#[derive(Debug, Default)]
struct InnerState {
    identities: HashMap<Uuid, Identity>,
    roles: HashMap<Uuid, Role>,
    action_types: HashMap<Uuid, ActionType>,
    links: Vec<Link>,
}

impl InnerState {
    fn position(&self, relation: Relation, holder_id: Uuid, target_id: Uuid) -> Option<usize> {
        self.links
            .iter()
            .position(|l| l.relation == relation && l.holder_id == holder_id && l.target_id == target_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<InnerState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthStore for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn find_identity_by_login(&self, login_id: &str) -> AppResult<Option<Identity>> {
        let state = self.state.lock().await;
        Ok(state.identities.values().find(|i| i.login_id == login_id).cloned())
    }

    async fn find_identity(&self, id: Uuid) -> AppResult<Option<Identity>> {
        Ok(self.state.lock().await.identities.get(&id).cloned())
    }

    async fn role_names_for_user(&self, user_id: Uuid) -> AppResult<Vec<String>> {
        let state = self.state.lock().await;
        let mut names: Vec<String> = state
            .links
            .iter()
            .filter(|l| l.relation == Relation::UserRole && l.holder_id == user_id)
            .filter_map(|l| state.roles.get(&l.target_id))
            .map(|r| r.name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn find_role(&self, id: Uuid) -> AppResult<Option<Role>> {
        Ok(self.state.lock().await.roles.get(&id).cloned())
    }

    async fn find_action_type(&self, id: Uuid) -> AppResult<Option<ActionType>> {
        Ok(self.state.lock().await.action_types.get(&id).cloned())
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let mut roles: Vec<Role> = self.state.lock().await.roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn list_action_types(&self) -> AppResult<Vec<ActionType>> {
        let mut action_types: Vec<ActionType> = self.state.lock().await.action_types.values().cloned().collect();
        action_types.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(action_types)
    }

    async fn insert_identity(&self, identity: &Identity) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state.identities.values().any(|i| i.login_id == identity.login_id) {
            return Err(AppError::conflict("login_id already in use"));
        }
        state.identities.insert(identity.id, identity.clone());
        Ok(())
    }

    async fn insert_role(&self, role: &Role) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state.roles.values().any(|r| r.name == role.name) {
            return Err(AppError::conflict("role name already exists"));
        }
        state.roles.insert(role.id, role.clone());
        Ok(())
    }

    async fn insert_action_type(&self, action_type: &ActionType) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state.action_types.values().any(|a| a.name == action_type.name) {
            return Err(AppError::conflict("action type name already exists"));
        }
        state.action_types.insert(action_type.id, action_type.clone());
        Ok(())
    }

    async fn link_if_absent(&self, link: &Link) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        if state.position(link.relation, link.holder_id, link.target_id).is_some() {
            return Ok(false);
        }
        state.links.push(link.clone());
        Ok(true)
    }

    async fn unlink_if_present(&self, relation: Relation, holder_id: Uuid, target_id: Uuid) -> AppResult<Option<Uuid>> {
        let mut state = self.state.lock().await;
        Ok(state
            .position(relation, holder_id, target_id)
            .map(|idx| state.links.remove(idx).id))
    }

    async fn linked_targets(&self, relation: Relation, holder_id: Uuid) -> AppResult<Vec<Uuid>> {
        let state = self.state.lock().await;
        Ok(state
            .links
            .iter()
            .filter(|l| l.relation == relation && l.holder_id == holder_id)
            .map(|l| l.target_id)
            .collect())
    }

    async fn count_links(&self, relation: Relation, holder_id: Uuid, target_id: Uuid) -> AppResult<i64> {
        let state = self.state.lock().await;
        Ok(state
            .links
            .iter()
            .filter(|l| l.relation == relation && l.holder_id == holder_id && l.target_id == target_id)
            .count() as i64)
    }
}
