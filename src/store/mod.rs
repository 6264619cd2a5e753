//! Data store collaborator.
//!
//! Components take an `&dyn AuthStore` so tests can swap the SQLite store for
//! the in-memory one. The store never caches across calls.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppResult;
use crate::models::rbac::{ActionType, Link, Relation, Role};
use crate::models::user::Identity;

#[async_trait]
pub trait AuthStore: Send + Sync {
    /// Cheap round trip used by the health check.
    async fn ping(&self) -> AppResult<()>;

    async fn find_identity_by_login(&self, login_id: &str) -> AppResult<Option<Identity>>;

    async fn find_identity(&self, id: Uuid) -> AppResult<Option<Identity>>;

    /// Names of the roles assigned to the user, ordered by name.
    async fn role_names_for_user(&self, user_id: Uuid) -> AppResult<Vec<String>>;

    async fn find_role(&self, id: Uuid) -> AppResult<Option<Role>>;

    async fn find_action_type(&self, id: Uuid) -> AppResult<Option<ActionType>>;

    async fn list_roles(&self) -> AppResult<Vec<Role>>;

    async fn list_action_types(&self) -> AppResult<Vec<ActionType>>;

    /// Fails with `Conflict` when the login handle is taken.
    async fn insert_identity(&self, identity: &Identity) -> AppResult<()>;

    /// Fails with `Conflict` when the role name is taken.
    async fn insert_role(&self, role: &Role) -> AppResult<()>;

    /// Fails with `Conflict` when the action type name is taken.
    async fn insert_action_type(&self, action_type: &ActionType) -> AppResult<()>;

    /// Inserts `link` unless a row for its (holder, target) pair exists, as one
    /// atomic step. Returns whether a row was created.
    async fn link_if_absent(&self, link: &Link) -> AppResult<bool>;

    /// Deletes the row for (holder, target) by its own id, as one atomic step.
    /// Returns the id of the deleted row.
    async fn unlink_if_present(&self, relation: Relation, holder_id: Uuid, target_id: Uuid) -> AppResult<Option<Uuid>>;

    /// Target ids currently linked to `holder_id`.
    async fn linked_targets(&self, relation: Relation, holder_id: Uuid) -> AppResult<Vec<Uuid>>;

    async fn count_links(&self, relation: Relation, holder_id: Uuid, target_id: Uuid) -> AppResult<i64>;
}
