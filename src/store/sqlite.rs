use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::row_parsers::{self, format_datetime, parse_uuid};
use crate::errors::{AppError, AppResult};
use crate::models::rbac::{ActionType, Link, Relation, Role};
use crate::models::user::Identity;

use super::AuthStore;

const IDENTITY_COLUMNS: &str = "id, first_name, last_name, login_id, email_work, email_personal, \
     phone_number_work, phone_number_personal, is_active, active_start_date, active_end_date, \
     password, created_at, updated_at";

/// Table layout of a join relation: (table, holder column, target column, display column).
fn layout(relation: Relation) -> (&'static str, &'static str, &'static str, &'static str) {
    match relation {
        Relation::RolePermission => ("role_permissions", "role_id", "action_id", "action_type_name"),
        Relation::UserRole => ("user_roles", "user_id", "role_id", "role_name"),
    }
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl AuthStore for SqliteStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    async fn find_identity_by_login(&self, login_id: &str) -> AppResult<Option<Identity>> {
        let sql = format!("SELECT {IDENTITY_COLUMNS} FROM users WHERE login_id = ?");
        let row = sqlx::query(&sql).bind(login_id).fetch_optional(&self.pool).await?;

        row.as_ref().map(row_parsers::identity_from_row).transpose()
    }

    async fn find_identity(&self, id: Uuid) -> AppResult<Option<Identity>> {
        let sql = format!("SELECT {IDENTITY_COLUMNS} FROM users WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_parsers::identity_from_row).transpose()
    }

    async fn role_names_for_user(&self, user_id: Uuid) -> AppResult<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            r#"
            SELECT r.name
            FROM user_roles ur
            INNER JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = ?
            ORDER BY r.name
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }

    async fn find_role(&self, id: Uuid) -> AppResult<Option<Role>> {
        let row = sqlx::query("SELECT id, name, created_at, updated_at FROM roles WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_parsers::role_from_row).transpose()
    }

    async fn find_action_type(&self, id: Uuid) -> AppResult<Option<ActionType>> {
        let row = sqlx::query("SELECT id, name, description, created_at, updated_at FROM action_types WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_parsers::action_type_from_row).transpose()
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let rows = sqlx::query("SELECT id, name, created_at, updated_at FROM roles ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_parsers::role_from_row).collect()
    }

    async fn list_action_types(&self) -> AppResult<Vec<ActionType>> {
        let rows = sqlx::query("SELECT id, name, description, created_at, updated_at FROM action_types ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_parsers::action_type_from_row).collect()
    }

    async fn insert_identity(&self, identity: &Identity) -> AppResult<()> {
        let sql = format!(
            "INSERT INTO users ({IDENTITY_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        );

        sqlx::query(&sql)
            .bind(identity.id.to_string())
            .bind(&identity.first_name)
            .bind(&identity.last_name)
            .bind(&identity.login_id)
            .bind(&identity.email_work)
            .bind(&identity.email_personal)
            .bind(&identity.phone_number_work)
            .bind(&identity.phone_number_personal)
            .bind(identity.is_active)
            .bind(format_datetime(&identity.active_start_date))
            .bind(identity.active_end_date.as_ref().map(format_datetime))
            .bind(&identity.password_hash)
            .bind(format_datetime(&identity.created_at))
            .bind(format_datetime(&identity.updated_at))
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_unique_violation(e, "login_id already in use"))?;

        Ok(())
    }

    async fn insert_role(&self, role: &Role) -> AppResult<()> {
        sqlx::query("INSERT INTO roles (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)")
            .bind(role.id.to_string())
            .bind(&role.name)
            .bind(format_datetime(&role.created_at))
            .bind(format_datetime(&role.updated_at))
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_unique_violation(e, "role name already exists"))?;

        Ok(())
    }

    async fn insert_action_type(&self, action_type: &ActionType) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO action_types (id, name, description, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(action_type.id.to_string())
        .bind(&action_type.name)
        .bind(&action_type.description)
        .bind(format_datetime(&action_type.created_at))
        .bind(format_datetime(&action_type.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "action type name already exists"))?;

        Ok(())
    }

    async fn link_if_absent(&self, link: &Link) -> AppResult<bool> {
        let (table, holder, target, display) = layout(link.relation);
        // the unique index on (holder, target) makes this insert-if-absent atomic
        let sql = format!(
            "INSERT INTO {table} (id, {holder}, {target}, {display}, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?) \
             ON CONFLICT({holder}, {target}) DO NOTHING"
        );
        let now = format_datetime(&link.created_at);

        let result = sqlx::query(&sql)
            .bind(link.id.to_string())
            .bind(link.holder_id.to_string())
            .bind(link.target_id.to_string())
            .bind(&link.display_name)
            .bind(&now)
            .bind(&now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn unlink_if_present(&self, relation: Relation, holder_id: Uuid, target_id: Uuid) -> AppResult<Option<Uuid>> {
        let (table, holder, target, _) = layout(relation);
        let sql = format!(
            "DELETE FROM {table} WHERE id = ( \
                 SELECT id FROM {table} WHERE {holder} = ? AND {target} = ? ORDER BY created_at LIMIT 1 \
             ) RETURNING id"
        );

        let deleted: Option<String> = sqlx::query_scalar(&sql)
            .bind(holder_id.to_string())
            .bind(target_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        deleted.as_deref().map(parse_uuid).transpose()
    }

    async fn linked_targets(&self, relation: Relation, holder_id: Uuid) -> AppResult<Vec<Uuid>> {
        let (table, holder, target, _) = layout(relation);
        let sql = format!("SELECT {target} FROM {table} WHERE {holder} = ?");

        let ids: Vec<String> = sqlx::query_scalar(&sql)
            .bind(holder_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        ids.iter().map(|id| parse_uuid(id)).collect()
    }

    async fn count_links(&self, relation: Relation, holder_id: Uuid, target_id: Uuid) -> AppResult<i64> {
        let (table, holder, target, _) = layout(relation);
        let sql = format!("SELECT COUNT(1) FROM {table} WHERE {holder} = ? AND {target} = ?");

        let count: i64 = sqlx::query_scalar(&sql)
            .bind(holder_id.to_string())
            .bind(target_id.to_string())
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
