//! Fixtures shared by unit tests.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::rbac::{ActionType, Link, Relation, Role};
use crate::models::user::Identity;
use crate::store::AuthStore;
use crate::utils::PasswordHasher;

pub const PRIVATE_PEM: &[u8] = include_bytes!("../tests/fixtures/jwt_private.pem");
pub const PUBLIC_PEM: &[u8] = include_bytes!("../tests/fixtures/jwt_public.pem");
pub const OTHER_PRIVATE_PEM: &[u8] = include_bytes!("../tests/fixtures/other_private.pem");

pub fn hasher() -> PasswordHasher {
    PasswordHasher::new("unit-test-secret").unwrap()
}

pub async fn seed_user(store: &dyn AuthStore, login_id: &str, password: &str) -> Identity {
    seed_user_with_window(store, login_id, password, Utc::now() - chrono::Duration::days(1), None).await
}

pub async fn seed_user_with_window(
    store: &dyn AuthStore,
    login_id: &str,
    password: &str,
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
) -> Identity {
    let now = Utc::now();
    let identity = Identity {
        id: Uuid::new_v4(),
        first_name: "Bat".into(),
        last_name: "Erdene".into(),
        login_id: login_id.into(),
        email_work: format!("{login_id}@company.mn"),
        email_personal: None,
        phone_number_work: None,
        phone_number_personal: Some("99112233".into()),
        is_active: Some(true),
        active_start_date: start,
        active_end_date: end,
        password_hash: hasher().hash(password),
        created_at: now,
        updated_at: now,
    };
    store.insert_identity(&identity).await.unwrap();
    identity
}

pub async fn seed_role(store: &dyn AuthStore, name: &str) -> Role {
    let role = Role::new(name, Utc::now()).unwrap();
    store.insert_role(&role).await.unwrap();
    role
}

pub async fn seed_action_type(store: &dyn AuthStore, name: &str) -> ActionType {
    let now = Utc::now();
    let action_type = ActionType {
        id: Uuid::new_v4(),
        name: name.into(),
        description: None,
        created_at: now,
        updated_at: now,
    };
    store.insert_action_type(&action_type).await.unwrap();
    action_type
}

pub async fn seed_role_for(store: &dyn AuthStore, user_id: Uuid, name: &str) -> Role {
    let role = seed_role(store, name).await;
    let link = Link::new(Relation::UserRole, user_id, role.id, &role.name, Utc::now());
    store.link_if_absent(&link).await.unwrap();
    role
}
