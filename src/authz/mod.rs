//! Access control for protected routes.
//!
//! - `Principal`: verified identity and role claims of the caller
//! - `RoleGate` + `require_roles`: per-route role allow-list middleware

mod gate;
mod principal;

pub use gate::{require_roles, RoleGate};
pub use principal::Principal;

/// Well-known role names
pub mod roles {
    pub const ADMIN: &str = "ADMIN";
    pub const MANAGER: &str = "MANAGER";
    pub const EMPLOYEE: &str = "EMPLOYEE";
}
