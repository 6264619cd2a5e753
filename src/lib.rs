pub mod app;
pub mod authz;
pub mod credentials;
pub mod db;
pub mod docs;
pub mod errors;
pub mod jwt;
pub mod models;
pub mod reconciler;
pub mod routes;
pub mod store;
pub mod utils;

#[cfg(test)]
mod test_support;

// Re-export commonly used items for tests
pub use app::{build_router, create_app, AppState};
