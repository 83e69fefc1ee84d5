pub mod handlers;

use sea_orm::DatabaseConnection;

/// Shared request state. The database handle is constructed once in `main`
/// and cloned into each request by axum.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
}
