pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod middleware;
pub mod observability;
pub mod routes;
pub mod session;

pub use routes::AppState;

/// Build the full application router from its parts. The `serve`
/// command and the integration tests share this entry point.
pub fn create_app(
    config: config::Config,
    read_pool: sqlx::SqlitePool,
    write_pool: sqlx::SqlitePool,
    email: email::EmailService,
) -> axum::Router {
    routes::router(AppState {
        config,
        read_pool,
        write_pool,
        email,
    })
}
