use anyhow::Result;
use campushub_core::member::{self, MembershipStatus, Role, SignupInput, SignupOutcome};
use sqlx::SqlitePool;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::config::{AdminConfig, Config};
use crate::email::EmailService;
use crate::routes::AppState;

pub async fn serve(
    config: Config,
    host_override: Option<String>,
    port_override: Option<u16>,
) -> Result<()> {
    tracing::info!("Starting CampusHub server...");

    // Use CLI overrides if provided, otherwise use config
    let host = host_override.unwrap_or(config.server.host.to_owned());
    let port = port_override.unwrap_or(config.server.port);

    // Set up database connection pools with optimized PRAGMAs
    // Write pool: 1 connection so SQLite writes serialize in the pool
    let write_pool = crate::db::create_write_pool(&config.database.url).await?;

    // Read pool: multiple connections for read-only page queries
    let read_pool =
        crate::db::create_read_pool(&config.database.url, config.database.max_connections).await?;

    campushub_core::MIGRATOR.run(&write_pool).await?;
    tracing::info!("Database migrations are up to date");

    bootstrap_admin(&write_pool, &config.admin).await?;

    let email = EmailService::new(&config.email)?;

    let state = AppState {
        config,
        read_pool: read_pool.clone(),
        write_pool: write_pool.clone(),
        email,
    };

    let app = crate::routes::router(state)
        // Enable Brotli and Gzip compression for all text assets
        .layer(CompressionLayer::new().br(true).gzip(true))
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    // Set up graceful shutdown signal handler
    let shutdown_signal = async {
        let ctrl_c = async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                tracing::info!("Received Ctrl+C signal");
            },
            _ = terminate => {
                tracing::info!("Received SIGTERM signal");
            },
        }

        tracing::info!("Starting graceful shutdown...");
    };

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    // Close database pools
    tracing::info!("Closing database pools...");
    read_pool.close().await;
    write_pool.close().await;
    tracing::info!("Database pools closed");

    tracing::info!("Graceful shutdown complete");

    Ok(())
}

/// Create the configured admin account when it does not exist yet. An
/// empty password disables the bootstrap entirely.
async fn bootstrap_admin(write_pool: &SqlitePool, admin: &AdminConfig) -> Result<()> {
    if admin.password.is_empty() {
        tracing::info!("Admin bootstrap skipped, no password configured");
        return Ok(());
    }

    if member::find_by_email(write_pool, &admin.email).await?.is_some() {
        return Ok(());
    }

    let outcome = member::signup(
        write_pool,
        SignupInput {
            full_name: admin.full_name.to_owned(),
            matric_no: admin.matric_no.to_owned(),
            email: admin.email.to_owned(),
            password: admin.password.to_owned(),
        },
    )
    .await?;

    match outcome {
        SignupOutcome::Created { member_id } => {
            member::set_role(write_pool, &member_id, Role::Admin).await?;
            member::set_membership_status(write_pool, &member_id, MembershipStatus::Active).await?;
            tracing::info!(member_id = %member_id, email = %admin.email, "Bootstrap admin created");
        }
        SignupOutcome::EmailTaken | SignupOutcome::MatricTaken => {
            tracing::warn!(
                email = %admin.email,
                "Bootstrap admin skipped, email or matric number already in use"
            );
        }
    }

    Ok(())
}
