use axum_helpers::server::{create_production_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use database::postgres::{MigratorTrait, connect_from_config_with_retry, run_migrations};
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Before any fallible operation
    install_color_eyre();

    let config = Config::from_env()?;

    init_tracing(&config.environment);

    let db = connect_from_config_with_retry(config.database.clone(), None)
        .await
        .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))?;

    if config.run_migrations {
        run_migrations::<migration::Migrator>(&db, config.app.name)
            .await
            .map_err(|e| eyre::eyre!("Migration failed: {}", e))?;
    } else {
        let pending = migration::Migrator::get_pending_migrations(&db).await?;
        if !pending.is_empty() {
            tracing::warn!(pending = pending.len(), "Pending migrations; set RUN_MIGRATIONS=true");
        }
    }

    let state = AppState::new(config, db)?;

    let api_routes = api::routes(&state);
    let router = axum_helpers::create_router(api_routes, &state.config.cors_allowed_origin)?;

    // /health: liveness with app name/version
    // /ready: database check
    let app = router
        .merge(health_router(state.config.app))
        .merge(api::ready_router(state.clone()));

    info!(
        public_origin = state.config.public_origin.as_str(),
        "Starting contentflow API with graceful shutdown (30s timeout)"
    );

    let server = state.config.server.clone();
    create_production_app(app, &server, Duration::from_secs(30), async move {
        info!("Shutting down: closing database connections");
        match state.db.close().await {
            Ok(_) => info!("PostgreSQL connection closed successfully"),
            Err(e) => tracing::error!("Error closing PostgreSQL: {}", e),
        }
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Contentflow API shutdown complete");
    Ok(())
}
