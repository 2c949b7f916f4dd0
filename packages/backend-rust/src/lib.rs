pub mod config;
pub mod db;
pub mod logging;
pub mod response;
pub mod routes;
pub mod seed;
pub mod services;
pub mod state;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::db::Database;
use crate::state::AppState;

/// Open the database, optionally seed it, and build the shared state.
pub async fn init_state(config: &Config, database: Database) -> AppState {
    if config.seed_demo_data {
        if let Err(err) = seed::seed_demo_dictionary(database.pool()).await {
            tracing::warn!(error = %err, "failed to seed demo dictionary");
        }
    }

    AppState::new(database, config.session)
}

pub fn build_app(state: AppState) -> axum::Router {
    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
