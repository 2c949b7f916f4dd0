use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::config::SessionDefaults;
use crate::db::operations::progress::SqliteProgressStore;
use crate::db::Database;
use crate::services::LearningEngine;

pub type Engine = LearningEngine<SqliteProgressStore>;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    database: Database,
    engine: Arc<Engine>,
    session_defaults: SessionDefaults,
}

impl AppState {
    pub fn new(database: Database, session_defaults: SessionDefaults) -> Self {
        let store = SqliteProgressStore::new(database.pool().clone());
        let engine = LearningEngine::new(store).with_seed(session_defaults.rng_seed);

        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            database,
            engine: Arc::new(engine),
            session_defaults,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn engine(&self) -> Arc<Engine> {
        Arc::clone(&self.engine)
    }

    pub fn session_defaults(&self) -> SessionDefaults {
        self.session_defaults
    }
}
