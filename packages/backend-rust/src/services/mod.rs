pub mod learning_engine;
pub mod memory_store;
pub mod progress_store;
pub mod session_composer;

pub use learning_engine::{LearningEngine, LearningError};
pub use memory_store::MemoryProgressStore;
pub use progress_store::{Candidate, LearnerStats, ProgressStore, Scope, StoreError};
pub use session_composer::{compose_session, SessionItem, SessionRequest};
