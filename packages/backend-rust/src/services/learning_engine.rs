use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use lexis_algo::{advance, MasteryRecord};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::services::progress_store::{LearnerStats, ProgressStore, Scope, StoreError};
use crate::services::session_composer::{compose_session, SessionItem, SessionRequest};

#[derive(Debug, Error)]
pub enum LearningError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Wires the progress store to the scheduler and the session composer.
pub struct LearningEngine<S> {
    store: S,
    rng_seed: Option<u64>,
    sessions: AtomicU64,
}

impl<S: ProgressStore> LearningEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            rng_seed: None,
            sessions: AtomicU64::new(0),
        }
    }

    /// Derive each session's rng from `seed` instead of OS entropy.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.rng_seed = seed;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn generate_session(&self, request: SessionRequest) -> Result<Vec<SessionItem>, LearningError> {
        let mut rng = self.session_rng();
        self.generate_session_with(request, Utc::now(), &mut rng).await
    }

    pub async fn generate_session_with<R>(
        &self,
        request: SessionRequest,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Vec<SessionItem>, LearningError>
    where
        R: Rng + Send + ?Sized,
    {
        let items = compose_session(&self.store, request, now, rng).await?;
        tracing::debug!(
            learner_id = request.learner_id,
            requested = request.size,
            returned = items.len(),
            slots = request.policy.slots.as_str(),
            order = request.policy.order.as_str(),
            "session generated"
        );
        Ok(items)
    }

    pub async fn submit_result(
        &self,
        learner_id: i64,
        word_id: i64,
        success: bool,
    ) -> Result<MasteryRecord, LearningError> {
        self.submit_result_at(learner_id, word_id, success, Utc::now()).await
    }

    /// Apply one pass/fail result. A missing record starts from the zero
    /// state; on store failure the previous record is left untouched.
    pub async fn submit_result_at(
        &self,
        learner_id: i64,
        word_id: i64,
        success: bool,
        now: DateTime<Utc>,
    ) -> Result<MasteryRecord, LearningError> {
        let mut previous = None;
        let next = self
            .store
            .modify(learner_id, word_id, |current| {
                let current = current.unwrap_or_else(|| MasteryRecord::new(learner_id, word_id));
                let next = advance(&current, success, now);
                previous = Some((current.stage, current.interval));
                next
            })
            .await?;

        if let Some((stage, interval)) = previous {
            tracing::debug!(
                learner_id,
                word_id,
                success,
                from_stage = stage,
                to_stage = next.stage,
                from_interval = interval,
                to_interval = next.interval,
                "mastery record advanced"
            );
        }

        Ok(next)
    }

    pub async fn learner_stats(
        &self,
        learner_id: i64,
        dictionary_id: Option<i64>,
    ) -> Result<LearnerStats, LearningError> {
        Ok(self
            .store
            .learner_stats(Scope::new(learner_id, dictionary_id))
            .await?)
    }

    fn session_rng(&self) -> StdRng {
        match self.rng_seed {
            Some(seed) => {
                let n = self.sessions.fetch_add(1, Ordering::Relaxed);
                StdRng::seed_from_u64(seed.wrapping_add(n))
            }
            None => StdRng::from_rng(&mut rand::rng()),
        }
    }
}
