use chrono::{DateTime, Utc};
use lexis_algo::{PoolKind, ProficiencyTag, SessionBuilder, SessionPolicy};
use rand::Rng;
use serde::Serialize;

use crate::db::operations::content::Word;
use crate::services::progress_store::{Candidate, ProgressStore, Scope, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRequest {
    pub learner_id: i64,
    pub dictionary_id: Option<i64>,
    pub size: usize,
    pub policy: SessionPolicy,
}

impl SessionRequest {
    pub fn new(learner_id: i64, dictionary_id: Option<i64>, size: usize, policy: SessionPolicy) -> Self {
        Self {
            learner_id,
            dictionary_id,
            size,
            policy,
        }
    }

    fn scope(&self) -> Scope {
        Scope::new(self.learner_id, self.dictionary_id)
    }
}

/// A word as presented in one session. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionItem {
    #[serde(flatten)]
    pub word: Word,
    pub proficiency: ProficiencyTag,
    pub pool: PoolKind,
}

/// Assemble one session by walking the policy's pools in priority order.
///
/// Each pool is asked for `quota + already_placed` candidates so words that
/// an earlier pool already placed can be skipped without starving the slot.
/// Short pools produce a short session rather than an error.
pub async fn compose_session<S, R>(
    store: &S,
    request: SessionRequest,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<Vec<SessionItem>, StoreError>
where
    S: ProgressStore,
    R: Rng + Send + ?Sized,
{
    let scope = request.scope();
    let slots = request.policy.slots;
    let mut builder: SessionBuilder<Candidate> = SessionBuilder::new(request.size);

    for &pool in slots.pools() {
        if builder.is_full() {
            break;
        }

        let quota = slots.quota(pool, request.size, builder.remaining());
        if quota == 0 {
            continue;
        }

        let fetch = quota + builder.len();
        let candidates = match pool {
            PoolKind::Review => store.due_for_review(scope, now, fetch).await?,
            PoolKind::Weak => store.weak(scope, fetch, rng).await?,
            PoolKind::New => store.never_attempted(scope, fetch, rng).await?,
            PoolKind::Ahead => store.scheduled_ahead(scope, now, fetch).await?,
        };

        let offered = candidates.len();
        let placed = builder.fill(pool, quota, candidates.into_iter().map(|c| (c.word.id, c)));
        tracing::debug!(
            learner_id = request.learner_id,
            pool = pool.as_str(),
            quota,
            offered,
            placed,
            "session pool consulted"
        );
    }

    let items = builder
        .finish(request.policy.order, rng)
        .into_iter()
        .map(|placed| SessionItem {
            proficiency: placed.item.proficiency(),
            word: placed.item.word,
            pool: placed.pool,
        })
        .collect();

    Ok(items)
}
