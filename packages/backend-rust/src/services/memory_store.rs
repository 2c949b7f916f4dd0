use std::collections::HashMap;

use chrono::{DateTime, Utc};
use lexis_algo::proficiency::{is_mastered, is_weak};
use lexis_algo::MasteryRecord;
use parking_lot::RwLock;
use rand::seq::IndexedRandom;
use rand::Rng;

use crate::db::operations::content::Word;
use crate::services::progress_store::{Candidate, LearnerStats, ProgressStore, Scope, StoreError};

/// In-process store keyed by (learner, word). Locks are never held across an
/// await point.
#[derive(Default)]
pub struct MemoryProgressStore {
    words: RwLock<Vec<Word>>,
    records: RwLock<HashMap<(i64, i64), MasteryRecord>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_words(words: impl IntoIterator<Item = Word>) -> Self {
        let store = Self::new();
        store.words.write().extend(words);
        store
    }

    pub fn insert_record(&self, record: MasteryRecord) {
        self.records
            .write()
            .insert((record.learner_id, record.word_id), record);
    }

    pub fn record_count(&self) -> usize {
        self.records.read().len()
    }

    /// Words in scope paired with the learner's records, in catalog order.
    fn scoped(&self, scope: Scope) -> Vec<Candidate> {
        let words = self.words.read();
        let records = self.records.read();
        words
            .iter()
            .filter(|word| scope.includes(word))
            .map(|word| Candidate {
                word: word.clone(),
                record: records.get(&(scope.learner_id, word.id)).cloned(),
            })
            .collect()
    }

    fn by_due<P>(&self, scope: Scope, limit: usize, keep: P) -> Vec<Candidate>
    where
        P: Fn(&MasteryRecord) -> bool,
    {
        let mut pool: Vec<Candidate> = self
            .scoped(scope)
            .into_iter()
            .filter(|c| c.record.as_ref().is_some_and(&keep))
            .collect();
        // None sorts first, matching NULLS FIRST in SQLite
        pool.sort_by_key(|c| (c.record.as_ref().and_then(|r| r.next_review_at), c.word.id));
        pool.truncate(limit);
        pool
    }

    fn sample<R, P>(&self, scope: Scope, limit: usize, rng: &mut R, keep: P) -> Vec<Candidate>
    where
        R: Rng + ?Sized,
        P: Fn(&Candidate) -> bool,
    {
        let pool: Vec<Candidate> = self.scoped(scope).into_iter().filter(keep).collect();
        pool.choose_multiple(rng, limit).cloned().collect()
    }
}

impl ProgressStore for MemoryProgressStore {
    async fn get(&self, learner_id: i64, word_id: i64) -> Result<Option<MasteryRecord>, StoreError> {
        Ok(self.records.read().get(&(learner_id, word_id)).cloned())
    }

    async fn upsert(&self, record: &MasteryRecord) -> Result<(), StoreError> {
        self.insert_record(record.clone());
        Ok(())
    }

    async fn modify<F>(&self, learner_id: i64, word_id: i64, f: F) -> Result<MasteryRecord, StoreError>
    where
        F: FnOnce(Option<MasteryRecord>) -> MasteryRecord + Send,
    {
        let mut records = self.records.write();
        let next = f(records.get(&(learner_id, word_id)).cloned());
        records.insert((learner_id, word_id), next.clone());
        Ok(next)
    }

    async fn due_for_review(
        &self,
        scope: Scope,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Candidate>, StoreError> {
        Ok(self.by_due(scope, limit, |r| r.is_due(now)))
    }

    async fn weak<R>(&self, scope: Scope, limit: usize, rng: &mut R) -> Result<Vec<Candidate>, StoreError>
    where
        R: Rng + Send + ?Sized,
    {
        Ok(self.sample(scope, limit, rng, |c| {
            c.record
                .as_ref()
                .is_some_and(|r| is_weak(r.attempts, r.successes))
        }))
    }

    async fn never_attempted<R>(
        &self,
        scope: Scope,
        limit: usize,
        rng: &mut R,
    ) -> Result<Vec<Candidate>, StoreError>
    where
        R: Rng + Send + ?Sized,
    {
        Ok(self.sample(scope, limit, rng, |c| {
            c.record.as_ref().map_or(true, |r| r.attempts == 0)
        }))
    }

    async fn scheduled_ahead(
        &self,
        scope: Scope,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Candidate>, StoreError> {
        Ok(self.by_due(scope, limit, |r| !r.is_due(now)))
    }

    async fn learner_stats(&self, scope: Scope) -> Result<LearnerStats, StoreError> {
        let scoped = self.scoped(scope);
        let total = scoped.len() as i64;
        let (mastered, recorded) = scoped
            .iter()
            .filter_map(|c| c.record.as_ref())
            .fold((0i64, 0i64), |(mastered, recorded), r| {
                (
                    mastered + i64::from(is_mastered(r.attempts, r.successes)),
                    recorded + 1,
                )
            });

        Ok(LearnerStats::from_counts(
            scope.learner_id,
            total,
            mastered,
            recorded - mastered,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn word(id: i64, dictionary_id: i64) -> Word {
        Word {
            id,
            dictionary_id,
            text: format!("word-{id}"),
            definition: format!("definition {id}"),
            difficulty: 1,
            pronunciation_url: String::new(),
        }
    }

    fn record(word_id: i64, attempts: i64, successes: i64, due_in_hours: Option<i64>) -> MasteryRecord {
        MasteryRecord {
            attempts,
            successes,
            next_review_at: due_in_hours.map(|h| now() + Duration::hours(h)),
            ..MasteryRecord::new(1, word_id)
        }
    }

    #[tokio::test]
    async fn test_due_orders_unset_first_then_oldest() {
        let store = MemoryProgressStore::with_words((1..=4).map(|id| word(id, 1)));
        store.insert_record(record(1, 1, 1, Some(-1)));
        store.insert_record(record(2, 1, 1, None));
        store.insert_record(record(3, 1, 1, Some(-48)));
        store.insert_record(record(4, 1, 1, Some(5)));

        let due = store.due_for_review(Scope::new(1, None), now(), 10).await.unwrap();
        let ids: Vec<i64> = due.iter().map(|c| c.word.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);

        let ahead = store.scheduled_ahead(Scope::new(1, None), now(), 10).await.unwrap();
        assert_eq!(ahead.len(), 1);
        assert_eq!(ahead[0].word.id, 4);
    }

    #[tokio::test]
    async fn test_pools_respect_dictionary_and_learner() {
        let store = MemoryProgressStore::with_words([word(1, 1), word(2, 2), word(3, 2)]);
        store.insert_record(record(2, 5, 1, Some(10)));
        store.insert_record(MasteryRecord::new(2, 3));

        let mut rng = StdRng::seed_from_u64(1);
        let weak = store.weak(Scope::new(1, Some(2)), 10, &mut rng).await.unwrap();
        assert_eq!(weak.len(), 1);
        assert_eq!(weak[0].word.id, 2);

        let fresh = store
            .never_attempted(Scope::new(1, Some(2)), 10, &mut rng)
            .await
            .unwrap();
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].word.id, 3);

        let other_learner = store
            .never_attempted(Scope::new(2, None), 10, &mut rng)
            .await
            .unwrap();
        // learner 2 has a zero-attempt record for word 3, which still counts as new
        assert_eq!(other_learner.len(), 3);
    }

    #[tokio::test]
    async fn test_modify_creates_then_updates() {
        let store = MemoryProgressStore::with_words([word(1, 1)]);
        let first = store
            .modify(1, 1, |current| {
                assert!(current.is_none());
                record(1, 1, 0, None)
            })
            .await
            .unwrap();
        assert_eq!(first.attempts, 1);

        let second = store
            .modify(1, 1, |current| {
                let mut r = current.expect("record exists");
                r.attempts += 1;
                r
            })
            .await
            .unwrap();
        assert_eq!(second.attempts, 2);
        assert_eq!(store.get(1, 1).await.unwrap(), Some(second));
        assert_eq!(store.record_count(), 1);
    }

    #[tokio::test]
    async fn test_learner_stats_buckets() {
        let store = MemoryProgressStore::with_words((1..=5).map(|id| word(id, 1)));
        store.insert_record(record(1, 3, 3, None));
        store.insert_record(record(2, 10, 8, None));
        store.insert_record(record(3, 2, 2, None));

        let stats = store.learner_stats(Scope::new(1, None)).await.unwrap();
        assert_eq!(stats.total_words, 5);
        assert_eq!(stats.mastered_words, 2);
        assert_eq!(stats.learning_words, 1);
        assert_eq!(stats.new_words, 2);
    }
}
