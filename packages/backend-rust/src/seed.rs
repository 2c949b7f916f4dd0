use sqlx::SqlitePool;

use crate::db::operations::content::{find_dictionary_by_name, insert_dictionary, insert_words, NewWord};

pub const DEMO_DICTIONARY: &str = "Starter Vocabulary";

const DEMO_WORDS: &[(&str, &str, i64)] = &[
    ("exercise", "physical activity done to stay healthy", 1),
    ("breakfast", "the first meal of the day", 1),
    ("usually", "in the way that most often happens", 1),
    ("island", "land surrounded by water", 2),
    ("season", "one of the four periods of the year", 1),
    ("picnic", "a meal eaten outdoors", 1),
    ("vacation", "time spent away from school or work", 1),
    ("lovely", "very pleasant or attractive", 1),
    ("contest", "a competition to decide a winner", 2),
    ("special", "different from what is usual", 1),
    ("diary", "a book for writing daily events", 2),
    ("twelfth", "coming after eleven others", 2),
    ("kitten", "a young cat", 1),
    ("noise", "a loud or unpleasant sound", 1),
    ("calendar", "a chart of the days and months of a year", 2),
    ("delicious", "having a very pleasant taste", 2),
    ("library", "a room or building holding books to borrow", 1),
    ("journey", "an act of travelling from one place to another", 2),
    ("rsvp", "please reply to this invitation", 3),
    ("anniversary", "the yearly return of a special date", 3),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    AlreadyPresent { dictionary_id: i64 },
    Seeded { dictionary_id: i64, words: usize },
}

/// Create the starter dictionary unless it already exists.
pub async fn seed_demo_dictionary(pool: &SqlitePool) -> Result<SeedOutcome, sqlx::Error> {
    if let Some(existing) = find_dictionary_by_name(pool, DEMO_DICTIONARY).await? {
        tracing::debug!(dictionary_id = existing.id, "demo dictionary already exists");
        return Ok(SeedOutcome::AlreadyPresent {
            dictionary_id: existing.id,
        });
    }

    let dictionary_id = insert_dictionary(
        pool,
        DEMO_DICTIONARY,
        "Everyday words for a first practice session",
        true,
    )
    .await?;

    let words: Vec<NewWord> = DEMO_WORDS
        .iter()
        .map(|(text, definition, difficulty)| NewWord::new(*text, *definition, *difficulty))
        .collect();
    let ids = insert_words(pool, dictionary_id, &words).await?;

    tracing::info!(dictionary_id, words = ids.len(), "seeded demo dictionary");
    Ok(SeedOutcome::Seeded {
        dictionary_id,
        words: ids.len(),
    })
}
