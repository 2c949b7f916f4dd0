use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// Reference data owned by the dictionary subsystem. Read-only to scheduling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub id: i64,
    pub dictionary_id: i64,
    pub text: String,
    pub definition: String,
    pub difficulty: i64,
    pub pronunciation_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dictionary {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewWord {
    pub text: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: i64,
    #[serde(default)]
    pub pronunciation_url: String,
}

fn default_difficulty() -> i64 {
    1
}

impl NewWord {
    pub fn new(text: impl Into<String>, definition: impl Into<String>, difficulty: i64) -> Self {
        Self {
            text: text.into(),
            definition: definition.into(),
            difficulty,
            pronunciation_url: String::new(),
        }
    }
}

pub(crate) fn map_word(row: &SqliteRow) -> Result<Word, sqlx::Error> {
    Ok(Word {
        id: row.try_get("id")?,
        dictionary_id: row.try_get("dictionary_id")?,
        text: row.try_get("text")?,
        definition: row.try_get("definition")?,
        difficulty: row.try_get("difficulty")?,
        pronunciation_url: row.try_get("pronunciation_url")?,
    })
}

pub async fn insert_dictionary(
    pool: &SqlitePool,
    name: &str,
    description: &str,
    is_active: bool,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"INSERT INTO "dictionaries" ("name", "description", "is_active") VALUES (?, ?, ?)"#,
    )
    .bind(name)
    .bind(description)
    .bind(is_active)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn find_dictionary_by_name(
    pool: &SqlitePool,
    name: &str,
) -> Result<Option<Dictionary>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT "id", "name", "description", "is_active" FROM "dictionaries" WHERE "name" = ?"#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    row.map(|r| {
        Ok(Dictionary {
            id: r.try_get("id")?,
            name: r.try_get("name")?,
            description: r.try_get("description")?,
            is_active: r.try_get("is_active")?,
        })
    })
    .transpose()
}

/// Insert all words in one transaction. Returns the new ids in input order.
pub async fn insert_words(
    pool: &SqlitePool,
    dictionary_id: i64,
    words: &[NewWord],
) -> Result<Vec<i64>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut ids = Vec::with_capacity(words.len());

    for word in words {
        let result = sqlx::query(
            r#"
            INSERT INTO "words" ("dictionary_id", "text", "definition", "difficulty", "pronunciation_url")
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(dictionary_id)
        .bind(&word.text)
        .bind(&word.definition)
        .bind(word.difficulty)
        .bind(&word.pronunciation_url)
        .execute(&mut *tx)
        .await?;
        ids.push(result.last_insert_rowid());
    }

    tx.commit().await?;
    Ok(ids)
}

pub async fn count_words(pool: &SqlitePool, dictionary_id: Option<i64>) -> Result<i64, sqlx::Error> {
    match dictionary_id {
        Some(id) => {
            sqlx::query_scalar(r#"SELECT COUNT(*) FROM "words" WHERE "dictionary_id" = ?"#)
                .bind(id)
                .fetch_one(pool)
                .await
        }
        None => {
            sqlx::query_scalar(r#"SELECT COUNT(*) FROM "words""#)
                .fetch_one(pool)
                .await
        }
    }
}
