use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{format_timestamp, Article, GeneratedArticle};

use super::schema::SCHEMA;

const SELECT_ARTICLE: &str = "SELECT id, title, content, created_at FROM articles";

/// Handle to the article table. Cloning shares the same background connection.
#[derive(Clone)]
pub struct ArticleStore {
    conn: Connection,
}

impl ArticleStore {
    pub async fn open(db_path: &str) -> Result<Self> {
        if let Some(parent) = std::path::Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path).await?;
        let store = Self { conn };
        store.init().await?;
        Ok(store)
    }

    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        let store = Self { conn };
        store.init().await?;
        Ok(store)
    }

    /// Creates the table if it does not exist yet. Safe to call repeatedly.
    pub async fn init(&self) -> Result<()> {
        self.conn
            .call(|conn| {
                conn.execute_batch(SCHEMA)?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<i64> {
        let count = self
            .conn
            .call(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
                Ok(count)
            })
            .await?;
        Ok(count)
    }

    pub async fn insert(&self, article: GeneratedArticle) -> Result<Article> {
        let created_at = Utc::now().trunc_subsecs(3);
        let stamp = format_timestamp(&created_at);

        let stored = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO articles (title, content, created_at) VALUES (?1, ?2, ?3)",
                    params![article.title, article.content, stamp],
                )?;
                Ok(Article {
                    id: conn.last_insert_rowid(),
                    title: article.title,
                    content: article.content,
                    created_at,
                })
            })
            .await?;

        tracing::debug!("Stored article {}: {}", stored.id, stored.title);
        Ok(stored)
    }

    /// All articles, newest first.
    pub async fn list_all(&self) -> Result<Vec<Article>> {
        let articles = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(&format!(
                    "{SELECT_ARTICLE} ORDER BY created_at DESC, id DESC"
                ))?;
                let articles = stmt
                    .query_map([], article_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(articles)
            })
            .await?;
        Ok(articles)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Article>> {
        let article = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!("{SELECT_ARTICLE} WHERE id = ?1"))?;
                let article = stmt
                    .query_row(params![id], article_from_row)
                    .optional()?;
                Ok(article)
            })
            .await?;
        Ok(article)
    }

    #[cfg(test)]
    async fn insert_at(&self, title: &str, created_at: DateTime<Utc>) -> Result<i64> {
        let title = title.to_string();
        let stamp = format_timestamp(&created_at);
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO articles (title, content, created_at) VALUES (?1, 'body', ?2)",
                    params![title, stamp],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }
}

/// Fixed-width UTC timestamps so that text ordering matches time ordering.
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // SQLite datetime('now') format, for rows written by hand
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn article_from_row(row: &Row) -> rusqlite::Result<Article> {
    let raw: String = row.get(3)?;
    let created_at = parse_datetime(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            Type::Text,
            format!("invalid created_at timestamp: {raw}").into(),
        )
    })?;

    Ok(Article {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn insert_assigns_id_and_timestamp() {
        let store = ArticleStore::open_in_memory().await.unwrap();
        let before = Utc::now() - Duration::seconds(1);

        let article = store
            .insert(GeneratedArticle::new("Hello", "World\n\nAgain"))
            .await
            .unwrap();

        assert!(article.id > 0);
        assert_eq!(article.title, "Hello");
        assert_eq!(article.content, "World\n\nAgain");
        assert!(article.created_at >= before);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn get_by_id_round_trips_and_misses() {
        let store = ArticleStore::open_in_memory().await.unwrap();
        let article = store
            .insert(GeneratedArticle::new("Title", "Body"))
            .await
            .unwrap();

        let fetched = store.get_by_id(article.id).await.unwrap();
        assert_eq!(fetched, Some(article.clone()));
        assert_eq!(store.get_by_id(article.id + 100).await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = ArticleStore::open_in_memory().await.unwrap();
        let t = Utc::now();
        store.insert_at("A", t).await.unwrap();
        store.insert_at("B", t + Duration::seconds(1)).await.unwrap();

        let titles: Vec<_> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, vec!["B", "A"]);
    }

    #[tokio::test]
    async fn same_timestamp_falls_back_to_id_order() {
        let store = ArticleStore::open_in_memory().await.unwrap();
        let t = Utc::now();
        store.insert_at("first", t).await.unwrap();
        store.insert_at("second", t).await.unwrap();

        let list = store.list_all().await.unwrap();
        assert_eq!(list[0].title, "second");
        assert_eq!(list[1].title, "first");
    }

    #[tokio::test]
    async fn list_of_empty_store_is_empty() {
        let store = ArticleStore::open_in_memory().await.unwrap();
        assert!(store.list_all().await.unwrap().is_empty());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn init_is_idempotent_and_data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.db");
        let path = path.to_string_lossy().to_string();

        let store = ArticleStore::open(&path).await.unwrap();
        store
            .insert(GeneratedArticle::new("Persisted", "Body"))
            .await
            .unwrap();
        store.init().await.unwrap();
        drop(store);

        let reopened = ArticleStore::open(&path).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
        assert_eq!(reopened.list_all().await.unwrap()[0].title, "Persisted");
    }

    #[test]
    fn parses_both_timestamp_formats() {
        assert!(parse_datetime("2026-01-11T12:34:56.000Z").is_some());
        assert!(parse_datetime("2026-01-11 12:34:56").is_some());
        assert!(parse_datetime("yesterday").is_none());
    }
}
