// SQLite-backed board store.
//
// Tables:
// - posts: top-level entries
// - comments: child rows of a post, oldest first when read
// - reactions: one row per (post, author), enforced by a UNIQUE constraint

use crate::core::board::{BoardError, BoardStore, CommentRecord, PostRecord, ReactionRecord};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

pub struct SqliteBoardStore {
    pool: Pool<Sqlite>,
}

impl SqliteBoardStore {
    /// Open (creating if needed) the database at `database_path` and migrate it.
    pub async fn new(database_path: &str) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .connect(&format!("sqlite://{}?mode=rwc", database_path))
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Run database migrations to create required tables.
    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                author TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id INTEGER NOT NULL REFERENCES posts (id),
                author TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id, created_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id INTEGER NOT NULL REFERENCES posts (id),
                author TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE (post_id, author)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn storage_error(e: sqlx::Error) -> BoardError {
    BoardError::StorageError(e.to_string())
}

/// Current time at the precision we store, so returned records match what
/// a later read gives back.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width UTC timestamps, so text order matches time order.
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &SqliteRow) -> Result<DateTime<Utc>, BoardError> {
    let raw: String = row.get("created_at");
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| BoardError::StorageError(format!("bad timestamp {:?}: {}", raw, e)))
}

fn row_to_post(row: &SqliteRow) -> Result<PostRecord, BoardError> {
    Ok(PostRecord {
        id: row.get::<i64, _>("id") as u64,
        author: row.get("author"),
        body: row.get("body"),
        created_at: parse_timestamp(row)?,
    })
}

fn row_to_comment(row: &SqliteRow) -> Result<CommentRecord, BoardError> {
    Ok(CommentRecord {
        id: row.get::<i64, _>("id") as u64,
        post_id: row.get::<i64, _>("post_id") as u64,
        author: row.get("author"),
        body: row.get("body"),
        created_at: parse_timestamp(row)?,
    })
}

fn row_to_reaction(row: &SqliteRow) -> Result<ReactionRecord, BoardError> {
    Ok(ReactionRecord {
        id: row.get::<i64, _>("id") as u64,
        post_id: row.get::<i64, _>("post_id") as u64,
        author: row.get("author"),
        created_at: parse_timestamp(row)?,
    })
}

#[async_trait]
impl BoardStore for SqliteBoardStore {
    async fn insert_post(&self, author: &str, body: &str) -> Result<PostRecord, BoardError> {
        let created_at = now();
        let result = sqlx::query("INSERT INTO posts (author, body, created_at) VALUES (?, ?, ?)")
            .bind(author)
            .bind(body)
            .bind(format_timestamp(created_at))
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(PostRecord {
            id: result.last_insert_rowid() as u64,
            author: author.to_string(),
            body: body.to_string(),
            created_at,
        })
    }

    async fn insert_comment(
        &self,
        post_id: u64,
        author: &str,
        body: &str,
    ) -> Result<CommentRecord, BoardError> {
        let created_at = now();
        let result = sqlx::query(
            "INSERT INTO comments (post_id, author, body, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(post_id as i64)
        .bind(author)
        .bind(body)
        .bind(format_timestamp(created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                BoardError::NotFound(format!("post {}", post_id))
            }
            other => storage_error(other),
        })?;

        Ok(CommentRecord {
            id: result.last_insert_rowid() as u64,
            post_id,
            author: author.to_string(),
            body: body.to_string(),
            created_at,
        })
    }

    async fn list_posts(&self, limit: Option<usize>) -> Result<Vec<PostRecord>, BoardError> {
        // LIMIT -1 means no limit in SQLite
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let rows = sqlx::query(
            r#"
            SELECT id, author, body, created_at
            FROM posts
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.iter().map(row_to_post).collect()
    }

    async fn post_exists(&self, post_id: u64) -> Result<bool, BoardError> {
        let row = sqlx::query("SELECT id FROM posts WHERE id = ?")
            .bind(post_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(row.is_some())
    }

    async fn fetch_child_comments(&self, post_id: u64) -> Result<Vec<CommentRecord>, BoardError> {
        let rows = sqlx::query(
            r#"
            SELECT id, post_id, author, body, created_at
            FROM comments
            WHERE post_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(post_id as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.iter().map(row_to_comment).collect()
    }

    async fn fetch_child_reactions(
        &self,
        post_id: u64,
    ) -> Result<Vec<ReactionRecord>, BoardError> {
        let rows = sqlx::query(
            r#"
            SELECT id, post_id, author, created_at
            FROM reactions
            WHERE post_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(post_id as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.iter().map(row_to_reaction).collect()
    }

    async fn find_reaction(
        &self,
        post_id: u64,
        author: &str,
    ) -> Result<Option<ReactionRecord>, BoardError> {
        let row = sqlx::query(
            "SELECT id, post_id, author, created_at FROM reactions WHERE post_id = ? AND author = ?",
        )
        .bind(post_id as i64)
        .bind(author)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        row.as_ref().map(row_to_reaction).transpose()
    }

    async fn insert_reaction(
        &self,
        post_id: u64,
        author: &str,
    ) -> Result<ReactionRecord, BoardError> {
        let created_at = now();
        let result =
            sqlx::query("INSERT INTO reactions (post_id, author, created_at) VALUES (?, ?, ?)")
                .bind(post_id as i64)
                .bind(author)
                .bind(format_timestamp(created_at))
                .execute(&self.pool)
                .await
                .map_err(|e| match e {
                    sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                        BoardError::Conflict(format!(
                            "{} already reacted to post {}",
                            author, post_id
                        ))
                    }
                    sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                        BoardError::NotFound(format!("post {}", post_id))
                    }
                    other => storage_error(other),
                })?;

        Ok(ReactionRecord {
            id: result.last_insert_rowid() as u64,
            post_id,
            author: author.to_string(),
            created_at,
        })
    }

    async fn delete_reaction(&self, post_id: u64, author: &str) -> Result<(), BoardError> {
        let result = sqlx::query("DELETE FROM reactions WHERE post_id = ? AND author = ?")
            .bind(post_id as i64)
            .bind(author)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(BoardError::NotFound(format!(
                "reaction by {} on post {}",
                author, post_id
            )));
        }
        Ok(())
    }

    async fn remove_post(&self, post_id: u64) -> Result<bool, BoardError> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        sqlx::query("DELETE FROM comments WHERE post_id = ?")
            .bind(post_id as i64)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        sqlx::query("DELETE FROM reactions WHERE post_id = ?")
            .bind(post_id as i64)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(post_id as i64)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        Ok(result.rows_affected() > 0)
    }
}
