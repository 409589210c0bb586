//! Repository layer for database operations
//!
//! CRUD and listing operations for the six tables, split by entity.
//! Each write is a single statement, so it is atomic on its own; integrity
//! rules are left to the schema and surface as classified `StoreError`s.

mod daily;
mod follows;
mod likes;
mod puzzles;
mod solves;
mod users;

pub use puzzles::BrowseCursor;

use super::models::{AuthorSummary, PageRequest};
use crate::config::DEFAULT_SYSTEM_AUTHOR_ID;
use sqlx::SqlitePool;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
    system_author_id: i64,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            system_author_id: DEFAULT_SYSTEM_AUTHOR_ID,
        }
    }

    /// Account whose puzzles count as algorithm-generated
    pub fn with_system_author_id(mut self, system_author_id: i64) -> Self {
        self.system_author_id = system_author_id;
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn system_author_id(&self) -> i64 {
        self.system_author_id
    }

    /// Row counts per table, used for startup diagnostics
    pub async fn table_counts(&self) -> crate::error::Result<Vec<(&'static str, i64)>> {
        const TABLES: [&str; 6] = [
            "users",
            "puzzles",
            "follows",
            "puzzle_likes",
            "puzzle_solves",
            "daily_puzzles",
        ];

        let mut counts = Vec::with_capacity(TABLES.len());
        for table in TABLES {
            let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(&self.pool)
                .await?;
            counts.push((table, count));
        }
        Ok(counts)
    }
}

/// Upper id bound for a keyset page: everything when there is no cursor.
fn id_bound(page: &PageRequest) -> i64 {
    page.cursor.unwrap_or(i64::MAX)
}

/// Rows to fetch so the caller can tell whether another page exists.
fn fetch_limit(limit: u32) -> i64 {
    i64::from(limit) + 1
}

/// Author block from a LEFT JOIN on `users`; absent once the account is gone.
fn author_summary(
    author_id: Option<i64>,
    name: Option<String>,
    avatar_key: Option<String>,
) -> Option<AuthorSummary> {
    match (author_id, name) {
        (Some(id), Some(name)) => Some(AuthorSummary {
            id,
            name,
            avatar_key,
        }),
        _ => None,
    }
}
