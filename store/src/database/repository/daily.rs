use super::{author_summary, Repository};
use crate::database::models::{DailyPuzzle, DailyPuzzleEntry};
use crate::error::Result;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

#[derive(FromRow)]
struct DailyEntryRow {
    date: NaiveDate,
    puzzle_id: i64,
    title: String,
    size: i32,
    difficulty: Option<i32>,
    puzzle_created_at: DateTime<Utc>,
    author_id: Option<i64>,
    author_name: Option<String>,
    author_avatar_key: Option<String>,
}

impl From<DailyEntryRow> for DailyPuzzleEntry {
    fn from(row: DailyEntryRow) -> Self {
        Self {
            date: row.date,
            puzzle_id: row.puzzle_id,
            title: row.title,
            size: row.size,
            difficulty: row.difficulty,
            puzzle_created_at: row.puzzle_created_at,
            author: author_summary(row.author_id, row.author_name, row.author_avatar_key),
        }
    }
}

impl Repository {
    /// Feature a puzzle on a date; each date takes exactly one puzzle.
    pub async fn set_daily_puzzle(&self, puzzle_id: i64, date: NaiveDate) -> Result<DailyPuzzle> {
        let daily = sqlx::query_as::<_, DailyPuzzle>(
            r#"
            INSERT INTO daily_puzzles (puzzle_id, date)
            VALUES (?, ?)
            RETURNING *
            "#,
        )
        .bind(puzzle_id)
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Set daily puzzle for {}: {}", date, puzzle_id);
        Ok(daily)
    }

    /// The featured puzzle for a date, with its author
    pub async fn get_daily_puzzle(&self, date: NaiveDate) -> Result<Option<DailyPuzzleEntry>> {
        let row = sqlx::query_as::<_, DailyEntryRow>(
            r#"
            SELECT
                dp.date AS date,
                p.id AS puzzle_id,
                p.title AS title,
                p.size AS size,
                p.difficulty AS difficulty,
                p.created_at AS puzzle_created_at,
                p.author_id AS author_id,
                u.name AS author_name,
                u.avatar_key AS author_avatar_key
            FROM daily_puzzles dp
            JOIN puzzles p ON p.id = dp.puzzle_id
            LEFT JOIN users u ON u.id = p.author_id
            WHERE dp.date = ?
            "#,
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(DailyPuzzleEntry::from))
    }

    /// Every date a puzzle was featured, newest first
    pub async fn list_daily_for_puzzle(&self, puzzle_id: i64) -> Result<Vec<DailyPuzzle>> {
        let rows = sqlx::query_as::<_, DailyPuzzle>(
            "SELECT * FROM daily_puzzles WHERE puzzle_id = ? ORDER BY date DESC",
        )
        .bind(puzzle_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Clear a date's slot; false when it was empty.
    pub async fn remove_daily_puzzle(&self, date: NaiveDate) -> Result<bool> {
        let rows = sqlx::query("DELETE FROM daily_puzzles WHERE date = ?")
            .bind(date)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::debug!("Removed daily puzzle for {} (removed: {})", date, rows);
        Ok(rows > 0)
    }

    /// Most recent puzzle by `author_id` that has never been featured
    pub async fn pick_unused_puzzle(&self, author_id: i64) -> Result<Option<i64>> {
        let id: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT p.id
            FROM puzzles p
            WHERE p.author_id = ?
              AND NOT EXISTS (SELECT 1 FROM daily_puzzles dp WHERE dp.puzzle_id = p.id)
            ORDER BY p.id DESC
            LIMIT 1
            "#,
        )
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(id)
    }
}
