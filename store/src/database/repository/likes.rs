use super::{fetch_limit, id_bound, Repository};
use crate::database::models::{Page, PageRequest, PuzzleLike};
use crate::error::Result;

impl Repository {
    /// Like a puzzle; a second like for the same pair fails as a duplicate.
    pub async fn like_puzzle(&self, user_id: i64, puzzle_id: i64) -> Result<PuzzleLike> {
        let like = sqlx::query_as::<_, PuzzleLike>(
            r#"
            INSERT INTO puzzle_likes (user_id, puzzle_id)
            VALUES (?, ?)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(puzzle_id)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("User {} liked puzzle {}", user_id, puzzle_id);
        Ok(like)
    }

    /// Remove a like; false when there was none.
    pub async fn unlike_puzzle(&self, user_id: i64, puzzle_id: i64) -> Result<bool> {
        let rows = sqlx::query("DELETE FROM puzzle_likes WHERE user_id = ? AND puzzle_id = ?")
            .bind(user_id)
            .bind(puzzle_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::debug!("User {} unliked puzzle {} (removed: {})", user_id, puzzle_id, rows);
        Ok(rows > 0)
    }

    pub async fn count_puzzle_likes(&self, puzzle_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM puzzle_likes WHERE puzzle_id = ?")
            .bind(puzzle_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Likes received by a puzzle, most recent first
    pub async fn list_puzzle_likes(
        &self,
        puzzle_id: i64,
        page: PageRequest,
    ) -> Result<Page<PuzzleLike>> {
        let limit = page.effective_limit();
        let rows = sqlx::query_as::<_, PuzzleLike>(
            r#"
            SELECT * FROM puzzle_likes
            WHERE puzzle_id = ? AND id < ?
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(puzzle_id)
        .bind(id_bound(&page))
        .bind(fetch_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::from_overfetch(rows, limit, |l| l.id))
    }

    /// Puzzles a user has liked, most recent like first
    pub async fn list_liked_puzzles(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> Result<Page<PuzzleLike>> {
        let limit = page.effective_limit();
        let rows = sqlx::query_as::<_, PuzzleLike>(
            r#"
            SELECT * FROM puzzle_likes
            WHERE user_id = ? AND id < ?
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(id_bound(&page))
        .bind(fetch_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::from_overfetch(rows, limit, |l| l.id))
    }
}
