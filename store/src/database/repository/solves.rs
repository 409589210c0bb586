use super::{fetch_limit, id_bound, Repository};
use crate::database::models::{NewSolve, Page, PageRequest, PuzzleSolve};
use crate::error::Result;
use sqlx::types::Json;

impl Repository {
    /// Record an attempt. Any number of attempts per (user, puzzle) is allowed.
    pub async fn record_solve(&self, req: NewSolve) -> Result<PuzzleSolve> {
        let solve = sqlx::query_as::<_, PuzzleSolve>(
            r#"
            INSERT INTO puzzle_solves (user_id, puzzle_id, movements, duration_ms, solution)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(req.user_id)
        .bind(req.puzzle_id)
        .bind(req.movements)
        .bind(req.duration_ms)
        .bind(req.solution.as_ref().map(Json))
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(
            "Recorded solve {} for user {} on puzzle {} ({} moves, {} ms)",
            solve.id,
            solve.user_id,
            solve.puzzle_id,
            solve.movements,
            solve.duration_ms
        );
        Ok(solve)
    }

    /// A user's solve history, most recent first
    pub async fn list_user_solves(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> Result<Page<PuzzleSolve>> {
        let limit = page.effective_limit();
        let rows = sqlx::query_as::<_, PuzzleSolve>(
            r#"
            SELECT * FROM puzzle_solves
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

        Ok(Page::from_overfetch(rows, limit, |s| s.id))
    }

    /// A puzzle's solve history, most recent first
    pub async fn list_puzzle_solves(
        &self,
        puzzle_id: i64,
        page: PageRequest,
    ) -> Result<Page<PuzzleSolve>> {
        let limit = page.effective_limit();
        let rows = sqlx::query_as::<_, PuzzleSolve>(
            r#"
            SELECT * FROM puzzle_solves
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

        Ok(Page::from_overfetch(rows, limit, |s| s.id))
    }

    /// Attempts by one user on one puzzle, most recent first
    pub async fn list_solves_for(
        &self,
        user_id: i64,
        puzzle_id: i64,
        page: PageRequest,
    ) -> Result<Page<PuzzleSolve>> {
        let limit = page.effective_limit();
        let rows = sqlx::query_as::<_, PuzzleSolve>(
            r#"
            SELECT * FROM puzzle_solves
            WHERE user_id = ? AND puzzle_id = ? AND id < ?
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(puzzle_id)
        .bind(id_bound(&page))
        .bind(fetch_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::from_overfetch(rows, limit, |s| s.id))
    }

    /// Fewest moves, then fastest, then earliest
    pub async fn best_solve(&self, user_id: i64, puzzle_id: i64) -> Result<Option<PuzzleSolve>> {
        let best = sqlx::query_as::<_, PuzzleSolve>(
            r#"
            SELECT * FROM puzzle_solves
            WHERE user_id = ? AND puzzle_id = ?
            ORDER BY movements ASC, duration_ms ASC, id ASC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(puzzle_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::database::Document;
    use crate::error::StoreError;
    use serde_json::json;

    fn attempt(user_id: i64, puzzle_id: i64, movements: i64, duration_ms: i64) -> NewSolve {
        NewSolve {
            user_id,
            puzzle_id,
            movements,
            duration_ms,
            solution: None,
        }
    }

    #[tokio::test]
    async fn test_repeated_attempts_allowed() {
        let repo = create_test_repo().await;
        let user = seed_user(&repo, "Persistent").await;
        let puzzle = seed_puzzle(&repo, None, "Hard one").await;

        repo.record_solve(attempt(user.id, puzzle.id, 5, 3_000))
            .await
            .unwrap();
        repo.record_solve(attempt(user.id, puzzle.id, 12, 9_000))
            .await
            .unwrap();

        let history = repo
            .list_solves_for(user.id, puzzle.id, PageRequest::default())
            .await
            .unwrap();
        let moves: Vec<i64> = history.items.iter().map(|s| s.movements).collect();
        assert_eq!(moves, vec![12, 5]);
    }

    #[tokio::test]
    async fn test_negative_metrics_rejected() {
        let repo = create_test_repo().await;
        let user = seed_user(&repo, "Cheater").await;
        let puzzle = seed_puzzle(&repo, None, "Target").await;

        let err = repo
            .record_solve(attempt(user.id, puzzle.id, -1, 100))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::CheckViolation(_)), "{err:?}");

        let err = repo
            .record_solve(attempt(user.id, puzzle.id, 3, -100))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::CheckViolation(_)), "{err:?}");

        // Zero is a valid value for both
        repo.record_solve(attempt(user.id, puzzle.id, 0, 0))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_solution_payload_round_trips() {
        let repo = create_test_repo().await;
        let user = seed_user(&repo, "Solver").await;
        let puzzle = seed_puzzle(&repo, None, "Path").await;

        let path = Document::try_from(json!({"moves": ["U", "L", "D"], "final": [1, 2, 3, 0]}))
            .unwrap();
        let solve = repo
            .record_solve(NewSolve {
                solution: Some(path.clone()),
                ..attempt(user.id, puzzle.id, 3, 1_200)
            })
            .await
            .unwrap();

        assert_eq!(solve.solution.map(|s| s.0), Some(path));
    }

    #[tokio::test]
    async fn test_histories_by_user_and_puzzle() {
        let repo = create_test_repo().await;
        let u1 = seed_user(&repo, "U1").await;
        let u2 = seed_user(&repo, "U2").await;
        let p1 = seed_puzzle(&repo, None, "P1").await;
        let p2 = seed_puzzle(&repo, None, "P2").await;

        let s1 = repo.record_solve(attempt(u1.id, p1.id, 4, 10)).await.unwrap();
        let s2 = repo.record_solve(attempt(u2.id, p1.id, 6, 10)).await.unwrap();
        let s3 = repo.record_solve(attempt(u1.id, p2.id, 8, 10)).await.unwrap();

        let by_user = repo
            .list_user_solves(u1.id, PageRequest::default())
            .await
            .unwrap();
        let ids: Vec<i64> = by_user.items.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![s3.id, s1.id]);

        let by_puzzle = repo
            .list_puzzle_solves(p1.id, PageRequest::first(1))
            .await
            .unwrap();
        assert_eq!(by_puzzle.items[0].id, s2.id);
        assert_eq!(by_puzzle.next_cursor, Some(s2.id));
    }

    #[tokio::test]
    async fn test_best_solve() {
        let repo = create_test_repo().await;
        let user = seed_user(&repo, "Racer").await;
        let puzzle = seed_puzzle(&repo, None, "Track").await;

        assert!(repo.best_solve(user.id, puzzle.id).await.unwrap().is_none());

        repo.record_solve(attempt(user.id, puzzle.id, 9, 1_000))
            .await
            .unwrap();
        let best = repo
            .record_solve(attempt(user.id, puzzle.id, 7, 4_000))
            .await
            .unwrap();
        repo.record_solve(attempt(user.id, puzzle.id, 7, 5_000))
            .await
            .unwrap();

        let found = repo.best_solve(user.id, puzzle.id).await.unwrap().unwrap();
        assert_eq!(found.id, best.id);
    }

    #[tokio::test]
    async fn test_solves_removed_with_user_or_puzzle() {
        let repo = create_test_repo().await;
        let u1 = seed_user(&repo, "U1").await;
        let u2 = seed_user(&repo, "U2").await;
        let puzzle = seed_puzzle(&repo, None, "Shared").await;

        repo.record_solve(attempt(u1.id, puzzle.id, 1, 1)).await.unwrap();
        repo.record_solve(attempt(u2.id, puzzle.id, 1, 1)).await.unwrap();

        repo.delete_user(u1.id).await.unwrap();
        let left = repo
            .list_puzzle_solves(puzzle.id, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(left.items.len(), 1);
        assert_eq!(left.items[0].user_id, u2.id);

        repo.delete_puzzle(puzzle.id).await.unwrap();
        let gone = repo
            .list_user_solves(u2.id, PageRequest::default())
            .await
            .unwrap();
        assert!(gone.items.is_empty());
    }
}
