use super::{fetch_limit, id_bound, Repository};
use crate::database::models::{Follow, Page, PageRequest};
use crate::error::Result;

impl Repository {
    /// Create a follow edge.
    ///
    /// Self-follows fail the check constraint; a repeated pair fails the
    /// uniqueness constraint.
    pub async fn follow_user(&self, follower_id: i64, followee_id: i64) -> Result<Follow> {
        let follow = sqlx::query_as::<_, Follow>(
            r#"
            INSERT INTO follows (follower_id, followee_id)
            VALUES (?, ?)
            RETURNING *
            "#,
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("User {} now follows {}", follower_id, followee_id);
        Ok(follow)
    }

    /// Remove a follow edge; false when there was none.
    pub async fn unfollow_user(&self, follower_id: i64, followee_id: i64) -> Result<bool> {
        let rows = sqlx::query("DELETE FROM follows WHERE follower_id = ? AND followee_id = ?")
            .bind(follower_id)
            .bind(followee_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::debug!("User {} unfollowed {} (removed: {})", follower_id, followee_id, rows);
        Ok(rows > 0)
    }

    /// Edges pointing at `user_id`, most recent first
    pub async fn list_followers(&self, user_id: i64, page: PageRequest) -> Result<Page<Follow>> {
        let limit = page.effective_limit();
        let rows = sqlx::query_as::<_, Follow>(
            r#"
            SELECT * FROM follows
            WHERE followee_id = ? AND id < ?
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(id_bound(&page))
        .bind(fetch_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::from_overfetch(rows, limit, |f| f.id))
    }

    /// Edges starting at `user_id`, most recent first
    pub async fn list_following(&self, user_id: i64, page: PageRequest) -> Result<Page<Follow>> {
        let limit = page.effective_limit();
        let rows = sqlx::query_as::<_, Follow>(
            r#"
            SELECT * FROM follows
            WHERE follower_id = ? AND id < ?
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(id_bound(&page))
        .bind(fetch_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::from_overfetch(rows, limit, |f| f.id))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::error::StoreError;

    #[tokio::test]
    async fn test_self_follow_rejected() {
        let repo = create_test_repo().await;
        let user = seed_user(&repo, "Narcissus").await;

        let err = repo.follow_user(user.id, user.id).await.unwrap_err();
        assert!(matches!(err, StoreError::CheckViolation(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_duplicate_follow_rejected() {
        let repo = create_test_repo().await;
        let a = seed_user(&repo, "A").await;
        let b = seed_user(&repo, "B").await;

        repo.follow_user(a.id, b.id).await.unwrap();
        let err = repo.follow_user(a.id, b.id).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)), "{err:?}");

        // The reverse direction is a different edge
        repo.follow_user(b.id, a.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_follow_unknown_user_rejected() {
        let repo = create_test_repo().await;
        let a = seed_user(&repo, "A").await;

        let err = repo.follow_user(a.id, 12_345).await.unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation(_)), "{err:?}");

        let err = repo.follow_user(12_345, a.id).await.unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_unfollow() {
        let repo = create_test_repo().await;
        let a = seed_user(&repo, "A").await;
        let b = seed_user(&repo, "B").await;

        repo.follow_user(a.id, b.id).await.unwrap();
        assert!(repo.unfollow_user(a.id, b.id).await.unwrap());
        assert!(!repo.unfollow_user(a.id, b.id).await.unwrap());

        // Can follow again after unfollowing
        repo.follow_user(a.id, b.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_followers_and_following() {
        let repo = create_test_repo().await;
        let star = seed_user(&repo, "Star").await;
        let f1 = seed_user(&repo, "F1").await;
        let f2 = seed_user(&repo, "F2").await;
        let f3 = seed_user(&repo, "F3").await;

        for fan in [&f1, &f2, &f3] {
            repo.follow_user(fan.id, star.id).await.unwrap();
        }
        repo.follow_user(star.id, f1.id).await.unwrap();

        let first = repo
            .list_followers(star.id, PageRequest::first(2))
            .await
            .unwrap();
        let ids: Vec<i64> = first.items.iter().map(|f| f.follower_id).collect();
        assert_eq!(ids, vec![f3.id, f2.id]);

        let rest = repo
            .list_followers(star.id, PageRequest::after(2, first.next_cursor.unwrap()))
            .await
            .unwrap();
        let ids: Vec<i64> = rest.items.iter().map(|f| f.follower_id).collect();
        assert_eq!(ids, vec![f1.id]);
        assert!(rest.next_cursor.is_none());

        let following = repo
            .list_following(star.id, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(following.items.len(), 1);
        assert_eq!(following.items[0].followee_id, f1.id);
    }
}
