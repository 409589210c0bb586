use super::Repository;
use crate::database::models::{NewUser, User, UserStats};
use crate::error::{Result, StoreError};

impl Repository {
    /// Register a user. Emails are unique regardless of case.
    pub async fn create_user(&self, req: NewUser) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES (?, lower(?), ?)
            RETURNING *
            "#,
        )
        .bind(&req.name)
        .bind(req.email.trim())
        .bind(&req.password_hash)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created user: {}", user.id);
        Ok(user)
    }

    /// Get a user by ID
    pub async fn get_user(&self, id: i64) -> Result<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("user", id))
    }

    /// Case-insensitive lookup, served by the `lower(email)` index
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower(?)")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn mark_user_verified(&self, id: i64) -> Result<()> {
        let rows = sqlx::query("UPDATE users SET is_verified = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(StoreError::not_found("user", id));
        }

        tracing::debug!("Marked user as verified: {}", id);
        Ok(())
    }

    /// Delete a user.
    ///
    /// Follows, likes and solves go with the account; authored puzzles
    /// remain with their author cleared.
    pub async fn delete_user(&self, id: i64) -> Result<()> {
        let rows = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(StoreError::not_found("user", id));
        }

        tracing::debug!("Deleted user: {}", id);
        Ok(())
    }

    pub async fn user_stats(&self, id: i64) -> Result<UserStats> {
        // Existence check so an unknown id is not reported as all zeroes
        self.get_user(id).await?;

        let stats = sqlx::query_as::<_, UserStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM puzzles WHERE author_id = ?) AS puzzles,
                (SELECT COUNT(*)
                   FROM puzzle_likes pl
                   JOIN puzzles p ON p.id = pl.puzzle_id
                  WHERE p.author_id = ?) AS likes_received,
                (SELECT COUNT(*) FROM follows WHERE followee_id = ?) AS followers,
                (SELECT COUNT(*) FROM follows WHERE follower_id = ?) AS following
            "#,
        )
        .bind(id)
        .bind(id)
        .bind(id)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}
