//! Error types for the Klotski store
//!
//! All errors use thiserror for structured error handling.
//! Constraint failures raised by SQLite are classified into the four
//! integrity variants so callers can tell a conflict from a real fault.
//! These errors can be serialized to an API layer.

use chrono::NaiveDate;
use sqlx::error::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Check constraint violated: {0}")]
    CheckViolation(String),

    #[error("Foreign key violated: {0}")]
    ForeignKeyViolation(String),

    #[error("Delete restricted by dependent rows: {0}")]
    RestrictViolation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    #[error("No puzzle available to feature on {0}")]
    NoPuzzleAvailable(NaiveDate),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Reinterpret a foreign-key failure raised by a DELETE.
    ///
    /// SQLite reports a blocked `ON DELETE RESTRICT` with the same code as a
    /// dangling reference on insert.
    pub(crate) fn on_delete(self) -> Self {
        match self {
            Self::ForeignKeyViolation(msg) => Self::RestrictViolation(msg),
            other => other,
        }
    }

    /// True for any of the integrity-constraint variants.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::UniqueViolation(_)
                | Self::CheckViolation(_)
                | Self::ForeignKeyViolation(_)
                | Self::RestrictViolation(_)
        )
    }
}

/// Extended result code SQLite uses for a blocked `ON DELETE RESTRICT`.
const SQLITE_CONSTRAINT_TRIGGER: &str = "1811";

const FOREIGN_KEY_MESSAGE: &str = "FOREIGN KEY constraint failed";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let message = db_err.message().to_string();
            match db_err.kind() {
                ErrorKind::UniqueViolation => return Self::UniqueViolation(message),
                ErrorKind::CheckViolation => return Self::CheckViolation(message),
                ErrorKind::ForeignKeyViolation => return Self::ForeignKeyViolation(message),
                _ => {}
            }

            // RESTRICT actions fire as a trigger-class constraint, not 787
            let restrict = db_err.code().as_deref() == Some(SQLITE_CONSTRAINT_TRIGGER);
            if restrict || message.starts_with(FOREIGN_KEY_MESSAGE) {
                return Self::ForeignKeyViolation(message);
            }
        }
        Self::Database(err)
    }
}

impl serde::Serialize for StoreError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_delete_maps_foreign_key_to_restrict() {
        let err = StoreError::ForeignKeyViolation("FOREIGN KEY constraint failed".into());
        assert!(matches!(err.on_delete(), StoreError::RestrictViolation(_)));

        let other = StoreError::CheckViolation("CHECK constraint failed".into());
        assert!(matches!(other.on_delete(), StoreError::CheckViolation(_)));
    }

    #[test]
    fn test_serializes_as_message() {
        let err = StoreError::not_found("user", 42);
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"user not found: 42\"");
    }

    mod classification {
        use super::*;
        use crate::database::create_memory_pool;
        use sqlx::SqlitePool;

        async fn seeded_pool() -> SqlitePool {
            let pool = create_memory_pool().await.unwrap();
            sqlx::query("INSERT INTO users (id, name, email, password_hash) VALUES (1, 'Kiwi', 'kiwi@x.com', 'h')")
                .execute(&pool)
                .await
                .unwrap();
            sqlx::query("INSERT INTO puzzles (id, author_id, title, size, board_spec) VALUES (1, 1, 'P', 3, '{}')")
                .execute(&pool)
                .await
                .unwrap();
            pool
        }

        async fn run(pool: &SqlitePool, sql: &str) -> StoreError {
            sqlx::query(sql).execute(pool).await.unwrap_err().into()
        }

        #[tokio::test]
        async fn test_unique_violation_from_engine() {
            let pool = seeded_pool().await;
            let err = run(
                &pool,
                "INSERT INTO users (name, email, password_hash) VALUES ('Other', 'KIWI@x.com', 'h')",
            )
            .await;
            assert!(matches!(err, StoreError::UniqueViolation(_)), "{err:?}");
        }

        #[tokio::test]
        async fn test_check_violation_from_engine() {
            let pool = seeded_pool().await;
            let err = run(
                &pool,
                "INSERT INTO puzzles (title, size, board_spec) VALUES ('Empty', 0, '{}')",
            )
            .await;
            assert!(matches!(err, StoreError::CheckViolation(_)), "{err:?}");
        }

        #[tokio::test]
        async fn test_foreign_key_violation_from_engine() {
            let pool = seeded_pool().await;
            let err = run(
                &pool,
                "INSERT INTO puzzle_likes (user_id, puzzle_id) VALUES (1, 999)",
            )
            .await;
            assert!(matches!(err, StoreError::ForeignKeyViolation(_)), "{err:?}");
        }

        #[tokio::test]
        async fn test_restrict_violation_from_engine() {
            let pool = seeded_pool().await;
            sqlx::query("INSERT INTO daily_puzzles (puzzle_id, date) VALUES (1, '2024-01-01')")
                .execute(&pool)
                .await
                .unwrap();

            let err = run(&pool, "DELETE FROM puzzles WHERE id = 1").await;
            assert!(matches!(err, StoreError::ForeignKeyViolation(_)), "{err:?}");
            assert!(matches!(err.on_delete(), StoreError::RestrictViolation(_)));
        }
    }

    #[test]
    fn test_row_not_found_stays_database_error() {
        let err: StoreError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, StoreError::Database(_)));
        assert!(!err.is_constraint_violation());
    }
}
