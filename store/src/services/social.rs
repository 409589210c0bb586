//! Social service
//!
//! Follow and like actions as seen by request handlers: a duplicate write
//! is an already-applied action, not an error.

use crate::database::Repository;
use crate::error::{Result, StoreError};
use serde::Serialize;

/// Outcome of an idempotent social action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ack {
    /// False when the action had already been applied
    pub changed: bool,
}

impl Ack {
    fn from_write<T>(result: Result<T>, action: &str) -> Result<Self> {
        match result {
            Ok(_) => Ok(Self { changed: true }),
            Err(StoreError::UniqueViolation(msg)) => {
                tracing::warn!("{} already applied: {}", action, msg);
                Ok(Self { changed: false })
            }
            Err(e) => Err(e),
        }
    }
}

#[derive(Clone)]
pub struct SocialService {
    repo: Repository,
}

impl SocialService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub async fn follow(&self, follower_id: i64, followee_id: i64) -> Result<Ack> {
        tracing::info!("User {} follows {}", follower_id, followee_id);
        Ack::from_write(
            self.repo.follow_user(follower_id, followee_id).await,
            "follow",
        )
    }

    pub async fn unfollow(&self, follower_id: i64, followee_id: i64) -> Result<Ack> {
        tracing::info!("User {} unfollows {}", follower_id, followee_id);
        let changed = self.repo.unfollow_user(follower_id, followee_id).await?;
        Ok(Ack { changed })
    }

    /// Like a puzzle. Unknown puzzles are reported as `NotFound`.
    pub async fn like(&self, user_id: i64, puzzle_id: i64) -> Result<Ack> {
        tracing::info!("User {} likes puzzle {}", user_id, puzzle_id);
        self.require_puzzle(puzzle_id).await?;
        Ack::from_write(self.repo.like_puzzle(user_id, puzzle_id).await, "like")
    }

    pub async fn unlike(&self, user_id: i64, puzzle_id: i64) -> Result<Ack> {
        tracing::info!("User {} unlikes puzzle {}", user_id, puzzle_id);
        self.require_puzzle(puzzle_id).await?;
        let changed = self.repo.unlike_puzzle(user_id, puzzle_id).await?;
        Ok(Ack { changed })
    }

    async fn require_puzzle(&self, puzzle_id: i64) -> Result<()> {
        if self.repo.puzzle_exists(puzzle_id).await? {
            Ok(())
        } else {
            Err(StoreError::not_found("puzzle", puzzle_id))
        }
    }
}
