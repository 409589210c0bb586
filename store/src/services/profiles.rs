//! Profile service
//!
//! Read-only public views that combine a row with its derived slug and
//! aggregate counts.

use crate::database::{PuzzleDetails, Repository, UserStats};
use crate::error::{Result, StoreError};
use crate::slug::slugify;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Public profile of a user
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub slug: String,
    pub display_name: String,
    pub avatar_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub stats: UserStats,
}

/// Puzzle details with a title slug
#[derive(Debug, Clone, Serialize)]
pub struct PuzzleView {
    pub slug: String,
    #[serde(flatten)]
    pub details: PuzzleDetails,
}

#[derive(Clone)]
pub struct ProfileService {
    repo: Repository,
}

impl ProfileService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub async fn public_profile(&self, user_id: i64) -> Result<Option<UserProfile>> {
        let user = match self.repo.get_user(user_id).await {
            Ok(user) => user,
            Err(StoreError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        let stats = self.repo.user_stats(user_id).await?;

        Ok(Some(UserProfile {
            id: user.id,
            slug: slugify(&user.name, "user"),
            display_name: user.name,
            avatar_key: user.avatar_key,
            created_at: user.created_at,
            stats,
        }))
    }

    pub async fn puzzle_details(&self, puzzle_id: i64) -> Result<Option<PuzzleView>> {
        let details = self.repo.get_puzzle_details(puzzle_id).await?;
        Ok(details.map(|details| PuzzleView {
            slug: slugify(&details.puzzle.title, "puzzle"),
            details,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repository::test_support::*;

    #[tokio::test]
    async fn test_public_profile() {
        let repo = create_test_repo().await;
        let user = seed_user(&repo, "Ada Lovelace").await;
        let fan = seed_user(&repo, "Fan").await;
        let puzzle = seed_puzzle(&repo, Some(user.id), "Engine").await;
        repo.like_puzzle(fan.id, puzzle.id).await.unwrap();
        repo.follow_user(fan.id, user.id).await.unwrap();

        let service = ProfileService::new(repo);
        let profile = service.public_profile(user.id).await.unwrap().unwrap();

        assert_eq!(profile.slug, "ada-lovelace");
        assert_eq!(profile.display_name, "Ada Lovelace");
        assert_eq!(profile.stats.puzzles, 1);
        assert_eq!(profile.stats.likes_received, 1);
        assert_eq!(profile.stats.followers, 1);

        assert!(service.public_profile(9_000).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_puzzle_view() {
        let repo = create_test_repo().await;
        let puzzle = seed_puzzle(&repo, None, "Daily #1: Sums").await;
        let service = ProfileService::new(repo);

        let view = service.puzzle_details(puzzle.id).await.unwrap().unwrap();
        assert_eq!(view.slug, "daily-1-sums");
        assert!(view.details.author.is_none());

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["slug"], "daily-1-sums");
        assert_eq!(json["likes_count"], 0);
    }
}
