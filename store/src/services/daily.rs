//! Daily puzzle service
//!
//! Publishes the puzzle of the day by featuring a generated puzzle that has
//! not been featured before. The date's uniqueness constraint decides races
//! between concurrent publishers.

use crate::database::Repository;
use crate::error::{Result, StoreError};
use chrono::{NaiveDate, Utc};
use serde::Serialize;

/// Result of ensuring a date has a featured puzzle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DailyOutcome {
    /// This call featured `puzzle_id`
    Assigned { puzzle_id: i64 },
    /// The date already had a puzzle
    AlreadySet,
}

#[derive(Clone)]
pub struct DailyPuzzleService {
    repo: Repository,
    system_author_id: i64,
}

impl DailyPuzzleService {
    /// `system_author_id` owns the generated puzzles eligible for featuring.
    pub fn new(repo: Repository, system_author_id: i64) -> Self {
        Self {
            repo,
            system_author_id,
        }
    }

    pub async fn ensure_for_today(&self) -> Result<DailyOutcome> {
        self.ensure_for_date(Utc::now().date_naive()).await
    }

    pub async fn ensure_for_date(&self, date: NaiveDate) -> Result<DailyOutcome> {
        if self.repo.get_daily_puzzle(date).await?.is_some() {
            tracing::debug!("Daily puzzle for {} already set", date);
            return Ok(DailyOutcome::AlreadySet);
        }

        let puzzle_id = self
            .repo
            .pick_unused_puzzle(self.system_author_id)
            .await?
            .ok_or(StoreError::NoPuzzleAvailable(date))?;

        match self.repo.set_daily_puzzle(puzzle_id, date).await {
            Ok(_) => {
                tracing::info!("Published puzzle {} as daily puzzle for {}", puzzle_id, date);
                Ok(DailyOutcome::Assigned { puzzle_id })
            }
            Err(StoreError::UniqueViolation(_)) => {
                tracing::warn!("Daily puzzle for {} was set concurrently", date);
                Ok(DailyOutcome::AlreadySet)
            }
            Err(e) => Err(e),
        }
    }
}
