//! Database models
//!
//! Rust structs representing database entities, the request structs used
//! to create them, and the read views built from joins.
//! All models use serde for serialization to an API layer.

use super::document::Document;
use crate::config::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A registered account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    /// Stored lower-cased; unique regardless of case
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_verified: bool,
    pub avatar_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Create user request
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// A generated or user-authored puzzle
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Puzzle {
    pub id: i64,
    /// `None` for system puzzles or once the author account is gone
    pub author_id: Option<i64>,
    pub title: String,
    pub size: i32,
    pub board_spec: Json<Document>,
    pub num_solutions: Option<i32>,
    pub difficulty: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Create puzzle request
#[derive(Debug, Clone, Deserialize)]
pub struct NewPuzzle {
    pub author_id: Option<i64>,
    pub title: String,
    pub size: i32,
    pub board_spec: Document,
    pub num_solutions: Option<i32>,
    pub difficulty: Option<i32>,
}

/// Directed follow edge
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Follow {
    pub id: i64,
    pub follower_id: i64,
    pub followee_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PuzzleLike {
    pub id: i64,
    pub user_id: i64,
    pub puzzle_id: i64,
    pub created_at: DateTime<Utc>,
}

/// One completed attempt at a puzzle
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PuzzleSolve {
    pub id: i64,
    pub user_id: i64,
    pub puzzle_id: i64,
    pub movements: i64,
    pub duration_ms: i64,
    /// Final path or board state, as sent by the client
    pub solution: Option<Json<Document>>,
    pub created_at: DateTime<Utc>,
}

/// Record solve request
#[derive(Debug, Clone, Deserialize)]
pub struct NewSolve {
    pub user_id: i64,
    pub puzzle_id: i64,
    pub movements: i64,
    pub duration_ms: i64,
    pub solution: Option<Document>,
}

/// Puzzle-of-the-day slot
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailyPuzzle {
    pub id: i64,
    pub puzzle_id: i64,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Public fields of a puzzle's author
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub id: i64,
    pub name: String,
    pub avatar_key: Option<String>,
}

/// A puzzle with its author and engagement counts
#[derive(Debug, Clone, Serialize)]
pub struct PuzzleDetails {
    pub puzzle: Puzzle,
    pub author: Option<AuthorSummary>,
    pub likes_count: i64,
    pub solves_count: i64,
}

/// Catalogue entry returned by browsing
#[derive(Debug, Clone, Serialize)]
pub struct PuzzleSummary {
    pub id: i64,
    pub title: String,
    pub size: i32,
    pub difficulty: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub author: Option<AuthorSummary>,
    pub likes_count: i64,
    pub solves_count: i64,
    pub operators: Vec<&'static str>,
}

/// A daily slot joined with the puzzle it features
#[derive(Debug, Clone, Serialize)]
pub struct DailyPuzzleEntry {
    pub date: NaiveDate,
    pub puzzle_id: i64,
    pub title: String,
    pub size: i32,
    pub difficulty: Option<i32>,
    pub puzzle_created_at: DateTime<Utc>,
    pub author: Option<AuthorSummary>,
}

/// Aggregate counters for a user profile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserStats {
    pub puzzles: i64,
    pub likes_received: i64,
    pub followers: i64,
    pub following: i64,
}

/// Keyset page request for "most recent first" listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Return rows with an id strictly below this one
    #[serde(default)]
    pub cursor: Option<i64>,
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            cursor: None,
        }
    }
}

impl PageRequest {
    pub fn first(limit: u32) -> Self {
        Self {
            limit,
            cursor: None,
        }
    }

    pub fn after(limit: u32, cursor: i64) -> Self {
        Self {
            limit,
            cursor: Some(cursor),
        }
    }

    /// Limit clamped to `1..=MAX_PAGE_SIZE`
    pub fn effective_limit(&self) -> u32 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }
}

/// One page of results plus the cursor for the next
#[derive(Debug, Clone, Serialize)]
pub struct Page<T, C = i64> {
    pub items: Vec<T>,
    pub next_cursor: Option<C>,
}

impl<T, C> Page<T, C> {
    /// Trim an over-fetched `limit + 1` result set into a page.
    pub(crate) fn from_overfetch(mut rows: Vec<T>, limit: u32, cursor_of: impl Fn(&T) -> C) -> Self {
        let limit = limit as usize;
        let has_more = rows.len() > limit;
        rows.truncate(limit);
        let next_cursor = if has_more {
            rows.last().map(cursor_of)
        } else {
            None
        };
        Self {
            items: rows,
            next_cursor,
        }
    }
}

/// Catalogue ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PuzzleSort {
    #[default]
    Newest,
    MostLiked,
    Largest,
    /// Hardest first; unrated puzzles last
    DifficultyDesc,
    /// Easiest first; unrated puzzles last
    DifficultyAsc,
}

/// Who produced a puzzle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratedBy {
    /// Authored by the system account
    Algorithm,
    /// Any other author, including puzzles whose author is gone
    User,
}

/// Filters and paging for the public catalogue
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PuzzleQuery {
    pub size: Option<i32>,
    /// Case-insensitive substring of the title
    pub title_contains: Option<String>,
    pub author_id: Option<i64>,
    pub min_likes: Option<i64>,
    pub generated_by: Option<GeneratedBy>,
    /// Operator tokens (`add`, `sub`, `mul`, `div`) a board must use,
    /// excluding every other operator. Unknown tokens are ignored.
    #[serde(default)]
    pub operators: Vec<String>,
    #[serde(default)]
    pub sort: PuzzleSort,
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Opaque cursor returned by the previous page
    pub cursor: Option<String>,
}
