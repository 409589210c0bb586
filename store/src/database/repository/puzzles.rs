use super::{author_summary, fetch_limit, id_bound, Repository};
use crate::database::document::{operator_symbol, Document, OPERATORS};
use crate::database::models::{
    GeneratedBy, NewPuzzle, Page, PageRequest, Puzzle, PuzzleDetails, PuzzleQuery, PuzzleSort,
    PuzzleSummary,
};
use crate::error::{Result, StoreError};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, QueryBuilder, Sqlite};
use std::fmt;
use std::str::FromStr;

#[derive(FromRow)]
struct PuzzleDetailsRow {
    #[sqlx(flatten)]
    puzzle: Puzzle,
    author_name: Option<String>,
    author_avatar_key: Option<String>,
    likes_count: i64,
    solves_count: i64,
}

#[derive(FromRow)]
struct BrowseRow {
    id: i64,
    author_id: Option<i64>,
    title: String,
    size: i32,
    difficulty: Option<i32>,
    board_spec: Json<Document>,
    created_at: DateTime<Utc>,
    author_name: Option<String>,
    author_avatar_key: Option<String>,
    likes_count: i64,
    solves_count: i64,
}

impl From<BrowseRow> for PuzzleSummary {
    fn from(row: BrowseRow) -> Self {
        let operators = row.board_spec.0.operator_tokens();
        Self {
            id: row.id,
            title: row.title,
            size: row.size,
            difficulty: row.difficulty,
            created_at: row.created_at,
            author: author_summary(row.author_id, row.author_name, row.author_avatar_key),
            likes_count: row.likes_count,
            solves_count: row.solves_count,
            operators,
        }
    }
}

/// Position in the catalogue for keyset paging.
///
/// Rendered as `"<id>"` for [`PuzzleSort::Newest`] and `"<value>,<id>"`
/// otherwise, where `value` is the sort key of the last row returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowseCursor {
    pub primary: Option<i64>,
    pub id: i64,
}

impl fmt::Display for BrowseCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.primary {
            Some(primary) => write!(f, "{},{}", primary, self.id),
            None => write!(f, "{}", self.id),
        }
    }
}

impl FromStr for BrowseCursor {
    type Err = StoreError;

    fn from_str(raw: &str) -> Result<Self> {
        let parse = |part: &str| {
            part.trim()
                .parse::<i64>()
                .map_err(|_| StoreError::InvalidCursor(raw.to_string()))
        };

        match raw.split_once(',') {
            Some((primary, id)) => Ok(Self {
                primary: Some(parse(primary)?),
                id: parse(id)?,
            }),
            None => Ok(Self {
                primary: None,
                id: parse(raw)?,
            }),
        }
    }
}

// Sort keys for unrated puzzles, placing them after every rated one
const UNRATED_HARDEST_FIRST: i64 = 0;
const UNRATED_EASIEST_FIRST: i64 = 6;

impl PuzzleSort {
    fn order_by(self) -> &'static str {
        match self {
            Self::Newest => " ORDER BY c.id DESC",
            Self::MostLiked => " ORDER BY c.likes_count DESC, c.id DESC",
            Self::Largest => " ORDER BY c.size DESC, c.id DESC",
            Self::DifficultyDesc => " ORDER BY COALESCE(c.difficulty, 0) DESC, c.id DESC",
            Self::DifficultyAsc => " ORDER BY COALESCE(c.difficulty, 6) ASC, c.id DESC",
        }
    }

    fn key_column(self) -> Option<&'static str> {
        match self {
            Self::Newest => None,
            Self::MostLiked => Some("c.likes_count"),
            Self::Largest => Some("c.size"),
            Self::DifficultyDesc => Some("COALESCE(c.difficulty, 0)"),
            Self::DifficultyAsc => Some("COALESCE(c.difficulty, 6)"),
        }
    }

    /// Whether the primary key runs high to low. Ties always fall back to
    /// descending id.
    fn descending(self) -> bool {
        !matches!(self, Self::DifficultyAsc)
    }

    fn cursor_for(self, summary: &PuzzleSummary) -> BrowseCursor {
        let primary = match self {
            Self::Newest => None,
            Self::MostLiked => Some(summary.likes_count),
            Self::Largest => Some(i64::from(summary.size)),
            Self::DifficultyDesc => Some(
                summary
                    .difficulty
                    .map_or(UNRATED_HARDEST_FIRST, i64::from),
            ),
            Self::DifficultyAsc => Some(
                summary
                    .difficulty
                    .map_or(UNRATED_EASIEST_FIRST, i64::from),
            ),
        };
        BrowseCursor {
            primary,
            id: summary.id,
        }
    }
}

/// Board symbols a filter requires, from operator tokens.
fn required_symbols(tokens: &[String]) -> Vec<&'static str> {
    let mut symbols = Vec::new();
    for symbol in tokens.iter().filter_map(|t| operator_symbol(t.trim())) {
        if !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }
    symbols
}

/// Escape `LIKE` wildcards so a title search matches literally.
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

impl Repository {
    /// Create a puzzle. A `None` author is always accepted.
    pub async fn create_puzzle(&self, req: NewPuzzle) -> Result<Puzzle> {
        let puzzle = sqlx::query_as::<_, Puzzle>(
            r#"
            INSERT INTO puzzles (author_id, title, size, board_spec, num_solutions, difficulty)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(req.author_id)
        .bind(&req.title)
        .bind(req.size)
        .bind(Json(&req.board_spec))
        .bind(req.num_solutions)
        .bind(req.difficulty)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created puzzle: {} (author: {:?})", puzzle.id, puzzle.author_id);
        Ok(puzzle)
    }

    /// Get a puzzle by ID
    pub async fn get_puzzle(&self, id: i64) -> Result<Puzzle> {
        sqlx::query_as::<_, Puzzle>("SELECT * FROM puzzles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("puzzle", id))
    }

    pub async fn puzzle_exists(&self, id: i64) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM puzzles WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Puzzle with author block and like/solve counts
    pub async fn get_puzzle_details(&self, id: i64) -> Result<Option<PuzzleDetails>> {
        let row = sqlx::query_as::<_, PuzzleDetailsRow>(
            r#"
            SELECT
                p.*,
                u.name AS author_name,
                u.avatar_key AS author_avatar_key,
                (SELECT COUNT(*) FROM puzzle_likes WHERE puzzle_id = p.id) AS likes_count,
                (SELECT COUNT(*) FROM puzzle_solves WHERE puzzle_id = p.id) AS solves_count
            FROM puzzles p
            LEFT JOIN users u ON u.id = p.author_id
            WHERE p.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| PuzzleDetails {
            author: author_summary(row.puzzle.author_id, row.author_name, row.author_avatar_key),
            puzzle: row.puzzle,
            likes_count: row.likes_count,
            solves_count: row.solves_count,
        }))
    }

    /// Puzzles by one author, most recent first
    pub async fn list_puzzles_by_author(
        &self,
        author_id: i64,
        page: PageRequest,
    ) -> Result<Page<Puzzle>> {
        let limit = page.effective_limit();
        let rows = sqlx::query_as::<_, Puzzle>(
            r#"
            SELECT * FROM puzzles
            WHERE author_id = ? AND id < ?
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(author_id)
        .bind(id_bound(&page))
        .bind(fetch_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::from_overfetch(rows, limit, |p| p.id))
    }

    /// Public catalogue with filters, sorting and keyset paging
    pub async fn browse_puzzles(
        &self,
        query: &PuzzleQuery,
    ) -> Result<Page<PuzzleSummary, BrowseCursor>> {
        let limit = PageRequest::first(query.limit).effective_limit();
        let cursor = query
            .cursor
            .as_deref()
            .map(BrowseCursor::from_str)
            .transpose()?;

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT * FROM (
                SELECT
                    p.id,
                    p.author_id,
                    p.title,
                    p.size,
                    p.difficulty,
                    p.board_spec,
                    p.created_at,
                    u.name AS author_name,
                    u.avatar_key AS author_avatar_key,
                    (SELECT COUNT(*) FROM puzzle_likes WHERE puzzle_id = p.id) AS likes_count,
                    (SELECT COUNT(*) FROM puzzle_solves WHERE puzzle_id = p.id) AS solves_count
                FROM puzzles p
                LEFT JOIN users u ON u.id = p.author_id
            ) AS c
            WHERE 1 = 1
            "#,
        );

        if let Some(size) = query.size {
            qb.push(" AND c.size = ").push_bind(size);
        }
        if let Some(needle) = query.title_contains.as_deref().filter(|s| !s.trim().is_empty()) {
            qb.push(" AND c.title LIKE ")
                .push_bind(like_pattern(needle.trim()))
                .push(" ESCAPE '\\'");
        }
        if let Some(author_id) = query.author_id {
            qb.push(" AND c.author_id = ").push_bind(author_id);
        }
        if let Some(min_likes) = query.min_likes {
            qb.push(" AND c.likes_count >= ").push_bind(min_likes);
        }
        match query.generated_by {
            Some(GeneratedBy::Algorithm) => {
                qb.push(" AND c.author_id = ").push_bind(self.system_author_id);
            }
            Some(GeneratedBy::User) => {
                qb.push(" AND (c.author_id IS NULL OR c.author_id <> ")
                    .push_bind(self.system_author_id)
                    .push(")");
            }
            None => {}
        }

        let required = required_symbols(&query.operators);
        if !required.is_empty() {
            for symbol in &required {
                qb.push(
                    " AND EXISTS (SELECT 1 FROM json_each(c.board_spec, '$.operators') WHERE value = ",
                )
                .push_bind(*symbol)
                .push(")");
            }

            let excluded: Vec<&'static str> = OPERATORS
                .iter()
                .map(|(symbol, _)| *symbol)
                .filter(|symbol| !required.contains(symbol))
                .collect();
            if !excluded.is_empty() {
                qb.push(
                    " AND NOT EXISTS (SELECT 1 FROM json_each(c.board_spec, '$.operators') WHERE value IN (",
                );
                let mut values = qb.separated(", ");
                for symbol in excluded {
                    values.push_bind(symbol);
                }
                values.push_unseparated("))");
            }
        }

        if let Some(cursor) = cursor {
            match (query.sort.key_column(), cursor.primary) {
                (Some(column), Some(primary)) => {
                    let beyond = if query.sort.descending() { " < " } else { " > " };
                    qb.push(" AND (")
                        .push(column)
                        .push(beyond)
                        .push_bind(primary)
                        .push(" OR (")
                        .push(column)
                        .push(" = ")
                        .push_bind(primary)
                        .push(" AND c.id < ")
                        .push_bind(cursor.id)
                        .push("))");
                }
                (None, None) => {
                    qb.push(" AND c.id < ").push_bind(cursor.id);
                }
                _ => {
                    return Err(StoreError::InvalidCursor(format!(
                        "cursor {} does not match sort {:?}",
                        cursor, query.sort
                    )))
                }
            }
        }

        qb.push(query.sort.order_by());
        qb.push(" LIMIT ").push_bind(fetch_limit(limit));

        let rows = qb
            .build_query_as::<BrowseRow>()
            .fetch_all(&self.pool)
            .await?;

        let summaries: Vec<PuzzleSummary> = rows.into_iter().map(PuzzleSummary::from).collect();
        let sort = query.sort;
        Ok(Page::from_overfetch(summaries, limit, |s| sort.cursor_for(s)))
    }

    /// Delete a puzzle with its likes and solves.
    ///
    /// Fails with `RestrictViolation` while any daily slot features it.
    pub async fn delete_puzzle(&self, id: i64) -> Result<()> {
        let rows = sqlx::query("DELETE FROM puzzles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::from(e).on_delete())?
            .rows_affected();

        if rows == 0 {
            return Err(StoreError::not_found("puzzle", id));
        }

        tracing::debug!("Deleted puzzle: {}", id);
        Ok(())
    }
}
