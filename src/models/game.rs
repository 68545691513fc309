use sqlx::SqlitePool;

use crate::constants::NO_CATEGORY;
use crate::error::Result;

/// Game catalog entry
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Game {
    pub id: i64,
    pub name: String,
    /// Category1 id, `None` when not categorized
    pub category1_id: Option<i64>,
    /// Category2 id, `None` when not categorized
    pub category2_id: Option<i64>,
}

/// Values for a game about to be inserted
#[derive(Debug, Clone)]
pub struct NewGame {
    pub name: String,
    pub category1_id: Option<i64>,
    pub category2_id: Option<i64>,
}

impl NewGame {
    /// Build from raw selector values, where 0 means "not categorized"
    pub fn from_selectors(name: String, category1: i64, category2: i64) -> Self {
        Self {
            name,
            category1_id: selected(category1),
            category2_id: selected(category2),
        }
    }
}

/// Which categories a search is restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFilter {
    First(i64),
    Second(i64),
    Both(i64, i64),
}

impl CategoryFilter {
    /// Build a filter from the two selector values (0 = unselected)
    ///
    /// Returns `None` when neither selector is set.
    pub fn from_selectors(category1: i64, category2: i64) -> Option<Self> {
        match (selected(category1), selected(category2)) {
            (None, None) => None,
            (Some(c1), None) => Some(CategoryFilter::First(c1)),
            (None, Some(c2)) => Some(CategoryFilter::Second(c2)),
            (Some(c1), Some(c2)) => Some(CategoryFilter::Both(c1, c2)),
        }
    }

    /// Whether a game passes this filter
    pub fn matches(&self, game: &Game) -> bool {
        match *self {
            CategoryFilter::First(c1) => game.category1_id == Some(c1),
            CategoryFilter::Second(c2) => game.category2_id == Some(c2),
            CategoryFilter::Both(c1, c2) => {
                game.category1_id == Some(c1) && game.category2_id == Some(c2)
            }
        }
    }
}

fn selected(value: i64) -> Option<i64> {
    (value != NO_CATEGORY).then_some(value)
}

const GAME_COLUMNS: &str = "id, name, category1_id, category2_id";

impl Game {
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Game>> {
        let sql = format!("SELECT {} FROM game WHERE id = ?", GAME_COLUMNS);
        let game = sqlx::query_as::<_, Game>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(game)
    }

    pub async fn find_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Game>> {
        let sql = format!("SELECT {} FROM game WHERE name = ?", GAME_COLUMNS);
        let game = sqlx::query_as::<_, Game>(&sql)
            .bind(name)
            .fetch_optional(pool)
            .await?;
        Ok(game)
    }

    pub async fn create(pool: &SqlitePool, new_game: &NewGame) -> Result<Game> {
        let id = sqlx::query("INSERT INTO game (name, category1_id, category2_id) VALUES (?, ?, ?)")
            .bind(&new_game.name)
            .bind(new_game.category1_id)
            .bind(new_game.category2_id)
            .execute(pool)
            .await?
            .last_insert_rowid();

        tracing::info!("Created game '{}' (id {})", new_game.name, id);

        Ok(Game {
            id,
            name: new_game.name.clone(),
            category1_id: new_game.category1_id,
            category2_id: new_game.category2_id,
        })
    }

    /// Every game, most recently added first
    pub async fn list_recent(pool: &SqlitePool) -> Result<Vec<Game>> {
        let sql = format!("SELECT {} FROM game ORDER BY id DESC", GAME_COLUMNS);
        let games = sqlx::query_as::<_, Game>(&sql).fetch_all(pool).await?;
        Ok(games)
    }

    /// Games passing a category filter, most recently added first
    pub async fn search(pool: &SqlitePool, filter: CategoryFilter) -> Result<Vec<Game>> {
        let query = match filter {
            CategoryFilter::First(c1) => sqlx::query_as::<_, Game>(
                "SELECT id, name, category1_id, category2_id FROM game \
                 WHERE category1_id = ? ORDER BY id DESC",
            )
            .bind(c1),
            CategoryFilter::Second(c2) => sqlx::query_as::<_, Game>(
                "SELECT id, name, category1_id, category2_id FROM game \
                 WHERE category2_id = ? ORDER BY id DESC",
            )
            .bind(c2),
            CategoryFilter::Both(c1, c2) => sqlx::query_as::<_, Game>(
                "SELECT id, name, category1_id, category2_id FROM game \
                 WHERE category1_id = ? AND category2_id = ? ORDER BY id DESC",
            )
            .bind(c1)
            .bind(c2),
        };

        let games = query.fetch_all(pool).await?;
        tracing::debug!("Category search {:?} matched {} games", filter, games.len());
        Ok(games)
    }
}
