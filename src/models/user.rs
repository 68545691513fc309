use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::Game;
use crate::security::{gravatar_url, verify_password};

/// Registered user
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Salted PBKDF2 hash, see [`crate::security::hash_password`]
    pub password_hash: String,
    pub about_me: Option<String>,
}

/// Values for a user about to be inserted
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

const USER_COLUMNS: &str = "id, username, email, password_hash, about_me";

impl User {
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM user WHERE id = ?", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM user WHERE username = ?", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM user WHERE email = ?", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    pub async fn create(pool: &SqlitePool, new_user: &NewUser) -> Result<User> {
        let id = sqlx::query("INSERT INTO user (username, email, password_hash) VALUES (?, ?, ?)")
            .bind(&new_user.username)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .execute(pool)
            .await?
            .last_insert_rowid();

        Ok(User {
            id,
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            about_me: None,
        })
    }

    /// Save a new username and "about me" text
    pub async fn update_profile(
        &mut self,
        pool: &SqlitePool,
        username: &str,
        about_me: Option<&str>,
    ) -> Result<()> {
        sqlx::query("UPDATE user SET username = ?, about_me = ? WHERE id = ?")
            .bind(username)
            .bind(about_me)
            .bind(self.id)
            .execute(pool)
            .await?;

        self.username = username.to_string();
        self.about_me = about_me.map(str::to_string);
        Ok(())
    }

    pub fn check_password(&self, password: &str) -> bool {
        verify_password(&self.password_hash, password)
    }

    pub fn avatar(&self, size: u32) -> String {
        gravatar_url(&self.email, size)
    }

    // =========================================================================
    // Favorites
    // =========================================================================

    pub async fn is_favorite(&self, pool: &SqlitePool, game: &Game) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM favorites WHERE user_id = ? AND game_id = ?")
                .bind(self.id)
                .bind(game.id)
                .fetch_one(pool)
                .await?;
        Ok(count > 0)
    }

    /// Add a game to this user's favorites
    ///
    /// Returns `false` without touching the database if it is already there.
    pub async fn favorite(&self, pool: &SqlitePool, game: &Game) -> Result<bool> {
        if self.is_favorite(pool, game).await? {
            return Ok(false);
        }

        sqlx::query("INSERT INTO favorites (user_id, game_id) VALUES (?, ?)")
            .bind(self.id)
            .bind(game.id)
            .execute(pool)
            .await?;
        Ok(true)
    }

    /// Remove a game from this user's favorites
    ///
    /// Returns `false` without touching the database if it was not there.
    pub async fn unfavorite(&self, pool: &SqlitePool, game: &Game) -> Result<bool> {
        if !self.is_favorite(pool, game).await? {
            return Ok(false);
        }

        sqlx::query("DELETE FROM favorites WHERE user_id = ? AND game_id = ?")
            .bind(self.id)
            .bind(game.id)
            .execute(pool)
            .await?;
        Ok(true)
    }

    /// Games this user has favorited, by name
    pub async fn favorite_games(&self, pool: &SqlitePool) -> Result<Vec<Game>> {
        let games = sqlx::query_as::<_, Game>(
            "SELECT game.id, game.name, game.category1_id, game.category2_id \
             FROM game JOIN favorites ON favorites.game_id = game.id \
             WHERE favorites.user_id = ? ORDER BY game.name",
        )
        .bind(self.id)
        .fetch_all(pool)
        .await?;
        Ok(games)
    }
}
