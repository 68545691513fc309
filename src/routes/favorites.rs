use axum::{
    extract::{Path, State},
    response::Redirect,
};
use axum_extra::extract::cookie::CookieJar;

use crate::error::Result;
use crate::models::Game;
use crate::session::{flash, CurrentUser};
use crate::AppState;

/// Look up the game named by a path segment; non-numeric ids simply miss
async fn find_game(state: &AppState, game_id: &str) -> Result<Option<Game>> {
    match game_id.parse::<i64>() {
        Ok(id) => Game::find_by_id(&state.pool, id).await,
        Err(_) => Ok(None),
    }
}

pub async fn favorite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(game_id): Path<String>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect)> {
    let Some(game) = find_game(&state, &game_id).await? else {
        let jar = flash(jar, format!("Game {} not found.", game_id));
        return Ok((jar, Redirect::to("/")));
    };

    let message = if user.favorite(&state.pool, &game).await? {
        tracing::info!("User '{}' favorited '{}'", user.username, game.name);
        format!("You added {} to your favorites", game.name)
    } else {
        format!("{} is already in your favorites", game.name)
    };

    Ok((flash(jar, message), Redirect::to("/")))
}

pub async fn unfavorite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(game_id): Path<String>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect)> {
    let Some(game) = find_game(&state, &game_id).await? else {
        let jar = flash(jar, format!("Game {} not found.", game_id));
        return Ok((jar, Redirect::to("/")));
    };

    let message = if user.unfavorite(&state.pool, &game).await? {
        tracing::info!("User '{}' unfavorited '{}'", user.username, game.name);
        format!("You removed {} from your favorites", game.name)
    } else {
        format!("{} is not in your favorites", game.name)
    };

    Ok((flash(jar, message), Redirect::to("/")))
}
