use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;

use crate::constants::MSG_GAME_ADDED;
use crate::error::Result;
use crate::forms::{FormErrors, GameForm};
use crate::models::{Category, Game, NewGame, Taxonomy};
use crate::routes::page_context;
use crate::session::{flash, MaybeUser};
use crate::views::add_game_page;
use crate::AppState;

pub async fn add_game_form(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>)> {
    let choices1 = Category::choices(&state.pool, Taxonomy::First).await?;
    let choices2 = Category::choices(&state.pool, Taxonomy::Second).await?;

    let (jar, ctx) = page_context(jar, user);
    let page = add_game_page(
        &ctx,
        &GameForm::default(),
        &FormErrors::default(),
        &choices1,
        &choices2,
    );
    Ok((jar, Html(page)))
}

/// Add a game with whichever categories were selected
pub async fn add_game(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
    Form(mut form): Form<GameForm>,
) -> Result<Response> {
    let errors = form.validate(&state.pool).await?;
    if !errors.is_empty() {
        let choices1 = Category::choices(&state.pool, Taxonomy::First).await?;
        let choices2 = Category::choices(&state.pool, Taxonomy::Second).await?;

        let (jar, ctx) = page_context(jar, user);
        let page = add_game_page(&ctx, &form, &errors, &choices1, &choices2);
        return Ok((jar, Html(page)).into_response());
    }

    let (category1, category2) = form.selectors();
    let new_game = NewGame::from_selectors(form.name, category1, category2);
    let game = Game::create(&state.pool, &new_game).await?;
    tracing::info!("Game '{}' added (id {})", game.name, game.id);

    let jar = flash(jar, MSG_GAME_ADDED);
    Ok((jar, Redirect::to("/")).into_response())
}
