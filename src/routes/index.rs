use axum::{extract::State, response::Html, Form};
use axum_extra::extract::cookie::CookieJar;
use std::collections::HashSet;

use crate::constants::MSG_SELECT_CATEGORY;
use crate::error::Result;
use crate::forms::SearchForm;
use crate::models::{Category, CategoryFilter, Game, Taxonomy, User};
use crate::routes::page_context;
use crate::session::MaybeUser;
use crate::views::{index_page, IndexView};
use crate::AppState;

/// Game listing, most recently added first, with the category filter form
pub async fn index(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>)> {
    let games = Game::list_recent(&state.pool).await?;
    render(&state, jar, user, "All games", &games, SearchForm::default(), None).await
}

/// Category-filtered listing
///
/// With neither selector set nothing is searched and a warning is shown.
pub async fn search(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
    Form(form): Form<SearchForm>,
) -> Result<(CookieJar, Html<String>)> {
    let (category1, category2) = form.selectors();
    match CategoryFilter::from_selectors(category1, category2) {
        Some(filter) => {
            let games = Game::search(&state.pool, filter).await?;
            render(&state, jar, user, "Search results", &games, form, None).await
        }
        None => {
            tracing::debug!("Category search without a selection");
            render(
                &state,
                jar,
                user,
                "Search results",
                &[],
                form,
                Some(MSG_SELECT_CATEGORY),
            )
            .await
        }
    }
}

async fn render(
    state: &AppState,
    jar: CookieJar,
    user: Option<User>,
    heading: &str,
    games: &[Game],
    search: SearchForm,
    warning: Option<&str>,
) -> Result<(CookieJar, Html<String>)> {
    let choices1 = Category::choices(&state.pool, Taxonomy::First).await?;
    let choices2 = Category::choices(&state.pool, Taxonomy::Second).await?;

    let favorites: HashSet<i64> = match &user {
        Some(user) => user
            .favorite_games(&state.pool)
            .await?
            .into_iter()
            .map(|g| g.id)
            .collect(),
        None => HashSet::new(),
    };

    let (jar, mut ctx) = page_context(jar, user);
    ctx.messages.extend(warning.map(str::to_string));

    let page = index_page(
        &ctx,
        &IndexView {
            heading,
            games,
            search,
            choices1: &choices1,
            choices2: &choices2,
            favorites: &favorites,
        },
    );
    Ok((jar, Html(page)))
}
