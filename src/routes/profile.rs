use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;

use crate::constants::{AVATAR_SIZE, MSG_PROFILE_SAVED};
use crate::error::{AppError, Result};
use crate::forms::{EditProfileForm, FormErrors};
use crate::models::User;
use crate::routes::page_context;
use crate::session::{flash, CurrentUser};
use crate::views::{edit_profile_page, user_page};
use crate::AppState;

/// Public profile page; unknown usernames are a 404
pub async fn user_profile(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    Path(username): Path<String>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>)> {
    let profile = User::find_by_username(&state.pool, &username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", username)))?;
    let favorites = profile.favorite_games(&state.pool).await?;

    let (jar, ctx) = page_context(jar, Some(viewer));
    let page = user_page(&ctx, &profile, &profile.avatar(AVATAR_SIZE), &favorites);
    Ok((jar, Html(page)))
}

pub async fn edit_profile_form(
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> (CookieJar, Html<String>) {
    let form = EditProfileForm {
        username: user.username.clone(),
        about_me: user.about_me.clone().unwrap_or_default(),
    };

    let (jar, ctx) = page_context(jar, Some(user));
    let page = edit_profile_page(&ctx, &form, &FormErrors::default());
    (jar, Html(page))
}

/// Save username and about-me; keeping one's own username is not a conflict
pub async fn edit_profile(
    State(state): State<AppState>,
    CurrentUser(mut user): CurrentUser,
    jar: CookieJar,
    Form(mut form): Form<EditProfileForm>,
) -> Result<Response> {
    let errors = form.validate(&state.pool, &user.username).await?;
    if !errors.is_empty() {
        let (jar, ctx) = page_context(jar, Some(user));
        let page = edit_profile_page(&ctx, &form, &errors);
        return Ok((jar, Html(page)).into_response());
    }

    let previous = user.username.clone();
    user.update_profile(&state.pool, &form.username, form.about_me())
        .await?;
    if previous != user.username {
        tracing::info!("User '{}' renamed to '{}'", previous, user.username);
    }

    let jar = flash(jar, MSG_PROFILE_SAVED);
    Ok((jar, Redirect::to("/edit_profile")).into_response())
}
