use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::constants::{MSG_INVALID_CREDENTIALS, MSG_REGISTERED};
use crate::error::Result;
use crate::forms::{FormErrors, LoginForm, RegistrationForm};
use crate::models::{NewUser, User};
use crate::routes::page_context;
use crate::security::{hash_password, is_safe_redirect, verify_unknown_account};
use crate::session::{clear_session, flash, login_url, session_cookie, MaybeUser};
use crate::views::{login_page, register_page};
use crate::AppState;

/// `?next=` target of the login page
#[derive(Debug, Default, Deserialize)]
pub struct NextParam {
    pub next: Option<String>,
}

impl NextParam {
    /// Where to go after logging in; external targets are ignored
    fn destination(&self) -> &str {
        match self.next.as_deref() {
            Some(next) if is_safe_redirect(next) => next,
            Some(next) => {
                tracing::warn!("Ignoring unsafe login redirect target: {}", next);
                "/"
            }
            None => "/",
        }
    }
}

pub async fn login_form(
    MaybeUser(user): MaybeUser,
    Query(params): Query<NextParam>,
    jar: CookieJar,
) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    let (jar, ctx) = page_context(jar, None);
    let page = login_page(
        &ctx,
        &LoginForm::default(),
        &FormErrors::default(),
        params.next.as_deref(),
    );
    (jar, Html(page)).into_response()
}

/// Log in with username and password
///
/// Failures never say which of the two was wrong.
pub async fn login(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(params): Query<NextParam>,
    jar: CookieJar,
    Form(mut form): Form<LoginForm>,
) -> Result<Response> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let errors = form.validate();
    if !errors.is_empty() {
        let (jar, ctx) = page_context(jar, None);
        let page = login_page(&ctx, &form, &errors, params.next.as_deref());
        return Ok((jar, Html(page)).into_response());
    }

    // Password checks run on the blocking pool; unknown usernames pay the
    // same hashing cost as known ones
    let candidate = User::find_by_username(&state.pool, &form.username).await?;
    let password = form.password.clone();
    let iterations = state.config.password_hash_iterations;
    let verified = tokio::task::spawn_blocking(move || match candidate {
        Some(user) => user.check_password(&password).then_some(user),
        None => {
            verify_unknown_account(&password, iterations);
            None
        }
    })
    .await?;

    let Some(user) = verified else {
        tracing::info!("Failed login attempt for '{}'", form.username);
        let retry = match params.next.as_deref() {
            Some(next) => login_url(next),
            None => "/login".to_string(),
        };
        let jar = flash(jar, MSG_INVALID_CREDENTIALS);
        return Ok((jar, Redirect::to(&retry)).into_response());
    };

    tracing::info!("User '{}' logged in (remember: {})", user.username, form.remember());

    let jar = jar.add(session_cookie(&state.config, user.id, form.remember()));
    Ok((jar, Redirect::to(params.destination())).into_response())
}

pub async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    (clear_session(jar), Redirect::to("/"))
}

pub async fn register_form(MaybeUser(user): MaybeUser, jar: CookieJar) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    let (jar, ctx) = page_context(jar, None);
    let page = register_page(&ctx, &RegistrationForm::default(), &FormErrors::default());
    (jar, Html(page)).into_response()
}

/// Create an account; uniqueness is checked before the insert
pub async fn register(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
    Form(mut form): Form<RegistrationForm>,
) -> Result<Response> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let errors = form.validate(&state.pool).await?;
    if !errors.is_empty() {
        let (jar, ctx) = page_context(jar, None);
        let page = register_page(&ctx, &form, &errors);
        return Ok((jar, Html(page)).into_response());
    }

    let iterations = state.config.password_hash_iterations;
    let password = form.password.clone();
    let password_hash =
        tokio::task::spawn_blocking(move || hash_password(&password, iterations)).await?;
    let user = User::create(
        &state.pool,
        &NewUser {
            username: form.username,
            email: form.email,
            password_hash,
        },
    )
    .await?;

    tracing::info!("New user registered: '{}' (id {})", user.username, user.id);

    let jar = flash(jar, MSG_REGISTERED);
    Ok((jar, Redirect::to("/login")).into_response())
}
