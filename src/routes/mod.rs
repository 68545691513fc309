pub mod auth;
pub mod categories;
pub mod favorites;
pub mod games;
pub mod health;
pub mod index;
pub mod profile;

use axum::{routing::get, Router};
use axum_extra::extract::cookie::CookieJar;
use tower_http::trace::TraceLayer;

use crate::models::User;
use crate::session::take_flashes;
use crate::views::PageContext;
use crate::AppState;

pub use auth::{login, login_form, logout, register, register_form};
pub use categories::{add_category, categories};
pub use favorites::{favorite, unfavorite};
pub use games::{add_game, add_game_form};
pub use health::health_check;
pub use index::{index, search};
pub use profile::{edit_profile, edit_profile_form, user_profile};

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index).post(search))
        .route("/index", get(index).post(search))
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
        .route("/register", get(register_form).post(register))
        .route("/addgame", get(add_game_form).post(add_game))
        .route("/user/:username", get(user_profile))
        .route("/edit_profile", get(edit_profile_form).post(edit_profile))
        .route("/favorite/:game_id", get(favorite))
        .route("/unfavorite/:game_id", get(unfavorite))
        .route("/category", get(categories).post(add_category))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Consume pending flash messages into a page context
pub(crate) fn page_context(jar: CookieJar, user: Option<User>) -> (CookieJar, PageContext) {
    let (jar, messages) = take_flashes(jar);
    (jar, PageContext { user, messages })
}
