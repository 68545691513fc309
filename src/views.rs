//! Server-rendered HTML pages.
//!
//! Pages are plain strings assembled here; every piece of user-supplied text
//! goes through [`escape`].

use axum::http::StatusCode;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::{HashMap, HashSet};
use std::fmt::Write;

use crate::forms::{EditProfileForm, FormErrors, GameForm, LoginForm, RegistrationForm, SearchForm};
use crate::models::{Category, Choice, Game, Taxonomy, User};

/// Per-request values every page needs
#[derive(Debug, Default)]
pub struct PageContext {
    pub user: Option<User>,
    pub messages: Vec<String>,
}

/// Escape text for use in HTML content and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

/// Characters left as-is in a URL path segment
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Profile page path; usernames may contain `/`, `?` or `%`
pub fn user_url(username: &str) -> String {
    format!("/user/{}", utf8_percent_encode(username, PATH_SEGMENT))
}

fn layout(ctx: &PageContext, title: &str, content: &str) -> String {
    let mut nav = String::from(
        r#"<a href="/">Home</a> <a href="/addgame">Add game</a> <a href="/category">Categories</a>"#,
    );
    match &ctx.user {
        Some(user) => {
            let _ = write!(
                nav,
                r#" <a href="{href}">Profile</a> <a href="/logout">Logout</a>"#,
                href = escape(&user_url(&user.username))
            );
        }
        None => nav.push_str(r#" <a href="/login">Login</a>"#),
    }

    let mut flashes = String::new();
    if !ctx.messages.is_empty() {
        flashes.push_str(r#"<ul class="flashes">"#);
        for message in &ctx.messages {
            let _ = write!(flashes, "<li>{}</li>", escape(message));
        }
        flashes.push_str("</ul>");
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title} - Gamebase</title></head>\n\
         <body>\n<nav>{nav}</nav>\n<hr>\n{flashes}\n{content}\n</body>\n</html>\n",
        title = escape(title),
    )
}

// =============================================================================
// Form Widgets
// =============================================================================

fn field_errors(errors: &FormErrors, field: &str) -> String {
    errors
        .get(field)
        .iter()
        .map(|message| format!(r#"<span class="error">[{}]</span>"#, escape(message)))
        .collect()
}

fn text_input(kind: &str, name: &str, label: &str, value: &str, errors: &FormErrors) -> String {
    format!(
        r#"<p><label for="{name}">{label}</label><br><input type="{kind}" id="{name}" name="{name}" value="{value}"> {errors}</p>"#,
        value = escape(value),
        errors = field_errors(errors, name),
    )
}

fn select_input(name: &str, label: &str, choices: &[Choice], selected: i64, errors: &FormErrors) -> String {
    let mut options = String::new();
    for choice in choices {
        let _ = write!(
            options,
            r#"<option value="{value}"{sel}>{label}</option>"#,
            value = choice.value,
            sel = if choice.value == selected { " selected" } else { "" },
            label = escape(&choice.label),
        );
    }
    format!(
        r#"<p><label for="{name}">{label}</label><br><select id="{name}" name="{name}">{options}</select> {errors}</p>"#,
        errors = field_errors(errors, name),
    )
}

fn choice_labels(choices: &[Choice]) -> HashMap<i64, &str> {
    choices
        .iter()
        .map(|c| (c.value, c.label.as_str()))
        .collect()
}

// =============================================================================
// Pages
// =============================================================================

/// Everything the index page shows
pub struct IndexView<'a> {
    pub heading: &'a str,
    pub games: &'a [Game],
    pub search: SearchForm,
    pub choices1: &'a [Choice],
    pub choices2: &'a [Choice],
    /// Ids of the viewer's favorite games
    pub favorites: &'a HashSet<i64>,
}

pub fn index_page(ctx: &PageContext, view: &IndexView<'_>) -> String {
    let labels1 = choice_labels(view.choices1);
    let labels2 = choice_labels(view.choices2);
    let no_errors = FormErrors::default();

    let (selected1, selected2) = view.search.selectors();

    let mut content = String::from("<h1>Search the game base</h1>\n");
    let _ = write!(
        content,
        r#"<form action="/" method="post">{}{}<p><input type="submit" value="Search Game Base"></p></form>"#,
        select_input("category1", "Category 1", view.choices1, selected1, &no_errors),
        select_input("category2", "Category 2", view.choices2, selected2, &no_errors),
    );

    let _ = write!(content, "\n<h2>{}</h2>\n", escape(view.heading));
    if view.games.is_empty() {
        content.push_str("<p>No games found.</p>");
        return layout(ctx, "Home", &content);
    }

    content.push_str(r#"<table class="games"><tr><th>Name</th><th>Category 1</th><th>Category 2</th><th></th></tr>"#);
    for game in view.games {
        let category = |labels: &HashMap<i64, &str>, id: Option<i64>| {
            id.and_then(|id| labels.get(&id).map(|label| escape(label)))
                .unwrap_or_default()
        };

        let action = match (&ctx.user, view.favorites.contains(&game.id)) {
            (None, _) => String::new(),
            (Some(_), true) => format!(r#"<a href="/unfavorite/{}">Unfavorite</a>"#, game.id),
            (Some(_), false) => format!(r#"<a href="/favorite/{}">Favorite</a>"#, game.id),
        };

        let _ = write!(
            content,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&game.name),
            category(&labels1, game.category1_id),
            category(&labels2, game.category2_id),
            action,
        );
    }
    content.push_str("</table>");

    layout(ctx, "Home", &content)
}

pub fn login_page(ctx: &PageContext, form: &LoginForm, errors: &FormErrors, next: Option<&str>) -> String {
    let action = match next {
        Some(next) => crate::session::login_url(next),
        None => "/login".to_string(),
    };

    let content = format!(
        r#"<h1>Sign In</h1>
<form action="{action}" method="post">
{username}
{password}
<p><input type="checkbox" id="remember_me" name="remember_me" value="y"{checked}> <label for="remember_me">Remember Me</label></p>
<p><input type="submit" value="Sign In"></p>
</form>
<p>New User? <a href="/register">Click to Register!</a></p>"#,
        action = escape(&action),
        username = text_input("text", "username", "Username", &form.username, errors),
        password = text_input("password", "password", "Password", "", errors),
        checked = if form.remember() { " checked" } else { "" },
    );
    layout(ctx, "Sign In", &content)
}

pub fn register_page(ctx: &PageContext, form: &RegistrationForm, errors: &FormErrors) -> String {
    let content = format!(
        r#"<h1>Register</h1>
<form action="/register" method="post">
{}
{}
{}
{}
<p><input type="submit" value="Register"></p>
</form>"#,
        text_input("text", "username", "Username", &form.username, errors),
        text_input("text", "email", "Email", &form.email, errors),
        text_input("password", "password", "Password", "", errors),
        text_input("password", "password2", "Repeat Password", "", errors),
    );
    layout(ctx, "Register", &content)
}

pub fn add_game_page(
    ctx: &PageContext,
    form: &GameForm,
    errors: &FormErrors,
    choices1: &[Choice],
    choices2: &[Choice],
) -> String {
    let (selected1, selected2) = form.selectors();
    let content = format!(
        r#"<h1>Add a game</h1>
<form action="/addgame" method="post">
{}
{}
{}
<p><input type="submit" value="Add Game"></p>
</form>"#,
        text_input("text", "name", "Name", &form.name, errors),
        select_input("category1", "Category 1", choices1, selected1, errors),
        select_input("category2", "Category 2", choices2, selected2, errors),
    );
    layout(ctx, "Add Game", &content)
}

pub fn user_page(ctx: &PageContext, profile: &User, avatar: &str, favorites: &[Game]) -> String {
    let mut content = format!(
        r#"<table><tr><td><img src="{avatar}" alt="avatar"></td><td><h1>User: {name}</h1>"#,
        avatar = escape(avatar),
        name = escape(&profile.username),
    );
    if let Some(about) = &profile.about_me {
        let _ = write!(content, "<p>{}</p>", escape(about));
    }
    let is_self = ctx.user.as_ref().map(|u| u.id) == Some(profile.id);
    if is_self {
        content.push_str(r#"<p><a href="/edit_profile">Edit your profile</a></p>"#);
    }
    content.push_str("</td></tr></table>\n<h2>Favorite games</h2>\n");

    if favorites.is_empty() {
        content.push_str("<p>No favorites yet.</p>");
    } else {
        content.push_str("<ul class=\"favorites\">");
        for game in favorites {
            let _ = write!(content, "<li>{}</li>", escape(&game.name));
        }
        content.push_str("</ul>");
    }

    layout(ctx, &profile.username, &content)
}

pub fn edit_profile_page(ctx: &PageContext, form: &EditProfileForm, errors: &FormErrors) -> String {
    let content = format!(
        r#"<h1>Edit Profile</h1>
<form action="/edit_profile" method="post">
{username}
<p><label for="about_me">About me</label><br><textarea id="about_me" name="about_me" rows="4" cols="50">{about}</textarea> {about_errors}</p>
<p><input type="submit" value="Submit"></p>
</form>"#,
        username = text_input("text", "username", "Username", &form.username, errors),
        about = escape(&form.about_me),
        about_errors = field_errors(errors, "about_me"),
    );
    layout(ctx, "Edit Profile", &content)
}

/// One category-creation form and the categories it already holds
pub struct CategorySection<'a> {
    pub taxonomy: Taxonomy,
    pub label: &'a str,
    pub errors: &'a FormErrors,
    pub existing: &'a [Category],
}

pub fn category_page(ctx: &PageContext, sections: &[CategorySection<'_>]) -> String {
    let mut content = String::from("<h1>Categories</h1>\n");
    for section in sections {
        let _ = write!(
            content,
            r#"<h2>{title}</h2>
<form action="/category" method="post">
<input type="hidden" name="taxonomy" value="{value}">
{label}
<p><input type="submit" value="Add to {title}"></p>
</form>
"#,
            title = section.taxonomy.title(),
            value = section.taxonomy.value(),
            label = text_input("text", "label", "Label", section.label, section.errors),
        );

        content.push_str("<ul>");
        for category in section.existing {
            let _ = write!(content, "<li>{}</li>", escape(&category.label));
        }
        content.push_str("</ul>\n");
    }
    layout(ctx, "Categories", &content)
}

/// Standalone error page (no session context available)
pub fn error_page(status: StatusCode, message: &str) -> String {
    let ctx = PageContext::default();
    let content = format!(
        "<h1>{} {}</h1>\n<p>{}</p>\n<p><a href=\"/\">Back</a></p>",
        status.as_u16(),
        escape(status.canonical_reason().unwrap_or("Error")),
        escape(message)
    );
    layout(&ctx, status.canonical_reason().unwrap_or("Error"), &content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> User {
        User {
            id: 1,
            username: name.to_string(),
            email: format!("{}@example.com", name),
            password_hash: String::new(),
            about_me: None,
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<script>alert("x" & 'y')</script>"#),
            "&lt;script&gt;alert(&quot;x&quot; &amp; &#x27;y&#x27;)&lt;/script&gt;"
        );
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_user_url_encodes_segment() {
        assert_eq!(user_url("alice"), "/user/alice");
        assert_eq!(user_url("a/b"), "/user/a%2Fb");
        assert_eq!(user_url("50% off?#"), "/user/50%25%20off%3F%23");
        assert_eq!(user_url("j.doe_2~x-y"), "/user/j.doe_2~x-y");
    }

    #[test]
    fn test_layout_shows_flashes_and_nav() {
        let anonymous = PageContext {
            user: None,
            messages: vec!["<b>hi</b>".to_string()],
        };
        let page = layout(&anonymous, "Home", "");
        assert!(page.contains("&lt;b&gt;hi&lt;/b&gt;"));
        assert!(page.contains(r#"href="/login""#));

        let logged_in = PageContext {
            user: Some(user("alice")),
            messages: vec![],
        };
        let page = layout(&logged_in, "Home", "");
        assert!(page.contains(r#"href="/user/alice""#));
        assert!(page.contains(r#"href="/logout""#));
        assert!(!page.contains("flashes"));
    }

    #[test]
    fn test_index_page_favorite_links() {
        let games = vec![
            Game {
                id: 2,
                name: "Go".to_string(),
                category1_id: Some(5),
                category2_id: None,
            },
            Game {
                id: 1,
                name: "Chess".to_string(),
                category1_id: None,
                category2_id: None,
            },
        ];
        let choices1 = vec![
            Choice {
                value: 0,
                label: "N/A".to_string(),
            },
            Choice {
                value: 5,
                label: "Abstract".to_string(),
            },
        ];
        let favorites: HashSet<i64> = [1].into_iter().collect();
        let ctx = PageContext {
            user: Some(user("alice")),
            messages: vec![],
        };

        let page = index_page(
            &ctx,
            &IndexView {
                heading: "All games",
                games: &games,
                search: SearchForm::default(),
                choices1: &choices1,
                choices2: &[],
                favorites: &favorites,
            },
        );

        assert!(page.contains(r#"href="/favorite/2""#));
        assert!(page.contains(r#"href="/unfavorite/1""#));
        assert!(page.contains("<td>Abstract</td>"));
        assert!(page.find("Go").unwrap() < page.find("Chess").unwrap());
    }

    #[test]
    fn test_forms_never_echo_passwords() {
        let form = RegistrationForm {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "s3cret-value".to_string(),
            password2: "s3cret-value".to_string(),
        };
        let page = register_page(&PageContext::default(), &form, &FormErrors::default());

        assert!(page.contains(r#"value="alice""#));
        assert!(!page.contains("s3cret-value"));
    }

    #[test]
    fn test_field_errors_rendered() {
        let mut errors = FormErrors::default();
        errors.add("name", "A game with that name already exists");

        let page = add_game_page(
            &PageContext::default(),
            &GameForm::default(),
            &errors,
            &[],
            &[],
        );
        assert!(page.contains("[A game with that name already exists]"));
    }

    #[test]
    fn test_error_page() {
        let page = error_page(StatusCode::NOT_FOUND, "User not found");

        assert!(page.contains("404 Not Found"));
        assert!(page.contains("User not found"));
    }
}
