//! Submitted HTML forms and their field-level validation.
//!
//! Every form is deserialized with `axum::Form`, trimmed, then checked.
//! Checks that need the database (uniqueness, valid choices) run last and
//! only for fields that passed the local checks.

use serde::Deserialize;
use sqlx::SqlitePool;
use std::collections::BTreeMap;

use crate::constants::*;
use crate::error::Result;
use crate::models::{Category, Game, Taxonomy, User};

/// Validation messages keyed by field name
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<&'static str, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Messages for one field (empty if it passed)
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

// =============================================================================
// Field Checks
// =============================================================================

fn required(errors: &mut FormErrors, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, MSG_REQUIRED);
    }
}

fn max_length(errors: &mut FormErrors, field: &'static str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.add(
            field,
            format!("Field cannot be longer than {} characters.", max),
        );
    }
}

/// Loose email shape check: `local@domain.tld`, no whitespace
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain.contains('.')
        && domain.split('.').all(|part| !part.is_empty())
}

/// Parse a select value; a missing value means "no category"
fn parse_choice(value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() {
        return Some(NO_CATEGORY);
    }
    value.parse().ok()
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

// =============================================================================
// Forms
// =============================================================================

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    /// Checkbox: present (any value) when checked
    pub remember_me: Option<String>,
}

impl LoginForm {
    pub fn validate(&mut self) -> FormErrors {
        trim_in_place(&mut self.username);

        let mut errors = FormErrors::default();
        required(&mut errors, "username", &self.username);
        required(&mut errors, "password", &self.password);
        errors
    }

    pub fn remember(&self) -> bool {
        self.remember_me.is_some()
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
}

impl RegistrationForm {
    pub async fn validate(&mut self, pool: &SqlitePool) -> Result<FormErrors> {
        trim_in_place(&mut self.username);
        trim_in_place(&mut self.email);

        let mut errors = FormErrors::default();

        required(&mut errors, "username", &self.username);
        max_length(&mut errors, "username", &self.username, MAX_USERNAME_LEN);

        required(&mut errors, "email", &self.email);
        if !self.email.is_empty() && !is_valid_email(&self.email) {
            errors.add("email", MSG_INVALID_EMAIL);
        }
        max_length(&mut errors, "email", &self.email, MAX_EMAIL_LEN);

        required(&mut errors, "password", &self.password);
        required(&mut errors, "password2", &self.password2);
        if !self.password2.trim().is_empty() && self.password2 != self.password {
            errors.add("password2", MSG_PASSWORDS_MUST_MATCH);
        }

        if !errors.has("username")
            && User::find_by_username(pool, &self.username).await?.is_some()
        {
            errors.add("username", MSG_DUPLICATE_USERNAME);
        }
        if !errors.has("email") && User::find_by_email(pool, &self.email).await?.is_some() {
            errors.add("email", MSG_DUPLICATE_EMAIL);
        }

        Ok(errors)
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct EditProfileForm {
    pub username: String,
    pub about_me: String,
}

impl EditProfileForm {
    /// Validate against the editing user's current username, which is
    /// always allowed to be kept
    pub async fn validate(
        &mut self,
        pool: &SqlitePool,
        original_username: &str,
    ) -> Result<FormErrors> {
        trim_in_place(&mut self.username);

        let mut errors = FormErrors::default();

        required(&mut errors, "username", &self.username);
        max_length(&mut errors, "username", &self.username, MAX_USERNAME_LEN);
        max_length(&mut errors, "about_me", &self.about_me, MAX_ABOUT_ME_LEN);

        if !errors.has("username")
            && self.username != original_username
            && User::find_by_username(pool, &self.username).await?.is_some()
        {
            errors.add("username", MSG_DUPLICATE_USERNAME);
        }

        Ok(errors)
    }

    /// About-me text to store; blank becomes NULL
    pub fn about_me(&self) -> Option<&str> {
        let about = self.about_me.trim();
        (!about.is_empty()).then_some(about)
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GameForm {
    pub name: String,
    /// Raw select values; parsed during validation
    pub category1: String,
    pub category2: String,
}

impl GameForm {
    pub async fn validate(&mut self, pool: &SqlitePool) -> Result<FormErrors> {
        trim_in_place(&mut self.name);

        let mut errors = FormErrors::default();

        required(&mut errors, "name", &self.name);
        max_length(&mut errors, "name", &self.name, MAX_GAME_NAME_LEN);

        for (field, taxonomy, value) in [
            ("category1", Taxonomy::First, &self.category1),
            ("category2", Taxonomy::Second, &self.category2),
        ] {
            let valid = match parse_choice(value) {
                Some(NO_CATEGORY) => true,
                Some(id) => Category::exists(pool, taxonomy, id).await?,
                None => false,
            };
            if !valid {
                errors.add(field, MSG_INVALID_CHOICE);
            }
        }

        if !errors.has("name") && Game::find_by_name(pool, &self.name).await?.is_some() {
            errors.add("name", MSG_DUPLICATE_GAME);
        }

        Ok(errors)
    }

    /// Selected category ids; anything unparseable counts as unselected
    pub fn selectors(&self) -> (i64, i64) {
        (
            parse_choice(&self.category1).unwrap_or(NO_CATEGORY),
            parse_choice(&self.category2).unwrap_or(NO_CATEGORY),
        )
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct SearchForm {
    pub category1: String,
    pub category2: String,
}

impl SearchForm {
    /// Selected category ids; anything unparseable counts as unselected
    pub fn selectors(&self) -> (i64, i64) {
        (
            parse_choice(&self.category1).unwrap_or(NO_CATEGORY),
            parse_choice(&self.category2).unwrap_or(NO_CATEGORY),
        )
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct CategoryForm {
    /// Raw taxonomy value, see [`CategoryForm::taxonomy`]
    pub taxonomy: String,
    pub label: String,
}

impl CategoryForm {
    /// The taxonomy this form posts to, if it names a known one
    pub fn taxonomy(&self) -> Option<Taxonomy> {
        self.taxonomy.trim().parse().ok().and_then(Taxonomy::from_value)
    }

    pub async fn validate(&mut self, pool: &SqlitePool, taxonomy: Taxonomy) -> Result<FormErrors> {
        trim_in_place(&mut self.label);

        let mut errors = FormErrors::default();

        required(&mut errors, "label", &self.label);
        max_length(&mut errors, "label", &self.label, MAX_CATEGORY_LABEL_LEN);

        if !errors.has("label")
            && Category::find_by_label(pool, taxonomy, &self.label)
                .await?
                .is_some()
        {
            errors.add("label", MSG_DUPLICATE_CATEGORY);
        }

        Ok(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_test_database;
    use crate::models::{NewGame, NewUser};

    async fn seed_user(pool: &SqlitePool, username: &str, email: &str) {
        User::create(
            pool,
            &NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash: "unused".to_string(),
            },
        )
        .await
        .unwrap();
    }

    fn registration(username: &str, email: &str, password: &str, password2: &str) -> RegistrationForm {
        RegistrationForm {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            password2: password2.to_string(),
        }
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email("a.b+c@mail.example.org"));

        assert!(!is_valid_email(""));
        assert!(!is_valid_email("alice"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("alice@"));
        assert!(!is_valid_email("alice@localhost"));
        assert!(!is_valid_email("alice@example..com"));
        assert!(!is_valid_email("alice@@example.com"));
        assert!(!is_valid_email("al ice@example.com"));
    }

    #[test]
    fn test_login_form_required_fields() {
        let mut form = LoginForm {
            username: "   ".to_string(),
            password: String::new(),
            remember_me: None,
        };

        let errors = form.validate();
        assert_eq!(errors.get("username"), [MSG_REQUIRED]);
        assert_eq!(errors.get("password"), [MSG_REQUIRED]);
        assert!(!form.remember());
    }

    #[tokio::test]
    async fn test_registration_valid() {
        let (_dir, pool) = open_test_database().await;

        let mut form = registration(" alice ", "alice@example.com", "pw", "pw");
        let errors = form.validate(&pool).await.unwrap();

        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(form.username, "alice");
    }

    #[tokio::test]
    async fn test_registration_duplicates() {
        let (_dir, pool) = open_test_database().await;
        seed_user(&pool, "alice", "alice@example.com").await;

        let mut form = registration("alice", "alice@example.com", "pw", "pw");
        let errors = form.validate(&pool).await.unwrap();

        assert_eq!(errors.get("username"), [MSG_DUPLICATE_USERNAME]);
        assert_eq!(errors.get("email"), [MSG_DUPLICATE_EMAIL]);
    }

    #[tokio::test]
    async fn test_registration_mismatch_and_bad_email() {
        let (_dir, pool) = open_test_database().await;

        let mut form = registration("bob", "not-an-email", "pw", "wp");
        let errors = form.validate(&pool).await.unwrap();

        assert_eq!(errors.get("email"), [MSG_INVALID_EMAIL]);
        assert_eq!(errors.get("password2"), [MSG_PASSWORDS_MUST_MATCH]);
        assert!(!errors.has("username"));
    }

    #[tokio::test]
    async fn test_edit_profile_keeps_own_username() {
        let (_dir, pool) = open_test_database().await;
        seed_user(&pool, "alice", "alice@example.com").await;
        seed_user(&pool, "bob", "bob@example.com").await;

        let mut own = EditProfileForm {
            username: "alice".to_string(),
            about_me: "hi".to_string(),
        };
        assert!(own.validate(&pool, "alice").await.unwrap().is_empty());

        let mut taken = EditProfileForm {
            username: "bob".to_string(),
            about_me: String::new(),
        };
        let errors = taken.validate(&pool, "alice").await.unwrap();
        assert_eq!(errors.get("username"), [MSG_DUPLICATE_USERNAME]);
        assert_eq!(taken.about_me(), None);
    }

    #[tokio::test]
    async fn test_edit_profile_about_me_length() {
        let (_dir, pool) = open_test_database().await;

        let mut form = EditProfileForm {
            username: "alice".to_string(),
            about_me: "x".repeat(MAX_ABOUT_ME_LEN + 1),
        };
        let errors = form.validate(&pool, "alice").await.unwrap();

        assert!(errors.has("about_me"));
        assert!(!errors.has("username"));
    }

    #[tokio::test]
    async fn test_game_form_duplicate_and_choices() {
        let (_dir, pool) = open_test_database().await;
        let strategy = Category::create(&pool, Taxonomy::First, "Strategy").await.unwrap();
        Game::create(&pool, &NewGame::from_selectors("Chess".to_string(), 0, 0))
            .await
            .unwrap();

        let mut duplicate = GameForm {
            name: "Chess".to_string(),
            category1: strategy.id.to_string(),
            category2: "0".to_string(),
        };
        let errors = duplicate.validate(&pool).await.unwrap();
        assert_eq!(errors.get("name"), [MSG_DUPLICATE_GAME]);
        assert!(!errors.has("category1"));

        let mut bad_choice = GameForm {
            name: "Go".to_string(),
            category1: String::new(),
            category2: "42".to_string(),
        };
        let errors = bad_choice.validate(&pool).await.unwrap();
        assert_eq!(errors.get("category2"), [MSG_INVALID_CHOICE]);
        assert!(!errors.has("category1"));
        assert!(!errors.has("name"));

        let mut garbage = GameForm {
            name: "Go".to_string(),
            category1: "abc".to_string(),
            category2: "0".to_string(),
        };
        let errors = garbage.validate(&pool).await.unwrap();
        assert_eq!(errors.get("category1"), [MSG_INVALID_CHOICE]);
        assert_eq!(garbage.selectors(), (NO_CATEGORY, NO_CATEGORY));
    }

    #[test]
    fn test_search_form_selectors() {
        let form = SearchForm {
            category1: " 3 ".to_string(),
            category2: "x".to_string(),
        };
        assert_eq!(form.selectors(), (3, NO_CATEGORY));
        assert_eq!(SearchForm::default().selectors(), (NO_CATEGORY, NO_CATEGORY));
    }

    #[test]
    fn test_category_form_taxonomy() {
        let form = |taxonomy: &str| CategoryForm {
            taxonomy: taxonomy.to_string(),
            label: String::new(),
        };
        assert_eq!(form("1").taxonomy(), Some(Taxonomy::First));
        assert_eq!(form("2").taxonomy(), Some(Taxonomy::Second));
        assert_eq!(form("3").taxonomy(), None);
        assert_eq!(form("two").taxonomy(), None);
    }

    #[tokio::test]
    async fn test_category_form_unique_per_taxonomy() {
        let (_dir, pool) = open_test_database().await;
        Category::create(&pool, Taxonomy::First, "Strategy").await.unwrap();

        let mut form = CategoryForm {
            taxonomy: "1".to_string(),
            label: "Strategy".to_string(),
        };
        let errors = form.validate(&pool, Taxonomy::First).await.unwrap();
        assert_eq!(errors.get("label"), [MSG_DUPLICATE_CATEGORY]);

        let errors = form.validate(&pool, Taxonomy::Second).await.unwrap();
        assert!(errors.is_empty());
    }
}
