//! Signed session cookies, the logged-in user extractors and flash messages.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::constants::{FLASH_COOKIE, MSG_LOGIN_REQUIRED, SESSION_COOKIE};
use crate::error::{AppError, Result};
use crate::models::User;
use crate::security::{sign, verify_hmac};
use crate::{AppState, Config};

// =============================================================================
// Session Token
// =============================================================================

/// Payload of the session cookie: `<user_id>.<expires_at>.<hex hmac>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionToken {
    pub user_id: i64,
    /// Unix timestamp after which the token is rejected
    pub expires_at: i64,
}

impl SessionToken {
    pub fn new(user_id: i64, now: i64, lifetime_secs: i64) -> Self {
        Self {
            user_id,
            expires_at: now.saturating_add(lifetime_secs),
        }
    }

    pub fn encode(&self, secret: &str) -> String {
        let payload = format!("{}.{}", self.user_id, self.expires_at);
        let signature = sign(&payload, secret);
        format!("{}.{}", payload, signature)
    }

    /// Parse and verify a token; any defect yields `None`
    pub fn decode(token: &str, secret: &str, now: i64) -> Option<Self> {
        let (payload, signature) = token.rsplit_once('.')?;
        if !verify_hmac(payload, signature, secret) {
            tracing::warn!("Rejected session token with bad signature");
            return None;
        }

        let (user_id, expires_at) = payload.split_once('.')?;
        let token = SessionToken {
            user_id: user_id.parse().ok()?,
            expires_at: expires_at.parse().ok()?,
        };

        if now >= token.expires_at {
            tracing::debug!("Session for user {} expired", token.user_id);
            return None;
        }

        Some(token)
    }
}

/// Session cookie for a freshly logged-in user
///
/// With `remember` the cookie persists for `remember_days`; otherwise it
/// lives until the browser closes and the token itself expires after
/// `session_hours`.
pub fn session_cookie(config: &Config, user_id: i64, remember: bool) -> Cookie<'static> {
    let now = chrono::Utc::now().timestamp();
    let lifetime_secs = if remember {
        config.remember_days.saturating_mul(86_400)
    } else {
        config.session_hours.saturating_mul(3_600)
    };
    let token = SessionToken::new(user_id, now, lifetime_secs).encode(&config.secret_key);

    let builder = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    if remember {
        builder
            .max_age(time::Duration::seconds(lifetime_secs))
            .build()
    } else {
        builder.build()
    }
}

/// Drop the session cookie
pub fn clear_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// Resolve the session cookie to a user, if it names a live one
async fn session_user(jar: &CookieJar, state: &AppState) -> Result<Option<User>> {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Ok(None);
    };

    let now = chrono::Utc::now().timestamp();
    let Some(token) = SessionToken::decode(cookie.value(), &state.config.secret_key, now) else {
        return Ok(None);
    };

    User::find_by_id(&state.pool, token.user_id).await
}

// =============================================================================
// Extractors
// =============================================================================

/// The logged-in user; anonymous requests are redirected to the login page
/// with the original path as `next`
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        match session_user(&jar, state).await {
            Ok(Some(user)) => Ok(CurrentUser(user)),
            Ok(None) => {
                let target = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/");
                tracing::debug!("Anonymous request for {}, redirecting to login", target);

                let jar = flash(jar, MSG_LOGIN_REQUIRED);
                Err((jar, Redirect::to(&login_url(target))).into_response())
            }
            Err(e) => Err(e.into_response()),
        }
    }
}

/// The logged-in user, or `None` for anonymous requests
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        Ok(MaybeUser(session_user(&jar, state).await?))
    }
}

/// `/login?next=<target>`, percent-encoded
pub fn login_url(target: &str) -> String {
    match serde_urlencoded::to_string([("next", target)]) {
        Ok(query) => format!("/login?{}", query),
        Err(_) => "/login".to_string(),
    }
}

// =============================================================================
// Flash Messages
// =============================================================================

/// Queue a message for the next rendered page
pub fn flash(jar: CookieJar, message: impl Into<String>) -> CookieJar {
    let mut messages = read_flashes(&jar);
    messages.push(message.into());

    let value = match serde_json::to_vec(&messages) {
        Ok(bytes) => hex::encode(bytes),
        Err(e) => {
            tracing::error!("Failed to encode flash messages: {}", e);
            return jar;
        }
    };

    jar.add(
        Cookie::build((FLASH_COOKIE, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}

/// Take all pending messages, clearing the flash cookie
pub fn take_flashes(jar: CookieJar) -> (CookieJar, Vec<String>) {
    let messages = read_flashes(&jar);
    if jar.get(FLASH_COOKIE).is_none() {
        return (jar, messages);
    }
    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), messages)
}

fn read_flashes(jar: &CookieJar) -> Vec<String> {
    jar.get(FLASH_COOKIE)
        .and_then(|cookie| hex::decode(cookie.value()).ok())
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key";
    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_token_roundtrip() {
        let token = SessionToken::new(42, NOW, 3600);
        let encoded = token.encode(SECRET);

        assert_eq!(SessionToken::decode(&encoded, SECRET, NOW), Some(token));
        assert_eq!(SessionToken::decode(&encoded, SECRET, NOW + 3599), Some(token));
    }

    #[test]
    fn test_token_expired() {
        let encoded = SessionToken::new(42, NOW, 3600).encode(SECRET);

        assert_eq!(SessionToken::decode(&encoded, SECRET, NOW + 3600), None);
    }

    #[test]
    fn test_token_tampered() {
        let encoded = SessionToken::new(42, NOW, 3600).encode(SECRET);
        let forged = encoded.replacen("42.", "1.", 1);

        assert_eq!(SessionToken::decode(&forged, SECRET, NOW), None);
        assert_eq!(SessionToken::decode(&encoded, "other-secret", NOW), None);
        assert_eq!(SessionToken::decode("garbage", SECRET, NOW), None);
        assert_eq!(SessionToken::decode("", SECRET, NOW), None);
    }

    #[test]
    fn test_token_signed_garbage_payload() {
        let payload = "abc.def";
        let token = format!("{}.{}", payload, sign(payload, SECRET));

        assert_eq!(SessionToken::decode(&token, SECRET, NOW), None);
    }

    fn config(session_hours: i64, remember_days: i64) -> Config {
        Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            database_url: String::new(),
            environment: "test".to_string(),
            secret_key: SECRET.to_string(),
            session_hours,
            remember_days,
            password_hash_iterations: 1000,
        }
    }

    #[test]
    fn test_session_cookie_lifetimes() {
        let remembered = session_cookie(&config(12, 30), 7, true);
        assert_eq!(remembered.max_age(), Some(time::Duration::days(30)));
        assert!(remembered.http_only().unwrap_or(false));

        let transient = session_cookie(&config(12, 30), 7, false);
        assert_eq!(transient.max_age(), None);
    }

    #[test]
    fn test_session_cookie_huge_lifetimes_saturate() {
        let remembered = session_cookie(&config(i64::MAX, i64::MAX), 7, true);
        assert_eq!(remembered.max_age(), Some(time::Duration::seconds(i64::MAX)));

        let transient = session_cookie(&config(i64::MAX, i64::MAX), 7, false);
        let token = SessionToken::decode(transient.value(), SECRET, NOW).unwrap();
        assert_eq!(token.user_id, 7);
        assert_eq!(token.expires_at, i64::MAX);
    }

    #[test]
    fn test_login_url_encodes_target() {
        assert_eq!(login_url("/user/alice"), "/login?next=%2Fuser%2Falice");
        assert_eq!(
            login_url("/favorite/3?x=1&y=2"),
            "/login?next=%2Ffavorite%2F3%3Fx%3D1%26y%3D2"
        );
    }

    #[test]
    fn test_flash_accumulates_and_clears() {
        let jar = CookieJar::new();
        let jar = flash(jar, "first");
        let jar = flash(jar, "second; with = odd, chars");

        let (jar, messages) = take_flashes(jar);
        assert_eq!(messages, vec!["first", "second; with = odd, chars"]);

        let (_jar, messages) = take_flashes(jar);
        assert!(messages.is_empty());
    }
}
