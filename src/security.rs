use hmac::{Hmac, Mac};
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use sha2::{Digest, Sha256};

use crate::constants::PASSWORD_SALT_LEN;

type HmacSha256 = Hmac<Sha256>;

/// Prefix of every password hash produced by [`hash_password`]
const PASSWORD_HASH_METHOD: &str = "pbkdf2:sha256";

// =============================================================================
// Password Hashing
// =============================================================================

/// Hash a password with PBKDF2-HMAC-SHA256 and a fresh random salt
///
/// The result is self-describing:
/// `pbkdf2:sha256:<iterations>$<salt>$<hex digest>`
pub fn hash_password(password: &str, iterations: u32) -> String {
    let salt = generate_salt(PASSWORD_SALT_LEN);
    let digest = pbkdf2_hex(password, &salt, iterations);
    format!(
        "{}:{}${}${}",
        PASSWORD_HASH_METHOD, iterations, salt, digest
    )
}

/// Check a password against a hash produced by [`hash_password`]
///
/// The iteration count is read from the stored hash. Malformed hashes never
/// verify.
pub fn verify_password(stored_hash: &str, password: &str) -> bool {
    let Some((method, rest)) = stored_hash.split_once('$') else {
        tracing::warn!("Password hash is missing its method section");
        return false;
    };
    let Some((salt, expected)) = rest.split_once('$') else {
        tracing::warn!("Password hash is missing its salt section");
        return false;
    };

    let iterations = match method
        .strip_prefix(PASSWORD_HASH_METHOD)
        .and_then(|s| s.strip_prefix(':'))
        .and_then(|s| s.parse::<u32>().ok())
    {
        Some(n) if n > 0 => n,
        _ => {
            tracing::warn!("Unsupported password hash method: {}", method);
            return false;
        }
    };

    let actual = pbkdf2_hex(password, salt, iterations);
    constant_time_eq(actual.as_bytes(), expected.as_bytes())
}

/// Check a password for a login naming no account
///
/// Runs one PBKDF2 derivation at the configured cost so the response takes
/// as long as a real check. Always fails.
pub fn verify_unknown_account(password: &str, iterations: u32) -> bool {
    let salt = generate_salt(PASSWORD_SALT_LEN);
    let _ = pbkdf2_hex(password, &salt, iterations.max(1));
    false
}

fn pbkdf2_hex(password: &str, salt: &str, iterations: u32) -> String {
    let mut out = [0u8; 32];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut out);
    hex::encode(out)
}

fn generate_salt(len: usize) -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

// =============================================================================
// Signing
// =============================================================================

/// Sign data with HMAC-SHA256, returning the hex-encoded tag
pub fn sign(data: &str, secret: &str) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            // An empty tag never verifies
            tracing::error!("Failed to create HMAC instance");
            return String::new();
        }
    };
    mac.update(data.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify HMAC-SHA256 signature
///
/// # Arguments
/// * `data` - The data that was signed
/// * `signature` - The hex-encoded HMAC signature
/// * `secret` - The shared secret key (from environment)
pub fn verify_hmac(data: &str, signature: &str, secret: &str) -> bool {
    // Create HMAC instance with secret key
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            tracing::error!("Failed to create HMAC instance");
            return false;
        }
    };

    mac.update(data.as_bytes());

    let sig_bytes = match hex::decode(signature) {
        Ok(bytes) => bytes,
        Err(_) => {
            tracing::warn!("Invalid hex signature format");
            return false;
        }
    };

    mac.verify_slice(&sig_bytes).is_ok()
}

// =============================================================================
// Misc
// =============================================================================

/// Gravatar URL for an email address (SHA-256 addressing, identicon fallback)
pub fn gravatar_url(email: &str, size: u32) -> String {
    let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
    format!(
        "https://www.gravatar.com/avatar/{}?d=identicon&s={}",
        hex::encode(digest),
        size
    )
}

/// Whether a post-login redirect target stays on this site
///
/// Only absolute paths are accepted; anything carrying a scheme or host
/// (including protocol-relative `//host` and `/\host`) is rejected.
pub fn is_safe_redirect(target: &str) -> bool {
    target.starts_with('/')
        && !target.starts_with("//")
        && !target.starts_with("/\\")
        && !target.chars().any(|c| c.is_control())
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Password Tests
    // =========================================================================

    #[test]
    fn test_hash_password_format() {
        let hash = hash_password("hunter2", 1000);

        let (method, rest) = hash.split_once('$').unwrap();
        assert_eq!(method, "pbkdf2:sha256:1000");

        let (salt, digest) = rest.split_once('$').unwrap();
        assert_eq!(salt.len(), PASSWORD_SALT_LEN);
        assert!(salt.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_password_salted() {
        let first = hash_password("same-password", 1000);
        let second = hash_password("same-password", 1000);

        // Same password, different salt
        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_password_roundtrip() {
        let hash = hash_password("correct horse", 1000);

        assert!(verify_password(&hash, "correct horse"));
        assert!(!verify_password(&hash, "correct horse "));
        assert!(!verify_password(&hash, ""));
    }

    #[test]
    fn test_verify_unknown_account_never_matches() {
        assert!(!verify_unknown_account("pw", 1000));
        assert!(!verify_unknown_account("", 0));
    }

    #[test]
    fn test_verify_password_uses_stored_iterations() {
        let hash = hash_password("pw", 1200);
        let tampered = hash.replacen("1200", "1201", 1);

        assert!(verify_password(&hash, "pw"));
        assert!(!verify_password(&tampered, "pw"));
    }

    #[test]
    fn test_verify_password_malformed() {
        assert!(!verify_password("", "pw"));
        assert!(!verify_password("plaintext", "pw"));
        assert!(!verify_password("md5$salt$abc", "pw"));
        assert!(!verify_password("pbkdf2:sha256:0$salt$abc", "pw"));
        assert!(!verify_password("pbkdf2:sha256:many$salt$abc", "pw"));
    }

    // =========================================================================
    // HMAC Tests
    // =========================================================================

    #[test]
    fn test_sign_then_verify() {
        let signature = sign("7.1700000000", "test-secret-key");

        assert_eq!(signature.len(), 64);
        assert!(verify_hmac("7.1700000000", &signature, "test-secret-key"));
    }

    #[test]
    fn test_verify_hmac_wrong_secret() {
        let signature = sign("test data", "test-secret-key");

        assert!(!verify_hmac("test data", &signature, "wrong-secret"));
    }

    #[test]
    fn test_verify_hmac_invalid_signature() {
        assert!(!verify_hmac("test data", &"0".repeat(64), "test-secret-key"));
        assert!(!verify_hmac("test data", "not-hex", "test-secret-key"));
    }

    // =========================================================================
    // Misc Tests
    // =========================================================================

    #[test]
    fn test_gravatar_url_normalizes_email() {
        let a = gravatar_url("  Someone@Example.com ", 128);
        let b = gravatar_url("someone@example.com", 128);

        assert_eq!(a, b);
        assert!(a.starts_with("https://www.gravatar.com/avatar/"));
        assert!(a.ends_with("?d=identicon&s=128"));
    }

    #[test]
    fn test_is_safe_redirect() {
        assert!(is_safe_redirect("/"));
        assert!(is_safe_redirect("/user/alice"));
        assert!(is_safe_redirect("/edit_profile?tab=1"));

        assert!(!is_safe_redirect(""));
        assert!(!is_safe_redirect("user/alice"));
        assert!(!is_safe_redirect("//evil.example.com"));
        assert!(!is_safe_redirect("/\\evil.example.com"));
        assert!(!is_safe_redirect("https://evil.example.com/"));
        assert!(!is_safe_redirect("/\nSet-Cookie"));
    }
}
