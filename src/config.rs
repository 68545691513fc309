use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub environment: String,
    /// Key used to sign session tokens
    pub secret_key: String,
    /// Lifetime of a session started without "remember me"
    pub session_hours: i64,
    /// Lifetime of a session started with "remember me"
    pub remember_days: i64,
    /// PBKDF2 rounds for newly hashed passwords
    pub password_hash_iterations: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| "Invalid SERVER_PORT")?;

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://data/gamebase.db".to_string());

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let secret_key =
            env::var("SECRET_KEY").map_err(|_| "SECRET_KEY must be set for session signing")?;
        if secret_key.is_empty() {
            return Err("SECRET_KEY must not be empty".to_string());
        }

        let session_hours = env::var("SESSION_HOURS")
            .unwrap_or_else(|_| "12".to_string())
            .parse()
            .map_err(|_| "Invalid SESSION_HOURS")?;

        let remember_days = env::var("REMEMBER_DAYS")
            .unwrap_or_else(|_| "365".to_string())
            .parse()
            .map_err(|_| "Invalid REMEMBER_DAYS")?;

        let password_hash_iterations = env::var("PASSWORD_HASH_ITERATIONS")
            .unwrap_or_else(|_| "600000".to_string())
            .parse()
            .map_err(|_| "Invalid PASSWORD_HASH_ITERATIONS")?;

        Ok(Config {
            server_host,
            server_port,
            database_url,
            environment,
            secret_key,
            session_hours,
            remember_days,
            password_hash_iterations,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
