//! Gamebase Server Library
//!
//! This module exports the core types and functions for testing and reuse.

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod forms;
pub mod models;
pub mod routes;
pub mod security;
pub mod session;
pub mod views;

pub use config::Config;
pub use db::{open_database, Db};
pub use error::{AppError, Result};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: Db,
    pub config: Config,
}

impl AppState {
    /// Create a new AppState with the given database and configuration
    pub fn new(pool: Db, config: Config) -> Self {
        Self { pool, config }
    }
}
