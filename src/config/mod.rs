/// Database configuration and connection management
pub mod database;

/// Game configuration loading from config.toml
pub mod game;

/// Administrator identity from environment variables
pub mod admin;
