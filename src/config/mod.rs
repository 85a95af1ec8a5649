/// Database configuration and connection management
pub mod database;

/// Shop settings loading from config.toml
pub mod shop;

/// Staff allow-list from environment variables
pub mod staff;
