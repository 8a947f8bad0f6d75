/// Bank settings, seed users and shop items loaded from config.toml
pub mod bank;

/// Database configuration and connection management
pub mod database;

/// Bootstrap identities configured through environment variables
pub mod users;
