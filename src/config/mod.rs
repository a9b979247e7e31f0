/// Database configuration and connection management
pub mod database;

/// Reconciliation settings and schedules loaded from config.toml
pub mod settings;
