//! Unified error type for PointBank.
//!
//! Core functions return [`Result`] with one of these variants; the bot layer formats them for
//! the user and logs the rest.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Integer conversion error: {0}")]
    IntConversion(#[from] std::num::TryFromIntError),

    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: i64 },

    #[error("Student not found: {name}")]
    StudentNotFound { name: String },

    #[error("User not found: {name}")]
    UserNotFound { name: String },

    #[error("Shop item not found: {name}")]
    ShopItemNotFound { name: String },

    #[error("Savings account not found for student {student_id}")]
    SavingsAccountNotFound { student_id: i64 },

    #[error("Insufficient points: have {current}, need {required}")]
    InsufficientPoints { current: i64, required: i64 },

    #[error("Insufficient savings: have {current}, need {required}")]
    InsufficientSavings { current: i64, required: i64 },

    #[error("'{name}' is out of stock ({stock} left, {requested} requested)")]
    OutOfStock {
        name: String,
        stock: i32,
        requested: i32,
    },

    #[error("Permission denied: {role} cannot {action}")]
    PermissionDenied { role: String, action: String },

    #[error("Discord framework error: {0}")]
    Discord(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Discord(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
