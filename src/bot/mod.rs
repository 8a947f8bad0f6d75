//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for PointBank, including all slash commands,
//! autocomplete handlers, error reporting, and bot context management.

/// Discord command implementations (general, student, points, savings, shop)
pub mod commands;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;

use crate::errors::{Error, Result};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use tracing::{error, info, instrument, warn};

/// Shared data available to all bot commands.
/// This structure holds the database connection and the bank-wide settings
/// that commands need to access.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Interest rate given to newly registered students, in basis points
    pub default_rate_bps: i32,
}

impl BotData {
    /// Creates a new `BotData` instance.
    #[must_use]
    pub const fn new(database: DatabaseConnection, default_rate_bps: i32) -> Self {
        Self {
            database,
            default_rate_bps,
        }
    }
}

/// Short message shown to the Discord user for a failed command.
///
/// Domain errors are explained; infrastructure errors get a generic apology and are only logged.
#[must_use]
pub fn user_message(error: &Error) -> String {
    match error {
        Error::InvalidAmount { .. }
        | Error::StudentNotFound { .. }
        | Error::ShopItemNotFound { .. }
        | Error::SavingsAccountNotFound { .. }
        | Error::InsufficientPoints { .. }
        | Error::InsufficientSavings { .. }
        | Error::OutOfStock { .. }
        | Error::PermissionDenied { .. }
        | Error::Config { .. } => format!("❌ {error}"),
        Error::UserNotFound { .. } => {
            "❌ You are not registered with PointBank. Ask a teacher to register you.".to_string()
        }
        Error::Database(_)
        | Error::Io(_)
        | Error::EnvVar(_)
        | Error::IntConversion(_)
        | Error::Discord(_) => "❌ Something went wrong. Please try again later.".to_string(),
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            match &error {
                Error::Database(_) | Error::Io(_) | Error::Discord(_) => {
                    error!("Error in command `{}`: {:?}", ctx.command().name, error);
                }
                _ => warn!("Command `{}` rejected: {}", ctx.command().name, error),
            }
            if let Err(e) = ctx.say(user_message(&error)).await {
                error!("Failed to send error message: {}", e);
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

/// Every command the bot registers.
#[must_use]
pub fn all_commands() -> Vec<poise::Command<BotData, Error>> {
    vec![
        commands::ping(),
        commands::help(),
        commands::register_student(),
        commands::award(),
        commands::deduct(),
        commands::points(),
        commands::history(),
        commands::deposit(),
        commands::withdraw(),
        commands::interest(),
        commands::buy(),
        commands::shop_add(),
        commands::shop_restock(),
    ]
}

/// Builds the poise framework and runs the Discord client until it stops.
///
/// # Errors
/// Returns an error if the client cannot be created or the gateway connection fails.
#[instrument(skip(token, data))]
pub async fn run_bot(token: &str, data: BotData) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: all_commands(),
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::Client::builder(token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {:?}", e))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {:?}", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_explains_domain_errors() {
        let msg = user_message(&Error::InsufficientPoints {
            current: 10,
            required: 50,
        });
        assert_eq!(msg, "❌ Insufficient points: have 10, need 50");

        let msg = user_message(&Error::OutOfStock {
            name: "Pencil".to_string(),
            stock: 0,
            requested: 1,
        });
        assert!(msg.contains("Pencil"));
    }

    #[test]
    fn test_user_message_hides_infrastructure_errors() {
        let msg = user_message(&Error::Database(sea_orm::DbErr::Custom(
            "disk I/O error".to_string(),
        )));
        assert!(!msg.contains("disk"));
    }

    #[test]
    fn test_all_commands_have_unique_names() {
        let commands = all_commands();
        let mut names: Vec<_> = commands.iter().map(|c| c.name.clone()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), commands.len());
        assert!(names.iter().any(|n| n == "buy"));
    }
}
