use point_bank::{
    bot::{self, BotData},
    config::{bank, database, users},
    core::seed,
    errors::{Error, Result},
};
use dotenvy::dotenv;
use std::env;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load config.toml
    let config = bank::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    let default_rate_bps = config.bank.interest_rate_bps()?;
    info!(
        default_rate_bps,
        users = config.users.len(),
        shop_items = config.shop_items.len(),
        "Configuration loaded"
    );

    // 4. Connect and create tables
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database schema ready."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed configured users and shop items, plus the bootstrap principal
    seed::seed_from_config(&db, &config)
        .await
        .inspect_err(|e| error!("Failed to seed from configuration: {}", e))?;
    if let Some(principal) = users::get_bootstrap_principal() {
        seed::seed_user(&db, &principal).await?;
    }

    // 6. Run the bot
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {}", e))
        .map_err(Error::EnvVar)?;

    bot::run_bot(&token, BotData::new(db, default_rate_bps)).await
}
