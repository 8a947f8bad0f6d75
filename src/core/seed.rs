//! Seeding users and shop items from `config.toml`.
//!
//! Seeding only ever inserts. Rows that already exist (users by Discord ID, items by name,
//! including soft-deleted items) are left as they are so edits made through the bot survive a
//! restart.

use crate::{
    config::bank::{Config, ShopItemConfig, UserConfig},
    core::{
        shop::create_item,
        user::{Role, create_user, get_user_by_discord_id},
    },
    entities::{ShopItem, shop_item},
    errors::Result,
};
use sea_orm::prelude::*;
use tracing::{debug, info};

/// How many rows a seeding pass inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// Users inserted
    pub users_created: usize,
    /// Shop items inserted
    pub items_created: usize,
}

/// Inserts one configured user unless the Discord ID is already registered.
///
/// Returns whether a row was inserted.
///
/// # Errors
/// Returns `Error::Config` for an unknown role or empty name.
pub async fn seed_user(db: &DatabaseConnection, cfg: &UserConfig) -> Result<bool> {
    let role: Role = cfg.role.parse()?;

    if get_user_by_discord_id(db, &cfg.discord_id).await?.is_some() {
        debug!(discord_id = %cfg.discord_id, "User already registered, skipping");
        return Ok(false);
    }

    create_user(db, cfg.name.clone(), role, Some(cfg.discord_id.clone())).await?;
    info!(name = %cfg.name, %role, "Seeded user");
    Ok(true)
}

/// Inserts one configured shop item unless an item with that name exists.
///
/// Returns whether a row was inserted.
pub async fn seed_item(db: &DatabaseConnection, cfg: &ShopItemConfig) -> Result<bool> {
    let existing = ShopItem::find()
        .filter(shop_item::Column::Name.eq(cfg.name.trim()))
        .one(db)
        .await?;
    if existing.is_some() {
        debug!(name = %cfg.name, "Shop item already exists, skipping");
        return Ok(false);
    }

    create_item(
        db,
        cfg.name.clone(),
        cfg.description.clone(),
        cfg.price,
        cfg.stock,
        cfg.category.clone(),
    )
    .await?;
    info!(name = %cfg.name, price = cfg.price, stock = cfg.stock, "Seeded shop item");
    Ok(true)
}

/// Seeds every configured user and shop item that is not in the database yet.
///
/// # Errors
/// Stops at the first invalid entry. Rows inserted before it are kept.
pub async fn seed_from_config(db: &DatabaseConnection, config: &Config) -> Result<SeedSummary> {
    info!(
        users = config.users.len(),
        shop_items = config.shop_items.len(),
        "Seeding from configuration"
    );

    let mut summary = SeedSummary::default();
    for user in &config.users {
        if seed_user(db, user).await? {
            summary.users_created += 1;
        }
    }
    for item in &config.shop_items {
        if seed_item(db, item).await? {
            summary.items_created += 1;
        }
    }

    info!(
        users_created = summary.users_created,
        items_created = summary.items_created,
        "Seeding complete"
    );
    Ok(summary)
}
