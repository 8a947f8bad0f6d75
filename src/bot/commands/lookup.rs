//! Resolving Discord callers and command arguments to database rows.
//!
//! Every lookup fails with a domain error so commands can simply use `?` and let the
//! framework's error handler reply to the user.

use crate::{
    bot::BotData,
    core::{shop, student, user},
    entities::{shop_item, student as student_entity, user as user_entity},
    errors::{Error, Result},
};

type Context<'a> = poise::Context<'a, BotData, Error>;

/// Resolves the caller to a teacher or principal.
pub async fn require_caller_staff(ctx: Context<'_>, action: &str) -> Result<user_entity::Model> {
    let discord_id = ctx.author().id.to_string();
    user::require_staff(&ctx.data().database, &discord_id, action).await
}

/// Resolves the caller to their own student profile.
pub async fn caller_student(ctx: Context<'_>) -> Result<student_entity::Model> {
    let discord_id = ctx.author().id.to_string();
    let db = &ctx.data().database;

    if user::get_user_by_discord_id(db, &discord_id)
        .await?
        .is_none()
    {
        return Err(Error::UserNotFound { name: discord_id });
    }

    student::get_student_for_discord_user(db, &discord_id)
        .await?
        .ok_or_else(|| Error::StudentNotFound {
            name: ctx.author().name.clone(),
        })
}

/// Finds an active student by the name given in a command argument.
pub async fn student_named(ctx: Context<'_>, name: &str) -> Result<student_entity::Model> {
    student::get_student_by_name(&ctx.data().database, name.trim())
        .await?
        .ok_or_else(|| Error::StudentNotFound {
            name: name.to_string(),
        })
}

/// Finds an item that is for sale by the name given in a command argument.
pub async fn item_named(ctx: Context<'_>, name: &str) -> Result<shop_item::Model> {
    shop::get_item_by_name(&ctx.data().database, name.trim())
        .await?
        .ok_or_else(|| Error::ShopItemNotFound {
            name: name.to_string(),
        })
}
