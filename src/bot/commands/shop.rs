//! Shop commands - buying, adding and restocking items.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, commands::lookup, handlers::autocomplete},
        core::shop,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    /// Buys an item from the class shop with your points.
    #[poise::command(slash_command)]
    pub async fn buy(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Item to buy"]
        #[autocomplete = "autocomplete::autocomplete_item_name"]
        item: String,
        #[description = "How many (defaults to 1)"] quantity: Option<i32>,
    ) -> Result<()> {
        let student = lookup::caller_student(ctx).await?;
        let item = lookup::item_named(ctx, &item).await?;
        let quantity = quantity.unwrap_or(1);

        let purchase =
            shop::purchase_item(&ctx.data().database, student.id, item.id, quantity).await?;

        let embed = serenity::CreateEmbed::default()
            .title(format!("Bought: {}", purchase.item.name))
            .color(0x0058_65F2)
            .field(
                "Cost",
                format!(
                    "{} × {} = {} points",
                    purchase.item.price, purchase.quantity, purchase.total_cost
                ),
                true,
            )
            .field("Balance", purchase.entry.balance_after.to_string(), true)
            .field("Left in stock", purchase.item.stock.to_string(), true);

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Adds a new item to the shop. Teachers and principals only.
    #[poise::command(slash_command)]
    pub async fn shop_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Unique item name"] name: String,
        #[description = "Price in points"] price: i64,
        #[description = "Units available"] stock: i32,
        #[description = "Category (defaults to general)"] category: Option<String>,
        #[description = "Short description"] description: Option<String>,
    ) -> Result<()> {
        lookup::require_caller_staff(ctx, "manage the shop").await?;
        let db = &ctx.data().database;

        if shop::get_item_by_name(db, name.trim()).await?.is_some() {
            ctx.say(format!(
                "⚠️ An item named '{name}' already exists. Use `/shop_restock` to add stock."
            ))
            .await?;
            return Ok(());
        }

        let category = category.unwrap_or_else(|| "general".to_string());
        let item = shop::create_item(db, name, description, price, stock, category).await?;

        ctx.say(format!(
            "✅ Added **{}** to the shop ({}) for **{}** points, {} in stock.",
            item.name, item.category, item.price, item.stock
        ))
        .await?;
        Ok(())
    }

    /// Adds stock to an existing item. Teachers and principals only.
    #[poise::command(slash_command)]
    pub async fn shop_restock(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Item to restock"]
        #[autocomplete = "autocomplete::autocomplete_item_name"]
        item: String,
        #[description = "Units to add"] quantity: i32,
    ) -> Result<()> {
        lookup::require_caller_staff(ctx, "manage the shop").await?;
        let item = lookup::item_named(ctx, &item).await?;

        let item = shop::restock_item(&ctx.data().database, item.id, quantity).await?;

        ctx.say(format!(
            "✅ **{}** restocked. Now {} in stock.",
            item.name, item.stock
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
