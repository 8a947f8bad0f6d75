//! General Discord commands - ping and help.
//! These commands don't touch the database.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**PointBank Help**\n\
        Earn points, save them for weekly interest, and spend them in the class shop.\n\n\
        **Student Commands**\n\
        • `/points` - Shows your points, savings and level.\n\
        • `/history [limit]` - Shows your recent point activity.\n\
        • `/deposit <amount>` - Moves points into your savings account.\n\
        • `/withdraw <amount>` - Moves points out of your savings account.\n\
        • `/buy <item> [quantity]` - Buys an item from the shop.\n\n\
        **Teacher Commands**\n\
        • `/register_student <name> <class> [discord_user]` - Registers a student.\n\
        • `/award <student> <amount> [reason]` - Awards points.\n\
        • `/deduct <student> <amount> [reason]` - Deducts points.\n\
        • `/points [student]` / `/history [student]` - Looks at any student.\n\
        • `/interest` - Pays this week's savings interest.\n\
        • `/shop_add <name> <price> <stock> [category] [description]` - Adds a shop item.\n\
        • `/shop_restock <item> <quantity>` - Adds stock to an item.\n\n\
        **Utility Commands**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
