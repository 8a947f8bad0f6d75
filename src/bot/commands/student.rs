//! Student registration command.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, commands::lookup},
        core::{interest::format_rate, student},
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use tracing::info;

    /// Registers a new student with an empty balance and a savings account.
    ///
    /// When a Discord user is given, the student is linked to it so they can use the
    /// student commands themselves. Staff accounts cannot be linked. Teachers and principals
    /// only.
    #[poise::command(slash_command)]
    pub async fn register_student(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Student's name"] name: String,
        #[description = "Class, e.g. 5-2"] class_name: String,
        #[description = "The student's Discord account"] discord_user: Option<serenity::User>,
    ) -> Result<()> {
        let staff = lookup::require_caller_staff(ctx, "register students").await?;
        let db = &ctx.data().database;

        let rate_bps = ctx.data().default_rate_bps;
        let discord_id = discord_user.as_ref().map(|u| u.id.to_string());
        let created =
            student::register_student(db, name, class_name, discord_id, rate_bps).await?;
        info!(
            student_id = created.id,
            registered_by = staff.id,
            "Student registered via Discord"
        );

        let linked_note = discord_user
            .map(|u| format!(" and linked to <@{}>", u.id))
            .unwrap_or_default();
        ctx.say(format!(
            "✅ Registered **{}** in class {}{linked_note}. Savings rate: {} per week.",
            created.name,
            created.class_name,
            format_rate(rate_bps)
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
