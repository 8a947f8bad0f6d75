//! Point commands - award, deduct, balance and history.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, commands::lookup, handlers::autocomplete},
        core::{
            ledger,
            report::{self, format_entry_summary, format_points_change, format_progress_bar},
        },
        entities::student,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    /// Default and maximum number of entries shown by `/history`
    const DEFAULT_HISTORY: u64 = 10;
    const MAX_HISTORY: u64 = 25;

    /// Looks at a named student (staff only) or the caller's own profile.
    async fn target_student(
        ctx: poise::Context<'_, BotData, Error>,
        name: Option<&str>,
    ) -> Result<student::Model> {
        match name {
            Some(name) => {
                lookup::require_caller_staff(ctx, "view other students").await?;
                lookup::student_named(ctx, name).await
            }
            None => lookup::caller_student(ctx).await,
        }
    }

    /// Awards points to a student. Teachers and principals only.
    #[poise::command(slash_command)]
    pub async fn award(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Student to award"]
        #[autocomplete = "autocomplete::autocomplete_student_name"]
        student: String,
        #[description = "Points to award"] amount: i64,
        #[description = "Why the points were earned"] reason: Option<String>,
    ) -> Result<()> {
        let staff = lookup::require_caller_staff(ctx, "award points").await?;
        let target = lookup::student_named(ctx, &student).await?;

        let entry = ledger::award_points(
            &ctx.data().database,
            target.id,
            amount,
            reason.unwrap_or_default(),
            Some(staff.id),
        )
        .await?;

        ctx.say(format!(
            "✅ {} points for **{}** ({}). Balance: **{}**",
            format_points_change(entry.amount),
            target.name,
            entry.reason,
            entry.balance_after
        ))
        .await?;
        Ok(())
    }

    /// Deducts points from a student. Teachers and principals only.
    #[poise::command(slash_command)]
    pub async fn deduct(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Student to deduct from"]
        #[autocomplete = "autocomplete::autocomplete_student_name"]
        student: String,
        #[description = "Points to deduct"] amount: i64,
        #[description = "Why the points were taken"] reason: Option<String>,
    ) -> Result<()> {
        let staff = lookup::require_caller_staff(ctx, "deduct points").await?;
        let target = lookup::student_named(ctx, &student).await?;

        let entry = ledger::deduct_points(
            &ctx.data().database,
            target.id,
            amount,
            reason.unwrap_or_default(),
            Some(staff.id),
        )
        .await?;

        ctx.say(format!(
            "✅ {} points for **{}** ({}). Balance: **{}**",
            format_points_change(entry.amount),
            target.name,
            entry.reason,
            entry.balance_after
        ))
        .await?;
        Ok(())
    }

    /// Shows points, savings and level progress.
    ///
    /// Without a student, shows your own profile. Staff can look at any student.
    #[poise::command(slash_command)]
    pub async fn points(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Student to look at (staff only)"]
        #[autocomplete = "autocomplete::autocomplete_student_name"]
        student: Option<String>,
    ) -> Result<()> {
        let target = target_student(ctx, student.as_deref()).await?;
        let report =
            report::generate_student_report(&ctx.data().database, target.id, Some(5)).await?;

        let progress = report.points_to_next_level.map_or_else(
            || "Top level reached".to_string(),
            |remaining| {
                format!(
                    "{} {remaining} points to go",
                    format_progress_bar(report.level_progress_percent, None)
                )
            },
        );

        let mut embed = serenity::CreateEmbed::default()
            .title(format!("{} ({})", report.student.name, report.student.class_name))
            .color(0x0058_65F2) // Discord purple
            .field("Points", report.student.current_points.to_string(), true)
            .field("Savings", report.student.savings_points.to_string(), true)
            .field("Net worth", report.net_worth().to_string(), true)
            .field(format!("Level: {}", report.level), progress, false);

        if !report.recent_entries.is_empty() {
            let recent: Vec<String> = report
                .recent_entries
                .iter()
                .map(format_entry_summary)
                .collect();
            embed = embed.field("Recent activity", recent.join("\n"), false);
        }

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Shows recent point activity.
    #[poise::command(slash_command)]
    pub async fn history(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Student to look at (staff only)"]
        #[autocomplete = "autocomplete::autocomplete_student_name"]
        student: Option<String>,
        #[description = "How many entries to show (max 25)"] limit: Option<u64>,
    ) -> Result<()> {
        let target = target_student(ctx, student.as_deref()).await?;
        let limit = limit.unwrap_or(DEFAULT_HISTORY).clamp(1, MAX_HISTORY);

        let entries =
            ledger::get_entries_for_student(&ctx.data().database, target.id, Some(limit)).await?;

        if entries.is_empty() {
            ctx.say(format!("No point activity for **{}** yet.", target.name))
                .await?;
            return Ok(());
        }

        let lines: Vec<String> = entries.iter().map(format_entry_summary).collect();
        ctx.say(format!(
            "**{}** - last {} entries\n```\n{}\n```",
            target.name,
            entries.len(),
            lines.join("\n")
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
