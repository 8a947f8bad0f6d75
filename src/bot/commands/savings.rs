//! Savings commands - deposit, withdraw and the weekly interest run.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, commands::lookup},
        core::{interest, savings},
        errors::{Error, Result},
    };
    use tracing::info;

    /// Discord rejects messages over 2000 characters
    const MAX_MESSAGE_LEN: usize = 1900;

    /// Moves points from your balance into your savings account.
    #[poise::command(slash_command)]
    pub async fn deposit(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Points to save"] amount: i64,
    ) -> Result<()> {
        let student = lookup::caller_student(ctx).await?;
        let data = ctx.data();
        let transfer =
            savings::deposit_at_rate(&data.database, student.id, amount, data.default_rate_bps)
                .await?;

        ctx.say(format!(
            "🏦 Saved **{amount}** points. Balance: **{}** | Savings: **{}**",
            transfer.entry.balance_after, transfer.account.balance
        ))
        .await?;
        Ok(())
    }

    /// Moves points from your savings account back to your balance.
    #[poise::command(slash_command)]
    pub async fn withdraw(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Points to take out"] amount: i64,
    ) -> Result<()> {
        let student = lookup::caller_student(ctx).await?;
        let transfer = savings::withdraw(&ctx.data().database, student.id, amount).await?;

        ctx.say(format!(
            "🏦 Withdrew **{amount}** points. Balance: **{}** | Savings: **{}**",
            transfer.entry.balance_after, transfer.account.balance
        ))
        .await?;
        Ok(())
    }

    /// Pays this week's interest on every savings account. Teachers and principals only.
    ///
    /// Safe to run more than once: each account is paid at most once per week.
    #[poise::command(slash_command)]
    pub async fn interest(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let staff = lookup::require_caller_staff(ctx, "pay interest").await?;
        let today = chrono::Local::now().date_naive();

        let Some(result) =
            interest::process_weekly_interest(&ctx.data().database, today).await?
        else {
            ctx.say(format!(
                "ℹ️ Interest for the week of {} has already been paid.",
                interest::week_start(today)
            ))
            .await?;
            return Ok(());
        };

        info!(
            paid_by = staff.id,
            accounts = result.payments.len(),
            total = result.total_interest,
            "Interest run triggered via Discord"
        );

        let mut summary = interest::format_interest_summary(&result);
        if summary.len() > MAX_MESSAGE_LEN {
            let cut = summary
                .char_indices()
                .take_while(|(i, _)| *i < MAX_MESSAGE_LEN)
                .filter(|(_, c)| *c == '\n')
                .last()
                .map_or(0, |(i, _)| i);
            summary.truncate(cut);
            summary.push_str("\n  ...");
        }

        ctx.say(format!("✅ Interest paid.\n```\n{summary}\n```"))
            .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
