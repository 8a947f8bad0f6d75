//! Autocomplete handlers for Discord slash command parameters.
//!
//! Suggests student and shop item names as the user types so that commands receive names
//! that exactly match the database.

use crate::{
    bot::BotData,
    core::{shop, student},
    errors::Error,
};

/// Discord's limit on autocomplete choices
const MAX_CHOICES: usize = 25;

/// Case-insensitive substring filter shared by the handlers below.
fn matching_names(names: impl IntoIterator<Item = String>, partial: &str) -> Vec<String> {
    let partial_lower = partial.to_lowercase();
    let mut matching: Vec<String> = names
        .into_iter()
        .filter(|name| name.to_lowercase().contains(&partial_lower))
        .take(MAX_CHOICES)
        .collect();

    // Sort alphabetically for consistent UX
    matching.sort();
    matching
}

/// Provides autocomplete suggestions for active student names.
pub async fn autocomplete_student_name(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let db = &ctx.data().database;

    let Ok(students) = student::get_all_active_students(db).await else {
        return Vec::new();
    };

    matching_names(students.into_iter().map(|s| s.name), partial)
}

/// Provides autocomplete suggestions for shop items that are still for sale.
///
/// Returns just the name (not the price) so it matches the command parameter exactly.
pub async fn autocomplete_item_name(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let db = &ctx.data().database;

    let Ok(items) = shop::get_all_active_items(db).await else {
        return Vec::new();
    };

    matching_names(items.into_iter().map(|item| item.name), partial)
}
