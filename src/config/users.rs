//! Bootstrap identity configuration from environment variables.
//!
//! A fresh database has no staff, so nobody could register students through the bot. The
//! principal configured in `.env` is seeded on start to break that loop. Missing variables
//! simply mean no bootstrap user.

use crate::config::bank::UserConfig;

/// Reads `PRINCIPAL_DISCORD_ID` and `PRINCIPAL_NAME` from the environment.
///
/// # Returns
///
/// `Some(UserConfig)` with role `principal` when `PRINCIPAL_DISCORD_ID` is set. The name
/// defaults to `"Principal"`.
#[must_use]
pub fn get_bootstrap_principal() -> Option<UserConfig> {
    principal_from(
        std::env::var("PRINCIPAL_DISCORD_ID").ok(),
        std::env::var("PRINCIPAL_NAME").ok(),
    )
}

/// Builds the bootstrap principal from raw variable values.
///
/// A missing or blank Discord ID means no principal. A missing or blank name becomes
/// `"Principal"`.
#[must_use]
pub fn principal_from(discord_id: Option<String>, name: Option<String>) -> Option<UserConfig> {
    let discord_id = discord_id?.trim().to_string();
    if discord_id.is_empty() {
        return None;
    }

    let name = name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "Principal".to_string());

    Some(UserConfig {
        name,
        role: "principal".to_string(),
        discord_id,
    })
}
