//! User business logic - roles and identity lookups.
//!
//! Users are identified by the bot through their Discord ID. Only teachers and principals may
//! change other students' points or manage the shop.

use crate::{
    entities::{User, user},
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};
use std::fmt;
use std::str::FromStr;

/// What a user is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Earns, saves and spends points
    Student,
    /// Awards and deducts points, manages the shop
    Teacher,
    /// Read-only access to a child's balances
    Parent,
    /// Same powers as a teacher
    Principal,
}

impl Role {
    /// Stored label for this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Parent => "parent",
            Self::Principal => "principal",
        }
    }

    /// Whether this role may award/deduct points and run bank administration.
    #[must_use]
    pub const fn can_manage_points(self) -> bool {
        matches!(self, Self::Teacher | Self::Principal)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "teacher" => Ok(Self::Teacher),
            "parent" => Ok(Self::Parent),
            "principal" => Ok(Self::Principal),
            other => Err(Error::Config {
                message: format!("Unknown role '{other}'"),
            }),
        }
    }
}

/// Creates a new user.
///
/// # Errors
/// Returns an error if the name is empty or whitespace-only, or the insert fails (for example
/// a duplicate Discord ID).
pub async fn create_user(
    db: &DatabaseConnection,
    name: String,
    role: Role,
    discord_id: Option<String>,
) -> Result<user::Model> {
    insert_user(db, name, role, discord_id).await
}

/// Inserts a user. Works inside a transaction.
pub(crate) async fn insert_user<C>(
    db: &C,
    name: String,
    role: Role,
    discord_id: Option<String>,
) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    if name.trim().is_empty() {
        return Err(Error::Config {
            message: "User name cannot be empty".to_string(),
        });
    }

    let user = user::ActiveModel {
        name: Set(name.trim().to_string()),
        role: Set(role.as_str().to_string()),
        discord_id: Set(discord_id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    user.insert(db).await.map_err(Into::into)
}

/// Retrieves a user by primary key.
pub async fn get_user_by_id(db: &DatabaseConnection, user_id: i64) -> Result<Option<user::Model>> {
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Retrieves the user linked to a Discord account.
pub async fn get_user_by_discord_id(
    db: &DatabaseConnection,
    discord_id: &str,
) -> Result<Option<user::Model>> {
    find_user_by_discord_id(db, discord_id).await
}

/// Looks up a user by Discord ID. Works inside a transaction.
pub(crate) async fn find_user_by_discord_id<C>(
    db: &C,
    discord_id: &str,
) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find()
        .filter(user::Column::DiscordId.eq(discord_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Parses the stored role of a user.
pub fn role_of(user: &user::Model) -> Result<Role> {
    user.role.parse()
}

/// Resolves a Discord caller to a staff user (teacher or principal).
///
/// # Errors
/// - `Error::UserNotFound` if no user is linked to `discord_id`
/// - `Error::PermissionDenied` if the user is not staff
pub async fn require_staff(
    db: &DatabaseConnection,
    discord_id: &str,
    action: &str,
) -> Result<user::Model> {
    let user = get_user_by_discord_id(db, discord_id)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            name: discord_id.to_string(),
        })?;

    let role = role_of(&user)?;
    if !role.can_manage_points() {
        return Err(Error::PermissionDenied {
            role: role.to_string(),
            action: action.to_string(),
        });
    }

    Ok(user)
}
