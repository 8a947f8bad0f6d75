//! User entity - Anyone who interacts with PointBank: students, teachers, parents, principals.
//!
//! Users carry a role and an optional Discord ID used by the bot to identify the caller.
//! No credentials are stored here.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// One of `"student"`, `"teacher"`, `"parent"`, `"principal"`
    pub role: String,
    /// Discord user ID, if this user talks to the bot
    #[sea_orm(unique)]
    pub discord_id: Option<String>,
    /// When the user was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A student user owns at most one student profile
    #[sea_orm(has_many = "super::student::Entity")]
    Students,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Students.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
