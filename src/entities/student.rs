//! Student entity - A student profile with its denormalized point balances.
//!
//! `current_points`, `savings_points` and `total_points` are caches of the ledger sums in the
//! `points` table and are only ever changed together with a ledger insert. `level` is derived
//! from `total_points`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Student database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    /// Unique identifier for the student
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Linked user account, if the student has one
    pub user_id: Option<i64>,
    /// Student name, unique among active students
    pub name: String,
    /// Class or homeroom label (e.g., "5-2")
    pub class_name: String,
    /// Spendable points
    pub current_points: i64,
    /// Lifetime earned points, drives the level
    pub total_points: i64,
    /// Points held in savings
    pub savings_points: i64,
    /// Level label (`"seed"`, `"sprout"`, ...)
    pub level: String,
    /// Soft delete flag - if true, the student is hidden but the ledger is preserved
    pub is_deleted: bool,
    /// When the student was created
    pub created_at: DateTime,
    /// When the student was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Student and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each student may belong to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// One student has many ledger entries
    #[sea_orm(has_many = "super::point_transaction::Entity")]
    PointTransactions,
    /// One student has one savings account
    #[sea_orm(has_one = "super::savings::Entity")]
    Savings,
    /// One student has many interest payments
    #[sea_orm(has_many = "super::interest_payment::Entity")]
    InterestPayments,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::point_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PointTransactions.def()
    }
}

impl Related<super::savings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Savings.def()
    }
}

impl Related<super::interest_payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InterestPayments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
