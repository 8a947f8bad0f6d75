//! Interest payment entity - One row per (week, student) interest credit.
//!
//! The `(week_start, student_id)` pair is unique, which is what makes the weekly run safe to
//! invoke more than once.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Interest payment database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "interest_payments")]
pub struct Model {
    /// Unique identifier for the payment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Student that was paid
    pub student_id: i64,
    /// Monday of the week this payment covers
    pub week_start: Date,
    /// Savings balance the interest was computed on
    pub balance: i64,
    /// Rate applied, in basis points
    pub rate_bps: i32,
    /// Interest credited (may be zero for small balances)
    pub amount: i64,
    /// When the payment was made
    pub paid_at: DateTimeUtc,
}

/// Defines relationships between `InterestPayment` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each payment belongs to one student
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
