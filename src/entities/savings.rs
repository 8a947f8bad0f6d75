//! Savings entity - One savings account per student.
//!
//! The account `balance` mirrors `students.savings_points`; both move in the same database
//! transaction. Interest rates are stored in basis points (200 = 2%).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Savings account database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "savings")]
pub struct Model {
    /// Unique identifier for the account
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning student, at most one account each
    #[sea_orm(unique)]
    pub student_id: i64,
    /// Points held in the account
    pub balance: i64,
    /// Weekly interest rate in basis points
    pub interest_rate_bps: i32,
    /// Monday of the last week interest was credited
    pub last_interest_date: Option<Date>,
    /// When the account was opened
    pub created_at: DateTime,
    /// When the account was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Savings and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each account belongs to one student
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
