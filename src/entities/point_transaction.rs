//! Point transaction entity - The append-only point ledger.
//!
//! Each row records one point-affecting event for a student: its `kind`, the signed change to
//! spendable points (`amount`), the signed change to savings (`savings_amount`), and the balances
//! right after the change. Rows are never updated or deleted.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ledger entry database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "points")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Student this entry belongs to
    pub student_id: i64,
    /// Entry kind: `"award"`, `"deduction"`, `"deposit"`, `"withdrawal"`, `"purchase"` or
    /// `"interest"`
    pub kind: String,
    /// Signed change to `current_points`
    pub amount: i64,
    /// Signed change to `savings_points`
    pub savings_amount: i64,
    /// `current_points` after this entry
    pub balance_after: i64,
    /// `savings_points` after this entry
    pub savings_after: i64,
    /// Human-readable reason
    pub reason: String,
    /// User ID of the teacher who caused the entry, if any
    pub teacher_id: Option<i64>,
    /// When the entry was written
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `PointTransaction` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each entry belongs to one student
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
