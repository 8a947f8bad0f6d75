//! Interest run entity - One row per week the interest accrual has run.
//!
//! The row is claimed before any account is credited and exists even when nobody earned
//! anything, so a week is closed once its run commits.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Interest run database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "interest_runs")]
pub struct Model {
    /// Unique identifier for the run
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Monday of the week this run covers
    #[sea_orm(unique)]
    pub week_start: Date,
    /// Accounts credited in the run
    pub accounts_paid: i32,
    /// Interest credited across all accounts
    pub total_interest: i64,
    /// When the run happened
    pub ran_at: DateTimeUtc,
}

/// Runs are not related to other tables
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
