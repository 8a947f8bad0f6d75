//! Core business logic, independent of the Discord layer.
//!
//! Every mutating operation runs inside a single database transaction so that the ledger and
//! the denormalized balances never disagree at a commit point.

/// Weekly interest accrual
pub mod interest;
/// The point ledger and guarded balance mutation
pub mod ledger;
/// Level tiers derived from lifetime points
pub mod level;
/// Ledger-versus-balance reconciliation
pub mod reconcile;
/// Overall and weekly rankings
pub mod ranking;
/// Student reports and formatting helpers
pub mod report;
/// Savings deposits and withdrawals
pub mod savings;
/// Seeding users and shop items from configuration
pub mod seed;
/// Shop catalogue and purchases
pub mod shop;
/// Student profiles
pub mod student;
/// Users and roles
pub mod user;
