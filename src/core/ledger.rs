//! Point ledger business logic - the single source of truth for point balances.
//!
//! Every change to a student's spendable points, savings points or lifetime total goes through
//! [`post_entry`], which applies a guarded `UPDATE` to the denormalized balances and appends the
//! matching ledger row in the caller's database transaction. Because the guard is part of the
//! `UPDATE` itself, a balance can never be driven below zero even when two writers race.

use crate::{
    core::{level::Level, student::find_active_student},
    entities::{PointTransaction, Student, point_transaction, student},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*, sea_query::Expr};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, instrument};

/// What caused a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointKind {
    /// Teacher awarded points
    Award,
    /// Teacher took points away
    Deduction,
    /// Points moved from spendable into savings
    Deposit,
    /// Points moved from savings back to spendable
    Withdrawal,
    /// Points spent in the shop
    Purchase,
    /// Weekly interest credited to savings
    Interest,
}

impl PointKind {
    /// All kinds, in display order.
    pub const ALL: [Self; 6] = [
        Self::Award,
        Self::Deduction,
        Self::Deposit,
        Self::Withdrawal,
        Self::Purchase,
        Self::Interest,
    ];

    /// Stored label for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Award => "award",
            Self::Deduction => "deduction",
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::Purchase => "purchase",
            Self::Interest => "interest",
        }
    }

    /// How much an entry of this kind adds to the lifetime total.
    ///
    /// Only earned points count: awards (on spendable points) and interest (on savings).
    /// Moving points between accounts, spending them, or losing them leaves the total alone.
    #[must_use]
    pub const fn lifetime_delta(self, amount: i64, savings_amount: i64) -> i64 {
        match self {
            Self::Award => amount,
            Self::Interest => savings_amount,
            Self::Deduction | Self::Deposit | Self::Withdrawal | Self::Purchase => 0,
        }
    }
}

impl fmt::Display for PointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PointKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::Config {
                message: format!("Unknown ledger entry kind '{s}'"),
            })
    }
}

/// A ledger entry about to be posted.
#[derive(Debug, Clone)]
pub(crate) struct NewEntry {
    pub(crate) student_id: i64,
    pub(crate) kind: PointKind,
    /// Signed change to `current_points`
    pub(crate) amount: i64,
    /// Signed change to `savings_points`
    pub(crate) savings_amount: i64,
    pub(crate) reason: String,
    pub(crate) teacher_id: Option<i64>,
}

/// Applies an entry to the student's balances and appends it to the ledger.
///
/// Must be called inside a database transaction owned by the caller; nothing is committed here.
///
/// # Errors
/// - `Error::InvalidAmount` if the entry moves nothing
/// - `Error::StudentNotFound` if the student is missing or deleted
/// - `Error::InsufficientPoints` / `Error::InsufficientSavings` if a balance would go negative
pub(crate) async fn post_entry<C>(db: &C, entry: NewEntry) -> Result<point_transaction::Model>
where
    C: ConnectionTrait,
{
    if entry.amount == 0 && entry.savings_amount == 0 {
        return Err(Error::InvalidAmount { amount: 0 });
    }

    let before = find_active_student(db, entry.student_id).await?;

    let required_current = (-entry.amount).max(0);
    let required_savings = (-entry.savings_amount).max(0);
    let lifetime = entry.kind.lifetime_delta(entry.amount, entry.savings_amount);
    let now = chrono::Utc::now();

    // Check-and-update in one statement: the WHERE clause is the guard
    let updated_rows = Student::update_many()
        .col_expr(
            student::Column::CurrentPoints,
            Expr::col(student::Column::CurrentPoints).add(entry.amount),
        )
        .col_expr(
            student::Column::SavingsPoints,
            Expr::col(student::Column::SavingsPoints).add(entry.savings_amount),
        )
        .col_expr(
            student::Column::TotalPoints,
            Expr::col(student::Column::TotalPoints).add(lifetime),
        )
        .col_expr(student::Column::UpdatedAt, Expr::value(now.naive_utc()))
        .filter(student::Column::Id.eq(entry.student_id))
        .filter(student::Column::IsDeleted.eq(false))
        .filter(student::Column::CurrentPoints.gte(required_current))
        .filter(student::Column::SavingsPoints.gte(required_savings))
        .exec(db)
        .await?
        .rows_affected;

    if updated_rows == 0 {
        return Err(if before.current_points < required_current {
            Error::InsufficientPoints {
                current: before.current_points,
                required: required_current,
            }
        } else {
            Error::InsufficientSavings {
                current: before.savings_points,
                required: required_savings,
            }
        });
    }

    let after = find_active_student(db, entry.student_id).await?;

    let level = Level::from_total_points(after.total_points);
    if after.level != level.as_str() {
        Student::update_many()
            .col_expr(student::Column::Level, Expr::value(level.as_str()))
            .filter(student::Column::Id.eq(entry.student_id))
            .exec(db)
            .await?;
        info!(
            student_id = entry.student_id,
            "Level changed from {} to {}", after.level, level
        );
    }

    let reason = if entry.reason.trim().is_empty() {
        entry.kind.as_str().to_string()
    } else {
        entry.reason.trim().to_string()
    };

    let row = point_transaction::ActiveModel {
        student_id: Set(entry.student_id),
        kind: Set(entry.kind.as_str().to_string()),
        amount: Set(entry.amount),
        savings_amount: Set(entry.savings_amount),
        balance_after: Set(after.current_points),
        savings_after: Set(after.savings_points),
        reason: Set(reason),
        teacher_id: Set(entry.teacher_id),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    debug!(
        student_id = entry.student_id,
        kind = %entry.kind,
        amount = entry.amount,
        savings_amount = entry.savings_amount,
        "Posted ledger entry {}",
        row.id
    );

    Ok(row)
}

/// Awards points to a student.
///
/// # Arguments
/// * `student_id` - Student receiving the points
/// * `amount` - Points to award, must be positive
/// * `reason` - Why the points were awarded
/// * `teacher_id` - User ID of the awarding teacher
///
/// # Errors
/// Returns an error if the amount is not positive, the student does not exist, or the database
/// fails. Nothing is written on error.
#[instrument(skip(db))]
pub async fn award_points(
    db: &DatabaseConnection,
    student_id: i64,
    amount: i64,
    reason: String,
    teacher_id: Option<i64>,
) -> Result<point_transaction::Model> {
    if amount <= 0 {
        return Err(Error::InvalidAmount { amount });
    }

    let txn = db.begin().await?;
    let entry = post_entry(
        &txn,
        NewEntry {
            student_id,
            kind: PointKind::Award,
            amount,
            savings_amount: 0,
            reason,
            teacher_id,
        },
    )
    .await?;
    txn.commit().await?;

    info!(student_id, amount, "Awarded points");
    Ok(entry)
}

/// Deducts points from a student's spendable balance.
///
/// The lifetime total is not reduced; a deduction is a penalty, not an un-earning.
///
/// # Errors
/// Returns an error if the amount is not positive, the student does not exist, or the student
/// has fewer than `amount` spendable points.
#[instrument(skip(db))]
pub async fn deduct_points(
    db: &DatabaseConnection,
    student_id: i64,
    amount: i64,
    reason: String,
    teacher_id: Option<i64>,
) -> Result<point_transaction::Model> {
    if amount <= 0 {
        return Err(Error::InvalidAmount { amount });
    }

    let txn = db.begin().await?;
    let entry = post_entry(
        &txn,
        NewEntry {
            student_id,
            kind: PointKind::Deduction,
            amount: -amount,
            savings_amount: 0,
            reason,
            teacher_id,
        },
    )
    .await?;
    txn.commit().await?;

    info!(student_id, amount, "Deducted points");
    Ok(entry)
}

/// Retrieves a student's ledger entries, newest first.
///
/// # Arguments
/// * `limit` - Maximum number of entries, or `None` for the full history
pub async fn get_entries_for_student(
    db: &DatabaseConnection,
    student_id: i64,
    limit: Option<u64>,
) -> Result<Vec<point_transaction::Model>> {
    PointTransaction::find()
        .filter(point_transaction::Column::StudentId.eq(student_id))
        .order_by_desc(point_transaction::Column::CreatedAt)
        .order_by_desc(point_transaction::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a single ledger entry.
pub async fn get_entry_by_id(
    db: &DatabaseConnection,
    entry_id: i64,
) -> Result<Option<point_transaction::Model>> {
    PointTransaction::find_by_id(entry_id)
        .one(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::student::{delete_student, get_student_by_id};
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_amount_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = award_points(&db, 1, 0, "test".to_string(), None).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { amount: 0 }));

        let result = award_points(&db, 1, -10, "test".to_string(), None).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidAmount { amount: -10 }
        ));

        let result = deduct_points(&db, 1, 0, "test".to_string(), None).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { amount: 0 }));

        Ok(())
    }

    #[test]
    fn test_lifetime_delta() {
        assert_eq!(PointKind::Award.lifetime_delta(100, 0), 100);
        assert_eq!(PointKind::Interest.lifetime_delta(0, 12), 12);
        assert_eq!(PointKind::Deduction.lifetime_delta(-50, 0), 0);
        assert_eq!(PointKind::Deposit.lifetime_delta(-50, 50), 0);
        assert_eq!(PointKind::Withdrawal.lifetime_delta(50, -50), 0);
        assert_eq!(PointKind::Purchase.lifetime_delta(-300, 0), 0);
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in PointKind::ALL {
            assert_eq!(kind.as_str().parse::<PointKind>().unwrap(), kind);
        }
        assert!("refund".parse::<PointKind>().is_err());
    }

    #[tokio::test]
    async fn test_award_points_updates_balances() -> Result<()> {
        let (db, student) = setup_with_student().await?;
        let teacher = create_test_teacher(&db, "Ms. Kim", "t-1").await?;

        let entry = award_points(
            &db,
            student.id,
            150,
            "Helped a classmate".to_string(),
            Some(teacher.id),
        )
        .await?;
        assert_eq!(entry.kind, "award");
        assert_eq!(entry.amount, 150);
        assert_eq!(entry.savings_amount, 0);
        assert_eq!(entry.balance_after, 150);
        assert_eq!(entry.savings_after, 0);
        assert_eq!(entry.reason, "Helped a classmate");
        assert_eq!(entry.teacher_id, Some(teacher.id));

        let updated = get_student_by_id(&db, student.id).await?.unwrap();
        assert_eq!(updated.current_points, 150);
        assert_eq!(updated.total_points, 150);
        assert_eq!(updated.savings_points, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_award_points_levels_up() -> Result<()> {
        let (db, student) = setup_with_student().await?;

        award_points(&db, student.id, 999, "Reading".to_string(), None).await?;
        let updated = get_student_by_id(&db, student.id).await?.unwrap();
        assert_eq!(updated.level, "seed");

        award_points(&db, student.id, 1, "Reading".to_string(), None).await?;
        let updated = get_student_by_id(&db, student.id).await?.unwrap();
        assert_eq!(updated.level, "sprout");

        award_points(&db, student.id, 29_000, "Science fair".to_string(), None).await?;
        let updated = get_student_by_id(&db, student.id).await?.unwrap();
        assert_eq!(updated.total_points, 30_000);
        assert_eq!(updated.level, "star");

        Ok(())
    }

    #[tokio::test]
    async fn test_deduct_points_keeps_lifetime_total() -> Result<()> {
        let (db, student) = setup_with_student().await?;
        award_points(&db, student.id, 1_200, "Project".to_string(), None).await?;

        let entry = deduct_points(&db, student.id, 300, "Late homework".to_string(), None).await?;
        assert_eq!(entry.kind, "deduction");
        assert_eq!(entry.amount, -300);
        assert_eq!(entry.balance_after, 900);

        let updated = get_student_by_id(&db, student.id).await?.unwrap();
        assert_eq!(updated.current_points, 900);
        assert_eq!(updated.total_points, 1_200);
        assert_eq!(updated.level, "sprout");

        Ok(())
    }

    #[tokio::test]
    async fn test_deduct_more_than_balance_rejected() -> Result<()> {
        let (db, student) = setup_with_student().await?;
        award_points(&db, student.id, 100, "Quiz".to_string(), None).await?;

        let result = deduct_points(&db, student.id, 101, "Too much".to_string(), None).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InsufficientPoints {
                current: 100,
                required: 101
            }
        ));

        // Nothing was written
        let updated = get_student_by_id(&db, student.id).await?.unwrap();
        assert_eq!(updated.current_points, 100);
        assert_eq!(get_entries_for_student(&db, student.id, None).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_award_to_missing_or_deleted_student() -> Result<()> {
        let (db, student) = setup_with_student().await?;

        let result = award_points(&db, 999, 10, "Ghost".to_string(), None).await;
        assert!(matches!(result.unwrap_err(), Error::StudentNotFound { name: _ }));

        delete_student(&db, student.id).await?;
        let result = award_points(&db, student.id, 10, "Gone".to_string(), None).await;
        assert!(matches!(result.unwrap_err(), Error::StudentNotFound { name: _ }));

        Ok(())
    }

    #[tokio::test]
    async fn test_empty_reason_defaults_to_kind() -> Result<()> {
        let (db, student) = setup_with_student().await?;

        let entry = award_points(&db, student.id, 10, "   ".to_string(), None).await?;
        assert_eq!(entry.reason, "award");
        Ok(())
    }

    #[tokio::test]
    async fn test_get_entries_for_student_newest_first() -> Result<()> {
        let db = setup_test_db().await?;
        let minji = create_test_student(&db, "Minji").await?;
        let seojun = create_test_student(&db, "Seojun").await?;

        let first = award_points(&db, minji.id, 10, "First".to_string(), None).await?;
        let second = award_points(&db, minji.id, 20, "Second".to_string(), None).await?;
        let third = deduct_points(&db, minji.id, 5, "Third".to_string(), None).await?;
        award_points(&db, seojun.id, 99, "Other student".to_string(), None).await?;

        let entries = get_entries_for_student(&db, minji.id, None).await?;
        assert_eq!(entries, vec![third.clone(), second.clone(), first]);

        let limited = get_entries_for_student(&db, minji.id, Some(2)).await?;
        assert_eq!(limited, vec![third, second]);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_entry_by_id() -> Result<()> {
        let (db, student) = setup_with_student().await?;
        let entry = award_points(&db, student.id, 10, "Quiz".to_string(), None).await?;

        assert_eq!(get_entry_by_id(&db, entry.id).await?, Some(entry));
        assert!(get_entry_by_id(&db, 999).await?.is_none());
        Ok(())
    }
}
