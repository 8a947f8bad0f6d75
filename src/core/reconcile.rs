//! Reconciliation of denormalized balances against the point ledger.
//!
//! The ledger is the source of truth. `students.current_points`, `savings_points`,
//! `total_points`, `level` and the savings account balance must all be derivable from it; this
//! module recomputes them, reports any drift, and can rewrite the cached values.

use crate::{
    core::{
        ledger::PointKind,
        level::Level,
        savings::{DEFAULT_INTEREST_RATE_BPS, open_account},
        student::find_savings_account,
    },
    entities::{PointTransaction, Savings, Student, point_transaction, savings, student},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{info, instrument, warn};

/// Balances recomputed from ledger entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerTotals {
    /// Sum of `amount`
    pub current_points: i64,
    /// Sum of `savings_amount`
    pub savings_points: i64,
    /// Sum of lifetime contributions
    pub total_points: i64,
    /// Number of entries summed
    pub entry_count: usize,
}

/// Comparison of one student's cached balances with the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationReport {
    /// Student checked
    pub student_id: i64,
    /// What the ledger says
    pub ledger: LedgerTotals,
    /// Cached `current_points`
    pub current_points: i64,
    /// Cached `savings_points`
    pub savings_points: i64,
    /// Cached `total_points`
    pub total_points: i64,
    /// Cached level label
    pub level: String,
    /// Savings account balance, `None` if the student has no account
    pub account_balance: Option<i64>,
}

impl ReconciliationReport {
    /// Level the ledger's lifetime total implies.
    #[must_use]
    pub fn expected_level(&self) -> Level {
        Level::from_total_points(self.ledger.total_points)
    }

    /// True when every cached value matches the ledger.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.current_points == self.ledger.current_points
            && self.savings_points == self.ledger.savings_points
            && self.total_points == self.ledger.total_points
            && self.level == self.expected_level().as_str()
            && self
                .account_balance
                .map_or(self.ledger.savings_points == 0, |balance| {
                    balance == self.ledger.savings_points
                })
    }
}

/// Sums ledger entries into balances.
///
/// # Errors
/// Returns `Error::Config` if an entry has an unknown kind.
pub fn ledger_totals(entries: &[point_transaction::Model]) -> Result<LedgerTotals> {
    entries.iter().try_fold(LedgerTotals::default(), |totals, entry| {
        let kind: PointKind = entry.kind.parse()?;
        Ok(LedgerTotals {
            current_points: totals.current_points + entry.amount,
            savings_points: totals.savings_points + entry.savings_amount,
            total_points: totals.total_points
                + kind.lifetime_delta(entry.amount, entry.savings_amount),
            entry_count: totals.entry_count + 1,
        })
    })
}

async fn build_report<C>(db: &C, student_id: i64) -> Result<ReconciliationReport>
where
    C: ConnectionTrait,
{
    let student = Student::find_by_id(student_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::StudentNotFound {
            name: student_id.to_string(),
        })?;

    let entries = PointTransaction::find()
        .filter(point_transaction::Column::StudentId.eq(student_id))
        .order_by_asc(point_transaction::Column::Id)
        .all(db)
        .await?;

    let account = find_savings_account(db, student_id).await?;

    Ok(ReconciliationReport {
        student_id,
        ledger: ledger_totals(&entries)?,
        current_points: student.current_points,
        savings_points: student.savings_points,
        total_points: student.total_points,
        level: student.level,
        account_balance: account.map(|a| a.balance),
    })
}

/// Compares a student's cached balances with the ledger. Deleted students are included.
pub async fn reconcile_student(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<ReconciliationReport> {
    build_report(db, student_id).await
}

/// Checks every active student and returns the reports that show drift.
pub async fn find_inconsistent_students(
    db: &DatabaseConnection,
) -> Result<Vec<ReconciliationReport>> {
    let students = Student::find()
        .filter(student::Column::IsDeleted.eq(false))
        .order_by_asc(student::Column::Id)
        .all(db)
        .await?;

    let mut drifted = Vec::new();
    for student in students {
        let report = build_report(db, student.id).await?;
        if !report.is_consistent() {
            warn!(student_id = student.id, ?report, "Balances drifted from ledger");
            drifted.push(report);
        }
    }
    Ok(drifted)
}

/// Rewrites a student's cached balances, level and savings account from the ledger.
///
/// Opens a savings account at [`DEFAULT_INTEREST_RATE_BPS`] if the ledger holds savings but no
/// account exists. Returns the report after the repair.
pub async fn repair_student(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<ReconciliationReport> {
    repair_student_at_rate(db, student_id, DEFAULT_INTEREST_RATE_BPS).await
}

/// Same as [`repair_student`], opening a missing account at `fallback_rate_bps`.
#[instrument(skip(db))]
pub async fn repair_student_at_rate(
    db: &DatabaseConnection,
    student_id: i64,
    fallback_rate_bps: i32,
) -> Result<ReconciliationReport> {
    let txn = db.begin().await?;

    let before = build_report(&txn, student_id).await?;
    if before.is_consistent() {
        return Ok(before);
    }

    let totals = before.ledger;
    let now = chrono::Utc::now().naive_utc();

    Student::update_many()
        .col_expr(student::Column::CurrentPoints, Expr::value(totals.current_points))
        .col_expr(student::Column::SavingsPoints, Expr::value(totals.savings_points))
        .col_expr(student::Column::TotalPoints, Expr::value(totals.total_points))
        .col_expr(
            student::Column::Level,
            Expr::value(before.expected_level().as_str()),
        )
        .col_expr(student::Column::UpdatedAt, Expr::value(now))
        .filter(student::Column::Id.eq(student_id))
        .exec(&txn)
        .await?;

    if before.account_balance.is_some() {
        Savings::update_many()
            .col_expr(savings::Column::Balance, Expr::value(totals.savings_points))
            .col_expr(savings::Column::UpdatedAt, Expr::value(now))
            .filter(savings::Column::StudentId.eq(student_id))
            .exec(&txn)
            .await?;
    } else if totals.savings_points != 0 {
        open_account(&txn, student_id, totals.savings_points, fallback_rate_bps).await?;
    }

    let after = build_report(&txn, student_id).await?;
    txn.commit().await?;

    info!(
        student_id,
        current_points = totals.current_points,
        savings_points = totals.savings_points,
        total_points = totals.total_points,
        "Repaired balances from ledger"
    );
    Ok(after)
}
