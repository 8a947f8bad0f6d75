//! Savings business logic - moving points between spendable and savings balances.
//!
//! A student's savings are recorded twice: `students.savings_points` (kept by the ledger) and
//! `savings.balance` (the account itself). Deposits and withdrawals change both in the same
//! database transaction, and a withdrawal must be covered by both.

use crate::{
    core::{
        ledger::{NewEntry, PointKind, post_entry},
        student::{find_active_student, find_savings_account},
    },
    entities::{Savings, point_transaction, savings},
    errors::{Error, Result},
};
use sea_orm::{Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{info, instrument, warn};

/// Weekly interest rate for accounts opened without an explicit rate (2%).
pub const DEFAULT_INTEREST_RATE_BPS: i32 = 200;

/// Result of a deposit or withdrawal.
#[derive(Debug, Clone)]
pub struct SavingsTransfer {
    /// The ledger entry that recorded the transfer
    pub entry: point_transaction::Model,
    /// The savings account after the transfer
    pub account: savings::Model,
}

/// Retrieves a student's savings account.
pub async fn get_savings_account(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<Option<savings::Model>> {
    find_savings_account(db, student_id).await
}

/// Adds `delta` to an account balance, refusing to take it below zero.
pub(crate) async fn adjust_account_balance<C>(
    db: &C,
    student_id: i64,
    delta: i64,
) -> Result<savings::Model>
where
    C: ConnectionTrait,
{
    let updated_rows = Savings::update_many()
        .col_expr(
            savings::Column::Balance,
            Expr::col(savings::Column::Balance).add(delta),
        )
        .col_expr(
            savings::Column::UpdatedAt,
            Expr::value(chrono::Utc::now().naive_utc()),
        )
        .filter(savings::Column::StudentId.eq(student_id))
        .filter(savings::Column::Balance.gte((-delta).max(0)))
        .exec(db)
        .await?
        .rows_affected;

    if updated_rows == 0 {
        let current = find_savings_account(db, student_id)
            .await?
            .ok_or(Error::SavingsAccountNotFound { student_id })?
            .balance;
        return Err(Error::InsufficientSavings {
            current,
            required: -delta,
        });
    }

    find_savings_account(db, student_id)
        .await?
        .ok_or(Error::SavingsAccountNotFound { student_id })
}

/// Opens an account holding `balance` at `rate_bps`. Works inside a transaction.
pub(crate) async fn open_account<C>(
    db: &C,
    student_id: i64,
    balance: i64,
    rate_bps: i32,
) -> Result<savings::Model>
where
    C: ConnectionTrait,
{
    let now = chrono::Utc::now().naive_utc();
    savings::ActiveModel {
        student_id: Set(student_id),
        balance: Set(balance),
        interest_rate_bps: Set(rate_bps),
        last_interest_date: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Moves points from a student's spendable balance into savings.
///
/// Opens the savings account with [`DEFAULT_INTEREST_RATE_BPS`] if the student has none. The
/// bot uses [`deposit_at_rate`] so a missing account gets the configured rate instead.
///
/// # Errors
/// - `Error::InvalidAmount` if `amount` is not positive
/// - `Error::InsufficientPoints` if the student has fewer than `amount` spendable points
/// - `Error::StudentNotFound` if the student is missing or deleted
pub async fn deposit(
    db: &DatabaseConnection,
    student_id: i64,
    amount: i64,
) -> Result<SavingsTransfer> {
    deposit_at_rate(db, student_id, amount, DEFAULT_INTEREST_RATE_BPS).await
}

/// Same as [`deposit`], opening a missing account at `fallback_rate_bps`.
#[instrument(skip(db))]
pub async fn deposit_at_rate(
    db: &DatabaseConnection,
    student_id: i64,
    amount: i64,
    fallback_rate_bps: i32,
) -> Result<SavingsTransfer> {
    if amount <= 0 {
        return Err(Error::InvalidAmount { amount });
    }

    let txn = db.begin().await?;

    let student = find_active_student(&txn, student_id).await?;
    if student.current_points < amount {
        return Err(Error::InsufficientPoints {
            current: student.current_points,
            required: amount,
        });
    }

    let entry = post_entry(
        &txn,
        NewEntry {
            student_id,
            kind: PointKind::Deposit,
            amount: -amount,
            savings_amount: amount,
            reason: "Savings deposit".to_string(),
            teacher_id: None,
        },
    )
    .await?;

    if find_savings_account(&txn, student_id).await?.is_none() {
        warn!(student_id, fallback_rate_bps, "No savings account found, opening one");
        open_account(&txn, student_id, 0, fallback_rate_bps).await?;
    }

    let account = adjust_account_balance(&txn, student_id, amount).await?;

    txn.commit().await?;

    info!(student_id, amount, balance = account.balance, "Deposited into savings");
    Ok(SavingsTransfer { entry, account })
}

/// Moves points from savings back into a student's spendable balance.
///
/// Both the student's `savings_points` and the account balance must cover `amount`. When they
/// disagree the smaller one decides.
///
/// # Errors
/// - `Error::InvalidAmount` if `amount` is not positive
/// - `Error::InsufficientSavings` if either savings figure is below `amount`
/// - `Error::SavingsAccountNotFound` if the student has no account
/// - `Error::StudentNotFound` if the student is missing or deleted
#[instrument(skip(db))]
pub async fn withdraw(
    db: &DatabaseConnection,
    student_id: i64,
    amount: i64,
) -> Result<SavingsTransfer> {
    if amount <= 0 {
        return Err(Error::InvalidAmount { amount });
    }

    let txn = db.begin().await?;

    let student = find_active_student(&txn, student_id).await?;
    let account = find_savings_account(&txn, student_id)
        .await?
        .ok_or(Error::SavingsAccountNotFound { student_id })?;

    if student.savings_points != account.balance {
        warn!(
            student_id,
            savings_points = student.savings_points,
            account_balance = account.balance,
            "Savings balances disagree"
        );
    }

    let available = student.savings_points.min(account.balance);
    if available < amount {
        return Err(Error::InsufficientSavings {
            current: available,
            required: amount,
        });
    }

    let entry = post_entry(
        &txn,
        NewEntry {
            student_id,
            kind: PointKind::Withdrawal,
            amount,
            savings_amount: -amount,
            reason: "Savings withdrawal".to_string(),
            teacher_id: None,
        },
    )
    .await?;

    let account = adjust_account_balance(&txn, student_id, -amount).await?;

    txn.commit().await?;

    info!(student_id, amount, balance = account.balance, "Withdrew from savings");
    Ok(SavingsTransfer { entry, account })
}

/// Changes the weekly interest rate of a student's account.
///
/// # Errors
/// Returns an error if the rate is negative or the account does not exist.
pub async fn set_interest_rate(
    db: &DatabaseConnection,
    student_id: i64,
    rate_bps: i32,
) -> Result<savings::Model> {
    if rate_bps < 0 {
        return Err(Error::InvalidAmount {
            amount: i64::from(rate_bps),
        });
    }

    let mut account: savings::ActiveModel = find_savings_account(db, student_id)
        .await?
        .ok_or(Error::SavingsAccountNotFound { student_id })?
        .into();

    account.interest_rate_bps = Set(rate_bps);
    account.updated_at = Set(chrono::Utc::now().naive_utc());

    account.update(db).await.map_err(Into::into)
}
