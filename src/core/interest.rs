//! Weekly interest business logic
//!
//! Interest runs at most once per ISO week, identified by its Monday. A run first claims the
//! week's row in `interest_runs`, so a week stays closed even when nobody earned anything.
//! Inside the run, every credit also claims the `(week_start, student_id)` row in
//! `interest_payments`; the unique index on that pair means a student is never paid twice for
//! the same week.

use crate::{
    core::{
        ledger::{NewEntry, PointKind, post_entry},
        savings::adjust_account_balance,
        student::find_savings_account,
    },
    entities::{
        InterestPayment, InterestRun, Savings, Student, interest_payment, interest_run, savings,
        student,
    },
    errors::Result,
};
use chrono::{Datelike, Days, NaiveDate, Utc};
use sea_orm::{
    QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*,
    sea_query::{Expr, OnConflict},
};
use std::fmt::Write;
use tracing::{debug, info, instrument};

/// Basis points per whole (100% = 10,000 bps).
const BPS_PER_UNIT: i128 = 10_000;

/// Interest credited to one student in a weekly run.
#[derive(Debug, Clone)]
pub struct StudentInterest {
    /// Student that was paid
    pub student_id: i64,
    /// Student name at the time of the run
    pub student_name: String,
    /// Savings balance the interest was computed on
    pub balance: i64,
    /// Rate applied, in basis points
    pub rate_bps: i32,
    /// Interest credited
    pub interest: i64,
    /// Savings balance after the credit
    pub new_balance: i64,
}

/// Result of one weekly interest run.
#[derive(Debug, Clone)]
pub struct InterestRunResult {
    /// Monday of the week that was paid
    pub week_start: NaiveDate,
    /// One record per account that was claimed in this run
    pub payments: Vec<StudentInterest>,
    /// Sum of all interest credited
    pub total_interest: i64,
    /// Accounts skipped because they were already paid for this week
    pub already_paid: usize,
}

/// Returns the Monday of the ISO week containing `date`.
#[must_use]
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let days_since_monday = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(days_since_monday))
        .unwrap_or(date)
}

/// Computes `floor(balance * rate)` for a rate in basis points.
///
/// Non-positive balances and rates earn nothing. `calculate_interest(12_345, 200) == 246`.
#[must_use]
pub fn calculate_interest(balance: i64, rate_bps: i32) -> i64 {
    if balance <= 0 || rate_bps <= 0 {
        return 0;
    }

    let interest = i128::from(balance) * i128::from(rate_bps) / BPS_PER_UNIT;
    i64::try_from(interest).unwrap_or(i64::MAX)
}

/// Returns true if the interest run has not happened yet for the week containing `today`.
///
/// A run closes its week even when no account earned anything.
pub async fn is_interest_run_needed(db: &DatabaseConnection, today: NaiveDate) -> Result<bool> {
    let runs = InterestRun::find()
        .filter(interest_run::Column::WeekStart.eq(week_start(today)))
        .count(db)
        .await?;
    Ok(runs == 0)
}

/// Retrieves the Monday of the most recent week the interest run happened.
pub async fn get_last_interest_week(db: &DatabaseConnection) -> Result<Option<NaiveDate>> {
    let latest = InterestRun::find()
        .order_by_desc(interest_run::Column::WeekStart)
        .limit(1)
        .one(db)
        .await?;
    Ok(latest.map(|run| run.week_start))
}

/// Retrieves all payments recorded for a week.
pub async fn get_payments_for_week(
    db: &DatabaseConnection,
    week: NaiveDate,
) -> Result<Vec<interest_payment::Model>> {
    InterestPayment::find()
        .filter(interest_payment::Column::WeekStart.eq(week))
        .order_by_asc(interest_payment::Column::StudentId)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Runs the weekly interest accrual for the week containing `today`.
///
/// The week is claimed in `interest_runs` before any account is credited, in the same
/// transaction as the credits. A second call for the same week, including one racing this one,
/// finds the claim and writes nothing.
///
/// # Returns
/// * `Ok(Some(result))` - The run happened, with one record per account claimed
/// * `Ok(None)` - This week's run already happened; nothing was written
#[instrument(skip(db))]
pub async fn process_weekly_interest(
    db: &DatabaseConnection,
    today: NaiveDate,
) -> Result<Option<InterestRunResult>> {
    let week = week_start(today);
    if !is_interest_run_needed(db, today).await? {
        info!("Interest already paid for week of {}", week);
        return Ok(None);
    }

    let txn = db.begin().await?;

    let claimed = InterestRun::insert(interest_run::ActiveModel {
        week_start: Set(week),
        accounts_paid: Set(0),
        total_interest: Set(0),
        ran_at: Set(Utc::now()),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::column(interest_run::Column::WeekStart)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(&txn)
    .await?;

    if claimed == 0 {
        info!("Interest run for week of {} claimed elsewhere", week);
        return Ok(None);
    }

    let result = credit_week(&txn, week).await?;

    InterestRun::update_many()
        .col_expr(
            interest_run::Column::AccountsPaid,
            Expr::value(i32::try_from(result.payments.len())?),
        )
        .col_expr(
            interest_run::Column::TotalInterest,
            Expr::value(result.total_interest),
        )
        .filter(interest_run::Column::WeekStart.eq(week))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    info!(
        accounts = result.payments.len(),
        total_interest = result.total_interest,
        already_paid = result.already_paid,
        "Weekly interest paid for week of {}",
        week
    );
    Ok(Some(result))
}

/// Claims and credits interest for every active account with a positive balance.
///
/// Runs in the caller's transaction. Accounts whose claim row already exists are counted in
/// `already_paid` and left untouched.
pub(crate) async fn credit_week<C>(txn: &C, week: NaiveDate) -> Result<InterestRunResult>
where
    C: ConnectionTrait,
{

    let students = Student::find()
        .filter(student::Column::IsDeleted.eq(false))
        .order_by_asc(student::Column::Id)
        .all(txn)
        .await?;

    let mut payments = Vec::new();
    let mut already_paid = 0;

    for student in students {
        let Some(account) = find_savings_account(txn, student.id).await? else {
            continue;
        };
        if account.balance <= 0 {
            continue;
        }

        let interest = calculate_interest(account.balance, account.interest_rate_bps);

        let claimed = InterestPayment::insert(interest_payment::ActiveModel {
            student_id: Set(student.id),
            week_start: Set(week),
            balance: Set(account.balance),
            rate_bps: Set(account.interest_rate_bps),
            amount: Set(interest),
            paid_at: Set(Utc::now()),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::columns([
                interest_payment::Column::WeekStart,
                interest_payment::Column::StudentId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(txn)
        .await?;

        if claimed == 0 {
            debug!(student_id = student.id, "Interest already claimed for {}", week);
            already_paid += 1;
            continue;
        }

        let new_balance = if interest > 0 {
            post_entry(
                txn,
                NewEntry {
                    student_id: student.id,
                    kind: PointKind::Interest,
                    amount: 0,
                    savings_amount: interest,
                    reason: format!("Weekly interest for week of {week}"),
                    teacher_id: None,
                },
            )
            .await?;
            adjust_account_balance(txn, student.id, interest)
                .await?
                .balance
        } else {
            account.balance
        };

        Savings::update_many()
            .col_expr(savings::Column::LastInterestDate, Expr::value(week))
            .filter(savings::Column::StudentId.eq(student.id))
            .exec(txn)
            .await?;

        payments.push(StudentInterest {
            student_id: student.id,
            student_name: student.name,
            balance: account.balance,
            rate_bps: account.interest_rate_bps,
            interest,
            new_balance,
        });
    }

    let total_interest: i64 = payments.iter().map(|p| p.interest).sum();

    Ok(InterestRunResult {
        week_start: week,
        payments,
        total_interest,
        already_paid,
    })
}

/// Formats a rate in basis points as a percentage string ("2.00%").
#[must_use]
pub fn format_rate(rate_bps: i32) -> String {
    format!("{}.{:02}%", rate_bps / 100, (rate_bps % 100).abs())
}

/// Formats an interest run into a human-readable summary.
#[must_use]
pub fn format_interest_summary(result: &InterestRunResult) -> String {
    let mut summary = format!(
        "Weekly Interest - Week of {} - {} accounts, {} points\n",
        result.week_start.format("%Y-%m-%d"),
        result.payments.len(),
        result.total_interest
    );

    if result.already_paid > 0 {
        let _ = writeln!(
            summary,
            "  Skipped {} accounts already paid this week",
            result.already_paid
        );
    }
    summary.push('\n');

    for payment in &result.payments {
        let _ = writeln!(
            summary,
            "  {} - {} × {} = +{} | {} → {}",
            payment.student_name,
            payment.balance,
            format_rate(payment.rate_bps),
            payment.interest,
            payment.balance,
            payment.new_balance
        );
    }

    summary
}
