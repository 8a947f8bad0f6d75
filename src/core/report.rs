//! Report generation business logic.
//!
//! Builds the per-student detail view (balances, level progress, savings, recent activity) and
//! the text helpers the bot uses to render it. All functions return structured data or plain
//! strings; formatting for Discord happens in the bot layer.

use crate::{
    core::{
        interest::format_rate,
        ledger::get_entries_for_student,
        level::{Level, points_to_next_level},
        student::{find_active_student, find_savings_account},
    },
    entities::{point_transaction, savings, student},
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Everything shown about one student.
#[derive(Debug, Clone)]
pub struct StudentReport {
    /// The student row
    pub student: student::Model,
    /// Level derived from lifetime points
    pub level: Level,
    /// Points still needed for the next level, `None` at the top
    pub points_to_next_level: Option<i64>,
    /// Progress through the current level, 0-100
    pub level_progress_percent: f64,
    /// The savings account, if one exists
    pub savings: Option<savings::Model>,
    /// Most recent ledger entries, newest first
    pub recent_entries: Vec<point_transaction::Model>,
}

impl StudentReport {
    /// Spendable plus saved points.
    #[must_use]
    pub const fn net_worth(&self) -> i64 {
        self.student.current_points + self.student.savings_points
    }
}

/// Generates the detail report for an active student.
///
/// # Arguments
/// * `db` - Database connection
/// * `student_id` - Student to report on
/// * `entry_limit` - Maximum number of recent entries to include (default 10)
pub async fn generate_student_report(
    db: &DatabaseConnection,
    student_id: i64,
    entry_limit: Option<u64>,
) -> Result<StudentReport> {
    let student = find_active_student(db, student_id).await?;
    let savings = find_savings_account(db, student_id).await?;
    let recent_entries =
        get_entries_for_student(db, student_id, Some(entry_limit.unwrap_or(10))).await?;

    let level = Level::from_total_points(student.total_points);

    Ok(StudentReport {
        level,
        points_to_next_level: points_to_next_level(student.total_points),
        level_progress_percent: level_progress(student.total_points),
        student,
        savings,
        recent_entries,
    })
}

/// Progress through the current level as a percentage.
///
/// 0% at the level's threshold, approaching 100% just before the next one. The top level is
/// always 100%.
#[must_use]
// Cast safety: both values are bounded by the level thresholds (< 2^53)
#[allow(clippy::cast_precision_loss)]
pub fn level_progress(total_points: i64) -> f64 {
    let level = Level::from_total_points(total_points);
    let Some(next) = level.next() else {
        return 100.0;
    };

    let span = next.threshold() - level.threshold();
    let into_level = total_points.max(0) - level.threshold();

    (into_level as f64 / span as f64) * 100.0
}

/// Generates a progress bar string for visual representation.
///
/// Creates a text-based progress bar like: `[████████░░] 80.0%`
///
/// # Arguments
/// * `progress_percent` - Progress percentage (0-100)
/// * `bar_length` - Length of the progress bar in characters (default 10)
#[must_use]
pub fn format_progress_bar(progress_percent: f64, bar_length: Option<usize>) -> String {
    let length = bar_length.unwrap_or(10);
    let clamped_progress = progress_percent.clamp(0.0, 100.0);

    // Cast safety: clamped_progress ∈ [0, 100], length is small (10-20).
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let filled = ((clamped_progress / 100.0) * length as f64).round() as usize;
    let empty = length.saturating_sub(filled);

    let filled_str = "█".repeat(filled);
    let empty_str = "░".repeat(empty);

    format!("[{filled_str}{empty_str}] {progress_percent:.1}%")
}

/// Formats a signed point change: `"+120"`, `"-30"`, `"0"`.
#[must_use]
pub fn format_points_change(amount: i64) -> String {
    if amount > 0 {
        format!("+{amount}")
    } else {
        amount.to_string()
    }
}

/// One-line summary of a ledger entry.
///
/// Spendable and savings changes are shown separately, e.g.
/// `"2024-03-04 deposit: -500 pts / +500 saved - Savings deposit"`.
#[must_use]
pub fn format_entry_summary(entry: &point_transaction::Model) -> String {
    let mut changes = Vec::with_capacity(2);
    if entry.amount != 0 {
        changes.push(format!("{} pts", format_points_change(entry.amount)));
    }
    if entry.savings_amount != 0 {
        changes.push(format!(
            "{} saved",
            format_points_change(entry.savings_amount)
        ));
    }

    format!(
        "{} {}: {} - {}",
        entry.created_at.format("%Y-%m-%d"),
        entry.kind,
        changes.join(" / "),
        entry.reason
    )
}

/// Multi-line text rendering of a report, used for plain-text replies and logs.
#[must_use]
pub fn format_student_report(report: &StudentReport) -> String {
    use std::fmt::Write;

    let student = &report.student;
    let mut text = format!(
        "{} ({}) - Level: {}\n",
        student.name, student.class_name, report.level
    );

    let _ = writeln!(
        text,
        "  Points: {} | Savings: {} | Lifetime: {}",
        student.current_points, student.savings_points, student.total_points
    );

    match report.points_to_next_level {
        Some(remaining) => {
            let _ = writeln!(
                text,
                "  {} {} points to next level",
                format_progress_bar(report.level_progress_percent, None),
                remaining
            );
        }
        None => text.push_str("  Top level reached\n"),
    }

    if let Some(account) = &report.savings {
        let _ = writeln!(
            text,
            "  Savings rate: {} per week",
            format_rate(account.interest_rate_bps)
        );
    }

    if !report.recent_entries.is_empty() {
        text.push_str("  Recent activity:\n");
        for entry in &report.recent_entries {
            let _ = writeln!(text, "    {}", format_entry_summary(entry));
        }
    }

    text
}
