//! Ranking queries - overall standings by lifetime points and weekly standings by awards.

use crate::{
    core::{interest::week_start, ledger::PointKind},
    entities::{PointTransaction, Student, point_transaction, student},
    errors::Result,
};
use chrono::{Days, NaiveDate, NaiveTime};
use sea_orm::{QueryOrder, prelude::*};
use std::collections::HashMap;

/// One row of a ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingEntry {
    /// 1-based rank; tied scores share a rank and the next rank is skipped (1, 1, 3)
    pub rank: usize,
    /// Student ID
    pub student_id: i64,
    /// Student name
    pub student_name: String,
    /// Class label
    pub class_name: String,
    /// Score the ranking is ordered by
    pub points: i64,
}

/// Assigns competition ranks to `(student, points)` pairs already sorted by points descending.
fn assign_ranks(scored: Vec<(student::Model, i64)>, limit: Option<usize>) -> Vec<RankingEntry> {
    let mut ranking = Vec::with_capacity(scored.len());
    let mut previous_points = None;
    let mut rank = 0;

    for (position, (student, points)) in scored.into_iter().enumerate() {
        if previous_points != Some(points) {
            rank = position + 1;
            previous_points = Some(points);
        }
        ranking.push(RankingEntry {
            rank,
            student_id: student.id,
            student_name: student.name,
            class_name: student.class_name,
            points,
        });
    }

    if let Some(limit) = limit {
        ranking.truncate(limit);
    }
    ranking
}

/// Ranks active students by lifetime points, ties broken by name.
pub async fn student_ranking(
    db: &DatabaseConnection,
    limit: Option<usize>,
) -> Result<Vec<RankingEntry>> {
    let students = Student::find()
        .filter(student::Column::IsDeleted.eq(false))
        .order_by_desc(student::Column::TotalPoints)
        .order_by_asc(student::Column::Name)
        .all(db)
        .await?;

    let scored = students
        .into_iter()
        .map(|student| {
            let points = student.total_points;
            (student, points)
        })
        .collect();

    Ok(assign_ranks(scored, limit))
}

/// Ranks active students by points awarded during the week containing `week_of`.
///
/// Only `award` entries count. Students with no awards that week are left out.
pub async fn weekly_ranking(
    db: &DatabaseConnection,
    week_of: NaiveDate,
    limit: Option<usize>,
) -> Result<Vec<RankingEntry>> {
    let monday = week_start(week_of);
    let from = monday.and_time(NaiveTime::MIN).and_utc();
    let until = monday
        .checked_add_days(Days::new(7))
        .unwrap_or(monday)
        .and_time(NaiveTime::MIN)
        .and_utc();

    let awards = PointTransaction::find()
        .filter(point_transaction::Column::Kind.eq(PointKind::Award.as_str()))
        .filter(point_transaction::Column::CreatedAt.gte(from))
        .filter(point_transaction::Column::CreatedAt.lt(until))
        .all(db)
        .await?;

    let mut totals: HashMap<i64, i64> = HashMap::new();
    for award in awards {
        *totals.entry(award.student_id).or_insert(0) += award.amount;
    }

    let students = Student::find()
        .filter(student::Column::IsDeleted.eq(false))
        .filter(student::Column::Id.is_in(totals.keys().copied().collect::<Vec<_>>()))
        .all(db)
        .await?;

    let mut scored: Vec<(student::Model, i64)> = students
        .into_iter()
        .map(|student| {
            let points = totals.get(&student.id).copied().unwrap_or(0);
            (student, points)
        })
        .collect();
    scored.sort_by(|(a, a_points), (b, b_points)| {
        b_points.cmp(a_points).then_with(|| a.name.cmp(&b.name))
    });

    Ok(assign_ranks(scored, limit))
}
