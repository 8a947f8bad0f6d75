//! Shared test utilities for `PointBank`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        ledger, shop,
        student::{self, get_student_by_id},
        user::{self, Role},
    },
    entities,
    errors::{Error, Result},
};
use sea_orm::{ConnectOptions, DatabaseConnection};

/// Creates an in-memory `SQLite` database with all tables initialized.
///
/// The pool is pinned to a single connection so every query sees the same in-memory database
/// and concurrent tests serialize on it.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = sea_orm::Database::connect(options).await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test student with sensible defaults.
///
/// # Defaults
/// * `class_name`: "5-2"
/// * `user_id`: None
/// * `interest_rate_bps`: 200 (2% per week)
pub async fn create_test_student(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::student::Model> {
    student::create_student(db, name.to_string(), "5-2".to_string(), None, 200).await
}

/// Creates a test student and awards them `points` in a single award.
/// Returns the student as stored after the award.
pub async fn create_student_with_points(
    db: &DatabaseConnection,
    name: &str,
    points: i64,
) -> Result<entities::student::Model> {
    let created = create_test_student(db, name).await?;
    ledger::award_points(db, created.id, points, "Starting points".to_string(), None).await?;
    get_student_by_id(db, created.id)
        .await?
        .ok_or_else(|| Error::StudentNotFound {
            name: name.to_string(),
        })
}

/// Creates a teacher account linked to a Discord ID.
pub async fn create_test_teacher(
    db: &DatabaseConnection,
    name: &str,
    discord_id: &str,
) -> Result<entities::user::Model> {
    user::create_user(db, name.to_string(), Role::Teacher, Some(discord_id.to_string())).await
}

/// Creates a shop item in the "general" category with no description.
pub async fn create_test_item(
    db: &DatabaseConnection,
    name: &str,
    price: i64,
    stock: i32,
) -> Result<entities::shop_item::Model> {
    shop::create_item(db, name.to_string(), None, price, stock, "general".to_string()).await
}

/// Sets up a complete test environment with a student.
/// Returns (db, student) for common test scenarios.
pub async fn setup_with_student() -> Result<(DatabaseConnection, entities::student::Model)> {
    let db = setup_test_db().await?;
    let student = create_test_student(&db, "Test Student").await?;
    Ok((db, student))
}

/// Sets up a test environment with a student holding `points` spendable points.
pub async fn setup_with_points(
    points: i64,
) -> Result<(DatabaseConnection, entities::student::Model)> {
    let db = setup_test_db().await?;
    let student = create_student_with_points(&db, "Test Student", points).await?;
    Ok((db, student))
}
