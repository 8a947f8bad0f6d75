//! Student business logic - profiles and lookups.
//!
//! Students are created together with their savings account so every active student always has
//! exactly one. Balances start at zero; points only ever arrive through the ledger.

use crate::{
    core::{
        level::Level,
        user::{self, Role},
    },
    entities::{Savings, Student, savings, student},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

/// Creates a student and opens their savings account in one transaction.
///
/// # Arguments
/// * `name` - Student name, unique among active students
/// * `class_name` - Class or homeroom label
/// * `user_id` - Optional linked user account
/// * `interest_rate_bps` - Weekly interest rate for the new savings account
///
/// # Errors
/// Returns an error if:
/// - The name is empty or already used by an active student
/// - The interest rate is negative
/// - The database insert fails
#[instrument(skip(db))]
pub async fn create_student(
    db: &DatabaseConnection,
    name: String,
    class_name: String,
    user_id: Option<i64>,
    interest_rate_bps: i32,
) -> Result<student::Model> {
    let name = validate_new_student(&name, interest_rate_bps)?;

    let txn = db.begin().await?;
    let student = insert_student(&txn, name, &class_name, user_id, interest_rate_bps).await?;
    txn.commit().await?;

    info!(student_id = student.id, "Created student '{}'", student.name);
    Ok(student)
}

/// Registers a student, optionally linked to a Discord account, in one transaction.
///
/// With a `discord_id`, the student is linked to the user holding it, and a student user is
/// created first if there is none. Nothing is written unless the student is created too.
///
/// # Errors
/// Returns an error if:
/// - The name is empty or already used by an active student
/// - The interest rate is negative
/// - `Error::PermissionDenied` if the Discord account belongs to a non-student user
/// - The Discord account is already linked to an active student
#[instrument(skip(db))]
pub async fn register_student(
    db: &DatabaseConnection,
    name: String,
    class_name: String,
    discord_id: Option<String>,
    interest_rate_bps: i32,
) -> Result<student::Model> {
    let name = validate_new_student(&name, interest_rate_bps)?;

    let txn = db.begin().await?;

    let user_id = match discord_id {
        Some(discord_id) => Some(link_student_user(&txn, &name, discord_id).await?),
        None => None,
    };
    let student = insert_student(&txn, name, &class_name, user_id, interest_rate_bps).await?;

    txn.commit().await?;

    info!(
        student_id = student.id,
        user_id = ?student.user_id,
        "Registered student '{}'",
        student.name
    );
    Ok(student)
}

/// Finds or creates the student user for `discord_id` and returns its id.
async fn link_student_user<C>(txn: &C, name: &str, discord_id: String) -> Result<i64>
where
    C: ConnectionTrait,
{
    let Some(existing) = user::find_user_by_discord_id(txn, &discord_id).await? else {
        let created =
            user::insert_user(txn, name.to_string(), Role::Student, Some(discord_id)).await?;
        return Ok(created.id);
    };

    let role = user::role_of(&existing)?;
    if role != Role::Student {
        return Err(Error::PermissionDenied {
            role: role.to_string(),
            action: "be registered as a student".to_string(),
        });
    }

    let linked = Student::find()
        .filter(student::Column::UserId.eq(existing.id))
        .filter(student::Column::IsDeleted.eq(false))
        .one(txn)
        .await?;
    if let Some(linked) = linked {
        return Err(Error::Config {
            message: format!("That Discord account is already linked to '{}'", linked.name),
        });
    }

    Ok(existing.id)
}

/// Checks a new student's name and rate, returning the trimmed name.
fn validate_new_student(name: &str, interest_rate_bps: i32) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Config {
            message: "Student name cannot be empty".to_string(),
        });
    }

    if interest_rate_bps < 0 {
        return Err(Error::InvalidAmount {
            amount: i64::from(interest_rate_bps),
        });
    }

    Ok(name.to_string())
}

/// Inserts a student and their empty savings account inside `txn`.
async fn insert_student<C>(
    txn: &C,
    name: String,
    class_name: &str,
    user_id: Option<i64>,
    interest_rate_bps: i32,
) -> Result<student::Model>
where
    C: ConnectionTrait,
{
    let existing = Student::find()
        .filter(student::Column::Name.eq(name.as_str()))
        .filter(student::Column::IsDeleted.eq(false))
        .one(txn)
        .await?;
    if existing.is_some() {
        return Err(Error::Config {
            message: format!("A student named '{name}' already exists"),
        });
    }

    let now = chrono::Utc::now().naive_utc();
    let student = student::ActiveModel {
        user_id: Set(user_id),
        name: Set(name),
        class_name: Set(class_name.trim().to_string()),
        current_points: Set(0),
        total_points: Set(0),
        savings_points: Set(0),
        level: Set(Level::Seed.as_str().to_string()),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    savings::ActiveModel {
        student_id: Set(student.id),
        balance: Set(0),
        interest_rate_bps: Set(interest_rate_bps),
        last_interest_date: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    Ok(student)
}

/// Retrieves a student by primary key, including soft-deleted ones.
pub async fn get_student_by_id(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<Option<student::Model>> {
    Student::find_by_id(student_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds an active student by name.
pub async fn get_student_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<student::Model>> {
    Student::find()
        .filter(student::Column::Name.eq(name))
        .filter(student::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds the active student profile linked to a user.
pub async fn get_student_by_user_id(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Option<student::Model>> {
    Student::find()
        .filter(student::Column::UserId.eq(user_id))
        .filter(student::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds the active student profile of the user with the given Discord ID.
pub async fn get_student_for_discord_user(
    db: &DatabaseConnection,
    discord_id: &str,
) -> Result<Option<student::Model>> {
    let Some(user) = user::get_user_by_discord_id(db, discord_id).await? else {
        return Ok(None);
    };
    get_student_by_user_id(db, user.id).await
}

/// Retrieves all active students ordered by name.
pub async fn get_all_active_students(db: &DatabaseConnection) -> Result<Vec<student::Model>> {
    Student::find()
        .filter(student::Column::IsDeleted.eq(false))
        .order_by_asc(student::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Loads an active student or fails with `StudentNotFound`. Works inside a transaction.
pub(crate) async fn find_active_student<C>(db: &C, student_id: i64) -> Result<student::Model>
where
    C: ConnectionTrait,
{
    let student = Student::find_by_id(student_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::StudentNotFound {
            name: student_id.to_string(),
        })?;

    if student.is_deleted {
        return Err(Error::StudentNotFound {
            name: student_id.to_string(),
        });
    }

    Ok(student)
}

/// Soft deletes a student. The ledger and savings account are preserved.
///
/// # Errors
/// Returns an error if the student does not exist or is already deleted.
pub async fn delete_student(db: &DatabaseConnection, student_id: i64) -> Result<student::Model> {
    let mut student: student::ActiveModel = find_active_student(db, student_id).await?.into();

    student.is_deleted = Set(true);
    student.updated_at = Set(chrono::Utc::now().naive_utc());

    let deleted = student.update(db).await?;
    info!(student_id, "Soft deleted student '{}'", deleted.name);
    Ok(deleted)
}

/// Retrieves a student's savings account. Works inside a transaction.
pub(crate) async fn find_savings_account<C>(
    db: &C,
    student_id: i64,
) -> Result<Option<savings::Model>>
where
    C: ConnectionTrait,
{
    Savings::find()
        .filter(savings::Column::StudentId.eq(student_id))
        .one(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::User;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_student_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_student(&db, "   ".to_string(), "5-2".to_string(), None, 200).await;
        assert!(matches!(result.unwrap_err(), Error::Config { message: _ }));

        let result = create_student(&db, "Minji".to_string(), "5-2".to_string(), None, -1).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidAmount { amount: -1 }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_student_opens_savings_account() -> Result<()> {
        let db = setup_test_db().await?;

        let student = create_test_student(&db, "Minji").await?;
        assert_eq!(student.name, "Minji");
        assert_eq!(student.current_points, 0);
        assert_eq!(student.total_points, 0);
        assert_eq!(student.savings_points, 0);
        assert_eq!(student.level, "seed");
        assert!(!student.is_deleted);

        let account = find_savings_account(&db, student.id).await?.unwrap();
        assert_eq!(account.balance, 0);
        assert_eq!(account.interest_rate_bps, 200);
        assert!(account.last_interest_date.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_create_student_duplicate_name() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_student(&db, "Minji").await?;

        let result = create_test_student(&db, "Minji").await;
        assert!(matches!(result.unwrap_err(), Error::Config { message: _ }));

        // Exactly one student, one account
        assert_eq!(Student::find().count(&db).await?, 1);
        assert_eq!(Savings::find().count(&db).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_name_reusable_after_delete() -> Result<()> {
        let db = setup_test_db().await?;
        let first = create_test_student(&db, "Minji").await?;
        delete_student(&db, first.id).await?;

        let second = create_test_student(&db, "Minji").await?;
        assert_ne!(first.id, second.id);

        let found = get_student_by_name(&db, "Minji").await?.unwrap();
        assert_eq!(found.id, second.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_student() -> Result<()> {
        let db = setup_test_db().await?;
        let student = create_test_student(&db, "Minji").await?;

        let deleted = delete_student(&db, student.id).await?;
        assert!(deleted.is_deleted);

        assert!(get_student_by_name(&db, "Minji").await?.is_none());
        assert!(get_all_active_students(&db).await?.is_empty());

        // Deleting again fails
        let result = delete_student(&db, student.id).await;
        assert!(matches!(result.unwrap_err(), Error::StudentNotFound { name: _ }));
        Ok(())
    }

    #[tokio::test]
    async fn test_get_all_active_students_ordered() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_student(&db, "Seojun").await?;
        create_test_student(&db, "Areum").await?;
        create_test_student(&db, "Minji").await?;

        let names: Vec<String> = get_all_active_students(&db)
            .await?
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Areum", "Minji", "Seojun"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_student_for_discord_user() -> Result<()> {
        let db = setup_test_db().await?;
        let user = crate::core::user::create_user(
            &db,
            "Minji".to_string(),
            Role::Student,
            Some("discord-minji".to_string()),
        )
        .await?;
        let student =
            create_student(&db, "Minji".to_string(), "5-2".to_string(), Some(user.id), 200)
                .await?;

        let found = get_student_for_discord_user(&db, "discord-minji")
            .await?
            .unwrap();
        assert_eq!(found.id, student.id);

        assert!(get_student_for_discord_user(&db, "unknown").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_register_student_creates_linked_user() -> Result<()> {
        let db = setup_test_db().await?;

        let student = register_student(
            &db,
            "Minji".to_string(),
            "5-2".to_string(),
            Some("discord-minji".to_string()),
            200,
        )
        .await?;

        let user = crate::core::user::get_user_by_discord_id(&db, "discord-minji")
            .await?
            .unwrap();
        assert_eq!(user.role, "student");
        assert_eq!(student.user_id, Some(user.id));
        assert!(find_savings_account(&db, student.id).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_register_duplicate_name_leaves_no_user() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_student(&db, "Minji").await?;

        let result = register_student(
            &db,
            "Minji".to_string(),
            "5-2".to_string(),
            Some("discord-minji".to_string()),
            200,
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Config { message: _ }));

        // The user insert was rolled back with the failed student insert
        assert_eq!(User::find().count(&db).await?, 0);
        assert_eq!(Student::find().count(&db).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_register_rejects_staff_account() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_teacher(&db, "Ms. Kim", "discord-kim").await?;

        let result = register_student(
            &db,
            "Kim".to_string(),
            "5-2".to_string(),
            Some("discord-kim".to_string()),
            200,
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::PermissionDenied { role, action: _ } if role == "teacher"
        ));
        assert_eq!(Student::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_register_links_existing_student_user_once() -> Result<()> {
        let db = setup_test_db().await?;
        let user = crate::core::user::create_user(
            &db,
            "Minji".to_string(),
            Role::Student,
            Some("discord-minji".to_string()),
        )
        .await?;

        let student = register_student(
            &db,
            "Minji".to_string(),
            "5-2".to_string(),
            Some("discord-minji".to_string()),
            200,
        )
        .await?;
        assert_eq!(student.user_id, Some(user.id));

        // A second profile for the same account is refused
        let again = register_student(
            &db,
            "Minji Kim".to_string(),
            "5-3".to_string(),
            Some("discord-minji".to_string()),
            200,
        )
        .await;
        assert!(matches!(again.unwrap_err(), Error::Config { message: _ }));
        assert_eq!(User::find().count(&db).await?, 1);
        assert_eq!(Student::find().count(&db).await?, 1);
        Ok(())
    }
}
