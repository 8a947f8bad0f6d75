//! Database configuration module for PointBank.
//!
//! This module handles the `SQLite` connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. The one constraint entities cannot express,
//! the composite unique index on interest payments, is added here explicitly.

use crate::entities::{
    InterestPayment, InterestRun, PointTransaction, Savings, ShopItem, Student, User,
    interest_payment,
};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/point_bank.sqlite?mode=rwc";

/// Name of the unique index that guards one interest payment per student per week.
pub const INTEREST_WEEK_STUDENT_INDEX: &str = "idx_interest_payments_week_student";

/// Gets the database URL from the `DATABASE_URL` environment variable, falling back to a
/// local `SQLite` file that is created on first use.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by [`get_database_url`].
///
/// The `data/` directory is created when the default location is used.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    if database_url == DEFAULT_DATABASE_URL {
        std::fs::create_dir_all("data")?;
    }
    debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates every table PointBank needs if it does not exist yet, plus the interest payment
/// uniqueness index. Safe to call on every start.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table(db, &schema, User).await?;
    create_table(db, &schema, Student).await?;
    create_table(db, &schema, PointTransaction).await?;
    create_table(db, &schema, Savings).await?;
    create_table(db, &schema, ShopItem).await?;
    create_table(db, &schema, InterestPayment).await?;
    create_table(db, &schema, InterestRun).await?;

    let week_student_index = Index::create()
        .name(INTEREST_WEEK_STUDENT_INDEX)
        .table(InterestPayment)
        .col(interest_payment::Column::WeekStart)
        .col(interest_payment::Column::StudentId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&week_student_index)).await?;

    info!("Database tables ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        interest_payment::Model as InterestPaymentModel, interest_run::Model as InterestRunModel,
        point_transaction::Model as EntryModel,
        savings::Model as SavingsModel, shop_item::Model as ShopItemModel,
        student::Model as StudentModel, user::Model as UserModel,
    };
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<UserModel> = User::find().limit(1).all(&db).await?;
        let _: Vec<StudentModel> = Student::find().limit(1).all(&db).await?;
        let _: Vec<EntryModel> = PointTransaction::find().limit(1).all(&db).await?;
        let _: Vec<SavingsModel> = Savings::find().limit(1).all(&db).await?;
        let _: Vec<ShopItemModel> = ShopItem::find().limit(1).all(&db).await?;
        let _: Vec<InterestPaymentModel> = InterestPayment::find().limit(1).all(&db).await?;
        let _: Vec<InterestRunModel> = InterestRun::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;

        let _: Vec<StudentModel> = Student::find().limit(1).all(&db).await?;
        Ok(())
    }
}
