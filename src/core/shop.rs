//! Shop business logic - the catalogue and the purchase flow.
//!
//! Items are soft-deleted so past purchases still make sense. A purchase reserves stock and
//! debits points in one database transaction; if the student cannot pay, the stock reservation
//! is rolled back with it.

use crate::{
    core::ledger::{NewEntry, PointKind, post_entry},
    entities::{ShopItem, point_transaction, shop_item},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{info, instrument};

/// Result of a successful purchase.
#[derive(Debug, Clone)]
pub struct PurchaseResult {
    /// The item after the stock was taken
    pub item: shop_item::Model,
    /// Units bought
    pub quantity: i32,
    /// Points paid
    pub total_cost: i64,
    /// The ledger entry recording the payment
    pub entry: point_transaction::Model,
}

fn validate_item_fields(name: &str, price: i64) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Config {
            message: "Shop item name cannot be empty".to_string(),
        });
    }

    if price <= 0 {
        return Err(Error::InvalidAmount { amount: price });
    }

    Ok(())
}

/// Retrieves all items that are for sale, ordered by category then name.
pub async fn get_all_active_items(db: &DatabaseConnection) -> Result<Vec<shop_item::Model>> {
    ShopItem::find()
        .filter(shop_item::Column::IsDeleted.eq(false))
        .order_by_asc(shop_item::Column::Category)
        .order_by_asc(shop_item::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds an item by name, returning None if not found or deleted.
pub async fn get_item_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<shop_item::Model>> {
    ShopItem::find()
        .filter(shop_item::Column::Name.eq(name))
        .filter(shop_item::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves an item by ID, including deleted ones.
pub async fn get_item_by_id(
    db: &DatabaseConnection,
    item_id: i64,
) -> Result<Option<shop_item::Model>> {
    ShopItem::find_by_id(item_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new shop item.
///
/// # Errors
/// Returns an error if:
/// - The name is empty or whitespace-only
/// - The price is not positive or the stock is negative
/// - The name is already taken (including by a deleted item)
pub async fn create_item(
    db: &DatabaseConnection,
    name: String,
    description: Option<String>,
    price: i64,
    stock: i32,
    category: String,
) -> Result<shop_item::Model> {
    validate_item_fields(&name, price)?;

    if stock < 0 {
        return Err(Error::InvalidAmount {
            amount: i64::from(stock),
        });
    }

    let now = chrono::Utc::now().naive_utc();
    let item = shop_item::ActiveModel {
        name: Set(name.trim().to_string()),
        description: Set(description),
        price: Set(price),
        stock: Set(stock),
        category: Set(category.trim().to_string()),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let item = item.insert(db).await?;
    info!(item_id = item.id, "Created shop item '{}'", item.name);
    Ok(item)
}

async fn find_active_item<C>(db: &C, item_id: i64) -> Result<shop_item::Model>
where
    C: ConnectionTrait,
{
    let item = ShopItem::find_by_id(item_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::ShopItemNotFound {
            name: item_id.to_string(),
        })?;

    if item.is_deleted {
        return Err(Error::ShopItemNotFound {
            name: item.name,
        });
    }

    Ok(item)
}

/// Updates an item's name, description, price and category.
///
/// # Errors
/// Returns an error if the new values are invalid or the item does not exist or is deleted.
pub async fn update_item(
    db: &DatabaseConnection,
    item_id: i64,
    new_name: String,
    new_description: Option<String>,
    new_price: i64,
    new_category: String,
) -> Result<shop_item::Model> {
    validate_item_fields(&new_name, new_price)?;

    let mut item: shop_item::ActiveModel = find_active_item(db, item_id).await?.into();

    item.name = Set(new_name.trim().to_string());
    item.description = Set(new_description);
    item.price = Set(new_price);
    item.category = Set(new_category.trim().to_string());
    item.updated_at = Set(chrono::Utc::now().naive_utc());

    item.update(db).await.map_err(Into::into)
}

/// Adds stock to an item.
///
/// # Errors
/// Returns an error if `quantity` is not positive or the item does not exist or is deleted.
pub async fn restock_item(
    db: &DatabaseConnection,
    item_id: i64,
    quantity: i32,
) -> Result<shop_item::Model> {
    if quantity <= 0 {
        return Err(Error::InvalidAmount {
            amount: i64::from(quantity),
        });
    }

    find_active_item(db, item_id).await?;

    ShopItem::update_many()
        .col_expr(
            shop_item::Column::Stock,
            Expr::col(shop_item::Column::Stock).add(quantity),
        )
        .col_expr(
            shop_item::Column::UpdatedAt,
            Expr::value(chrono::Utc::now().naive_utc()),
        )
        .filter(shop_item::Column::Id.eq(item_id))
        .exec(db)
        .await?;

    let item = find_active_item(db, item_id).await?;
    info!(item_id, quantity, stock = item.stock, "Restocked '{}'", item.name);
    Ok(item)
}

/// Soft deletes an item so it can no longer be bought.
///
/// # Errors
/// Returns an error if the item does not exist or is already deleted.
pub async fn delete_item(db: &DatabaseConnection, item_id: i64) -> Result<shop_item::Model> {
    let mut item: shop_item::ActiveModel = find_active_item(db, item_id).await?.into();

    item.is_deleted = Set(true);
    item.updated_at = Set(chrono::Utc::now().naive_utc());

    item.update(db).await.map_err(Into::into)
}

/// Buys `quantity` units of an item for a student.
///
/// Stock is taken with a guarded `UPDATE ... WHERE stock >= quantity`, then the cost is posted
/// to the ledger guarded on the student's spendable points. Both happen in one transaction, so
/// concurrent purchases can neither oversell nor overspend.
///
/// # Errors
/// - `Error::InvalidAmount` if `quantity` is not positive
/// - `Error::ShopItemNotFound` if the item is missing or deleted
/// - `Error::OutOfStock` if fewer than `quantity` units are left (checked before points)
/// - `Error::InsufficientPoints` if the student cannot pay; the stock is left untouched
/// - `Error::StudentNotFound` if the student is missing or deleted
#[instrument(skip(db))]
pub async fn purchase_item(
    db: &DatabaseConnection,
    student_id: i64,
    item_id: i64,
    quantity: i32,
) -> Result<PurchaseResult> {
    if quantity <= 0 {
        return Err(Error::InvalidAmount {
            amount: i64::from(quantity),
        });
    }

    let txn = db.begin().await?;

    let item = find_active_item(&txn, item_id).await?;

    let reserved = ShopItem::update_many()
        .col_expr(
            shop_item::Column::Stock,
            Expr::col(shop_item::Column::Stock).sub(quantity),
        )
        .col_expr(
            shop_item::Column::UpdatedAt,
            Expr::value(chrono::Utc::now().naive_utc()),
        )
        .filter(shop_item::Column::Id.eq(item_id))
        .filter(shop_item::Column::IsDeleted.eq(false))
        .filter(shop_item::Column::Stock.gte(quantity))
        .exec(&txn)
        .await?
        .rows_affected;

    if reserved == 0 {
        return Err(Error::OutOfStock {
            name: item.name,
            stock: item.stock,
            requested: quantity,
        });
    }

    let total_cost = item
        .price
        .checked_mul(i64::from(quantity))
        .ok_or(Error::InvalidAmount {
            amount: i64::from(quantity),
        })?;

    let reason = if quantity == 1 {
        format!("Shop: {}", item.name)
    } else {
        format!("Shop: {} (x{quantity})", item.name)
    };

    let entry = post_entry(
        &txn,
        NewEntry {
            student_id,
            kind: PointKind::Purchase,
            amount: -total_cost,
            savings_amount: 0,
            reason,
            teacher_id: None,
        },
    )
    .await?;

    let item = find_active_item(&txn, item_id).await?;

    txn.commit().await?;

    info!(
        student_id,
        item_id, quantity, total_cost, "Purchased '{}'", item.name
    );

    Ok(PurchaseResult {
        item,
        quantity,
        total_cost,
        entry,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{ledger::get_entries_for_student, student::get_student_by_id};
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_item_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_item(&db, "  ".to_string(), None, 10, 1, "snack".to_string()).await;
        assert!(matches!(result.unwrap_err(), Error::Config { message: _ }));

        let result = create_item(&db, "Candy".to_string(), None, -10, 1, "snack".to_string()).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidAmount { amount: -10 }
        ));

        let result = create_item(&db, "Free".to_string(), None, 0, 1, "snack".to_string()).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { amount: 0 }));

        let result = create_item(&db, "Candy".to_string(), None, 10, -1, "snack".to_string()).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidAmount { amount: -1 }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_purchase_quantity_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = purchase_item(&db, 1, 1, 0).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { amount: 0 }));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_and_find_item() -> Result<()> {
        let db = setup_test_db().await?;
        let item = create_test_item(&db, "Homework Pass", 300, 5).await?;

        assert_eq!(item.name, "Homework Pass");
        assert_eq!(item.price, 300);
        assert_eq!(item.stock, 5);
        assert!(!item.is_deleted);

        assert_eq!(get_item_by_name(&db, "Homework Pass").await?, Some(item.clone()));
        assert_eq!(get_item_by_id(&db, item.id).await?, Some(item));
        assert!(get_item_by_name(&db, "Nope").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_item_name_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_item(&db, "Sticker", 20, 5).await?;

        let result = create_test_item(&db, "Sticker", 30, 5).await;
        assert!(matches!(result.unwrap_err(), Error::Database(_)));
        Ok(())
    }

    #[tokio::test]
    async fn test_get_all_active_items_ordering() -> Result<()> {
        let db = setup_test_db().await?;
        create_item(&db, "Pencil".to_string(), None, 10, 5, "supplies".to_string()).await?;
        create_item(&db, "Candy".to_string(), None, 10, 5, "snack".to_string()).await?;
        let gum = create_item(&db, "Gum".to_string(), None, 10, 5, "snack".to_string()).await?;
        delete_item(&db, gum.id).await?;

        let names: Vec<String> = get_all_active_items(&db)
            .await?
            .into_iter()
            .map(|item| item.name)
            .collect();
        assert_eq!(names, vec!["Candy", "Pencil"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_item() -> Result<()> {
        let db = setup_test_db().await?;
        let item = create_test_item(&db, "Sticker", 20, 5).await?;

        let updated = update_item(
            &db,
            item.id,
            " Gold Sticker ".to_string(),
            Some("Shiny".to_string()),
            25,
            "reward".to_string(),
        )
        .await?;
        assert_eq!(updated.name, "Gold Sticker");
        assert_eq!(updated.description.as_deref(), Some("Shiny"));
        assert_eq!(updated.price, 25);
        assert_eq!(updated.category, "reward");
        assert_eq!(updated.stock, 5);

        let result = update_item(&db, 999, "X".to_string(), None, 1, "x".to_string()).await;
        assert!(matches!(result.unwrap_err(), Error::ShopItemNotFound { name: _ }));
        Ok(())
    }

    #[tokio::test]
    async fn test_restock_item() -> Result<()> {
        let db = setup_test_db().await?;
        let item = create_test_item(&db, "Sticker", 20, 0).await?;

        let restocked = restock_item(&db, item.id, 10).await?;
        assert_eq!(restocked.stock, 10);

        let result = restock_item(&db, item.id, 0).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { amount: 0 }));
        Ok(())
    }

    #[tokio::test]
    async fn test_purchase_item() -> Result<()> {
        let (db, student) = setup_with_points(1_000).await?;
        let item = create_test_item(&db, "Homework Pass", 300, 5).await?;

        let result = purchase_item(&db, student.id, item.id, 1).await?;
        assert_eq!(result.quantity, 1);
        assert_eq!(result.total_cost, 300);
        assert_eq!(result.item.stock, 4);
        assert_eq!(result.entry.kind, "purchase");
        assert_eq!(result.entry.amount, -300);
        assert_eq!(result.entry.balance_after, 700);
        assert_eq!(result.entry.reason, "Shop: Homework Pass");

        let updated = get_student_by_id(&db, student.id).await?.unwrap();
        assert_eq!(updated.current_points, 700);
        assert_eq!(updated.total_points, 1_000);
        Ok(())
    }

    #[tokio::test]
    async fn test_purchase_multiple_units() -> Result<()> {
        let (db, student) = setup_with_points(1_000).await?;
        let item = create_test_item(&db, "Sticker", 20, 10).await?;

        let result = purchase_item(&db, student.id, item.id, 3).await?;
        assert_eq!(result.total_cost, 60);
        assert_eq!(result.item.stock, 7);
        assert_eq!(result.entry.reason, "Shop: Sticker (x3)");
        Ok(())
    }

    #[tokio::test]
    async fn test_purchase_out_of_stock_rejected_regardless_of_points() -> Result<()> {
        let (db, student) = setup_with_points(1_000_000).await?;
        let item = create_test_item(&db, "Rare Badge", 10, 0).await?;

        let result = purchase_item(&db, student.id, item.id, 1).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::OutOfStock {
                name,
                stock: 0,
                requested: 1
            } if name == "Rare Badge"
        ));

        let updated = get_student_by_id(&db, student.id).await?.unwrap();
        assert_eq!(updated.current_points, 1_000_000);
        Ok(())
    }

    #[tokio::test]
    async fn test_purchase_insufficient_points_keeps_stock() -> Result<()> {
        let (db, student) = setup_with_points(100).await?;
        let item = create_test_item(&db, "Homework Pass", 300, 5).await?;

        let result = purchase_item(&db, student.id, item.id, 1).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InsufficientPoints {
                current: 100,
                required: 300
            }
        ));

        // Stock reservation was rolled back with the failed debit
        let item = get_item_by_id(&db, item.id).await?.unwrap();
        assert_eq!(item.stock, 5);
        assert_eq!(get_entries_for_student(&db, student.id, None).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_purchase_deleted_item_rejected() -> Result<()> {
        let (db, student) = setup_with_points(1_000).await?;
        let item = create_test_item(&db, "Old Prize", 10, 5).await?;
        delete_item(&db, item.id).await?;

        let result = purchase_item(&db, student.id, item.id, 1).await;
        assert!(matches!(result.unwrap_err(), Error::ShopItemNotFound { name: _ }));
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_purchases_do_not_oversell() -> Result<()> {
        let db = setup_test_db().await?;
        let minji = create_student_with_points(&db, "Minji", 1_000).await?;
        let seojun = create_student_with_points(&db, "Seojun", 1_000).await?;
        let item = create_test_item(&db, "Last Cookie", 100, 1).await?;

        let (first, second) = tokio::join!(
            purchase_item(&db, minji.id, item.id, 1),
            purchase_item(&db, seojun.id, item.id, 1)
        );

        let successes = [first.is_ok(), second.is_ok()]
            .iter()
            .filter(|ok| **ok)
            .count();
        assert_eq!(successes, 1);

        let item = get_item_by_id(&db, item.id).await?.unwrap();
        assert_eq!(item.stock, 0);

        let minji = get_student_by_id(&db, minji.id).await?.unwrap();
        let seojun = get_student_by_id(&db, seojun.id).await?.unwrap();
        assert_eq!(minji.current_points + seojun.current_points, 1_900);
        Ok(())
    }
}
