//! Shop item entity - Catalogue entries students can buy with points.
//!
//! Stock is only decremented by a guarded update inside a purchase transaction.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Shop item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shop_items")]
pub struct Model {
    /// Unique identifier for the item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Item name (e.g., "Homework Pass")
    #[sea_orm(unique)]
    pub name: String,
    /// Optional description shown to students
    pub description: Option<String>,
    /// Price in points per unit
    pub price: i64,
    /// Units left
    pub stock: i32,
    /// Category for organization (e.g., "privilege", "snack")
    pub category: String,
    /// Soft delete flag - if true, the item cannot be bought
    pub is_deleted: bool,
    /// When the item was created
    pub created_at: DateTime,
    /// When the item was last modified
    pub updated_at: DateTime,
}

/// `ShopItem` has no relationships; purchases are recorded in the ledger by name
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
