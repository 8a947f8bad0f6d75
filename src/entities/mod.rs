//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod interest_payment;
pub mod interest_run;
pub mod point_transaction;
pub mod savings;
pub mod shop_item;
pub mod student;
pub mod user;

// Re-export specific types to avoid conflicts
pub use interest_payment::{
    Column as InterestPaymentColumn, Entity as InterestPayment, Model as InterestPaymentModel,
};
pub use interest_run::{
    Column as InterestRunColumn, Entity as InterestRun, Model as InterestRunModel,
};
pub use point_transaction::{
    Column as PointTransactionColumn, Entity as PointTransaction, Model as PointTransactionModel,
};
pub use savings::{Column as SavingsColumn, Entity as Savings, Model as SavingsModel};
pub use shop_item::{Column as ShopItemColumn, Entity as ShopItem, Model as ShopItemModel};
pub use student::{Column as StudentColumn, Entity as Student, Model as StudentModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
