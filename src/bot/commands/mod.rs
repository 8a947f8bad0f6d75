//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// General utility commands
pub mod general;

/// Caller and argument resolution shared by commands
pub mod lookup;

/// Award, deduct, balance and history commands
pub mod points;

/// Savings and weekly interest commands
pub mod savings;

/// Shop commands
pub mod shop;

/// Student registration commands
pub mod student;

// Export commands
pub use general::*;
pub use points::*;
pub use savings::*;
pub use shop::*;
pub use student::*;
