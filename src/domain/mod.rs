//! Domain module
//!
//! Core domain types and business rules.

pub mod amount;
pub mod context;
pub mod error;
pub mod expense;
pub mod user;

pub use amount::{Amount, AmountError};
pub use context::OperationContext;
pub use error::DomainError;
pub use expense::{EntryType, Expense, ExpensePatch, NewExpense};
pub use user::{normalize_email, Budgets, BudgetsUpdate, PublicUser, User};
