//! Command Handlers module
//!
//! Handlers orchestrate business operations over the storage port.
//! Each one validates its command, calls the store scoped to the caller and
//! logs what changed.

mod auth_handler;
mod budget_handler;
mod commands;
mod expense_handler;
mod profile_handler;
mod report_handler;


pub use auth_handler::{LoginHandler, SignupHandler};
pub use budget_handler::BudgetHandler;
pub use commands::*;
pub use expense_handler::{parse_entry_id, ExpenseHandler};
pub use profile_handler::ProfileHandler;
pub use report_handler::ReportHandler;
