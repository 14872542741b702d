//! Aggregation module
//!
//! Pure functions deriving filtered listings and windowed summaries from a
//! user's ledger. Nothing here touches storage.

pub mod filter;
pub mod range;
pub mod summary;

pub use filter::{sort_newest_first, ExpenseFilter};
pub use range::{DateWindow, TimeRange};
pub use summary::{summarize, Summary};
