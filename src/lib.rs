//! finance-tracker Library
//!
//! Re-exports modules for integration testing and external use.

pub mod aggregation;
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod export;
pub mod handlers;
pub mod store;

pub use config::{Config, LogFormat, StorageBackend};
pub use domain::{Amount, AmountError, DomainError, OperationContext};
pub use error::{AppError, AppResult};
