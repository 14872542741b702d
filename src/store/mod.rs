//! Storage port
//!
//! The core only talks to these traits; the concrete backend (a JSON file or
//! PostgreSQL) is picked from configuration at startup.
//!
//! Every ledger operation takes the owning user id and filters on it inside
//! the store, so a caller cannot reach another user's entries even by
//! passing a foreign entry id.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::config::{Config, StorageBackend};
use crate::domain::{Budgets, BudgetsUpdate, Expense, ExpensePatch, User};

pub mod file;
pub mod postgres;

pub use file::JsonFileStore;
pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Email already registered")]
    DuplicateEmail,

    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored data could not be decoded: {0}")]
    Decode(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Database schema is incomplete")]
    SchemaIncomplete,
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Decode(e.to_string())
    }
}

/// User records.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Case-insensitive lookup
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Fails with `DuplicateEmail` if any user already has this email.
    async fn insert_user(&self, user: &User) -> StoreResult<()>;

    /// Full replace keyed by id. Fails with `DuplicateEmail` if a different
    /// user has the new email, `UserNotFound` if the id is unknown.
    ///
    /// Concurrent read-modify-write callers should use `update_profile` or
    /// `update_budgets` instead, which change their fields under the store's
    /// own serialization.
    async fn update_user(&self, user: &User) -> StoreResult<()>;

    /// Set name and email in one step and return the updated record. Fails
    /// with `DuplicateEmail` if a different user has the new email,
    /// `UserNotFound` if the id is unknown.
    async fn update_profile(&self, user_id: Uuid, name: &str, email: &str) -> StoreResult<User>;

    /// Apply a partial budget update in one step and return the result.
    /// Fields absent from `update` keep their stored value.
    async fn update_budgets(&self, user_id: Uuid, update: &BudgetsUpdate)
        -> StoreResult<Budgets>;
}

/// Ledger entries, always scoped to their owner.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn list_expenses_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Expense>>;

    async fn find_expense(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Expense>>;

    async fn insert_expense(&self, expense: &Expense) -> StoreResult<()>;

    /// Returns the updated entry, or `None` if `id` is unknown or owned by
    /// someone else.
    async fn update_expense(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: &ExpensePatch,
    ) -> StoreResult<Option<Expense>>;

    /// Returns `false` if `id` is unknown or owned by someone else.
    async fn delete_expense(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool>;
}

/// Everything the API needs from persistence.
pub trait Storage: CredentialStore + LedgerStore {
    /// Backend name, for logs
    fn backend(&self) -> &'static str;
}

/// Open the backend selected by configuration.
pub async fn open(config: &Config) -> StoreResult<Arc<dyn Storage>> {
    let store: Arc<dyn Storage> = match &config.storage {
        StorageBackend::File { path } => Arc::new(JsonFileStore::open(path).await?),
        StorageBackend::Postgres {
            database_url,
            max_connections,
        } => Arc::new(PgStore::connect(database_url, *max_connections).await?),
    };

    tracing::info!(backend = store.backend(), "Storage ready");
    Ok(store)
}
