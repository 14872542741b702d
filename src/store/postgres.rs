//! PostgreSQL-backed store
//!
//! Each operation is a single statement, so concurrent requests never
//! overwrite each other's changes. Email uniqueness is enforced by the
//! `users_email_lower_key` index.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CredentialStore, LedgerStore, Storage, StoreError, StoreResult};
use crate::db;
use crate::domain::{Amount, Budgets, BudgetsUpdate, EntryType, Expense, ExpensePatch, User};

/// Postgres SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

const USER_COLUMNS: &str =
    "id, name, email, password_hash, created_at, avatar, monthly_budget, category_budgets";

const EXPENSE_COLUMNS: &str =
    "id, user_id, date, amount, category, description, kind, created_at";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect, apply migrations and verify the schema.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        tracing::info!("Connecting to database...");
        let pool = db::connect(database_url, max_connections).await?;
        db::run_migrations(&pool).await?;

        if !db::check_schema(&pool).await? {
            tracing::error!("Database schema is not complete. Please run migrations.");
            return Err(StoreError::SchemaIncomplete);
        }

        tracing::info!("Database connected successfully");
        Ok(Self { pool })
    }

    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_unique_violation(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            StoreError::DuplicateEmail
        }
        _ => StoreError::Database(e),
    }
}

// =========================================================================
// Row types
// =========================================================================

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    avatar: Option<String>,
    monthly_budget: Decimal,
    category_budgets: Json<BTreeMap<String, Decimal>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
            avatar: row.avatar,
            budgets: Budgets {
                monthly_budget: row.monthly_budget,
                category_budgets: row.category_budgets.0,
            },
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BudgetsRow {
    monthly_budget: Decimal,
    category_budgets: Json<BTreeMap<String, Decimal>>,
}

impl From<BudgetsRow> for Budgets {
    fn from(row: BudgetsRow) -> Self {
        Self {
            monthly_budget: row.monthly_budget,
            category_budgets: row.category_budgets.0,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ExpenseRow {
    id: Uuid,
    user_id: Uuid,
    date: NaiveDate,
    amount: Decimal,
    category: String,
    description: String,
    kind: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ExpenseRow> for Expense {
    type Error = StoreError;

    fn try_from(row: ExpenseRow) -> Result<Self, Self::Error> {
        let amount = Amount::new(row.amount)
            .map_err(|e| StoreError::Decode(format!("expense {}: {}", row.id, e)))?;
        let kind: EntryType = row
            .kind
            .parse()
            .map_err(|e| StoreError::Decode(format!("expense {}: {}", row.id, e)))?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            date: row.date,
            amount,
            category: row.category,
            description: row.description,
            kind,
            created_at: row.created_at,
        })
    }
}

// =========================================================================
// CredentialStore
// =========================================================================

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(User::from))
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        sqlx::query(&format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(&user.avatar)
        .bind(user.budgets.monthly_budget)
        .bind(Json(&user.budgets.category_budgets))
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        Ok(())
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = $2, email = $3, password_hash = $4, avatar = $5,
                monthly_budget = $6, category_budgets = $7
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.avatar)
        .bind(user.budgets.monthly_budget)
        .bind(Json(&user.budgets.category_budgets))
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::UserNotFound(user.id));
        }
        Ok(())
    }

    async fn update_profile(&self, user_id: Uuid, name: &str, email: &str) -> StoreResult<User> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users SET name = $2, email = $3 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(name)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        row.map(User::from).ok_or(StoreError::UserNotFound(user_id))
    }

    async fn update_budgets(
        &self,
        user_id: Uuid,
        update: &BudgetsUpdate,
    ) -> StoreResult<Budgets> {
        let row: Option<BudgetsRow> = sqlx::query_as(
            r#"
            UPDATE users
            SET monthly_budget = COALESCE($2, monthly_budget),
                category_budgets = COALESCE($3, category_budgets)
            WHERE id = $1
            RETURNING monthly_budget, category_budgets
            "#,
        )
        .bind(user_id)
        .bind(update.monthly_budget)
        .bind(update.category_budgets.as_ref().map(Json))
        .fetch_optional(&self.pool)
        .await?;

        row.map(Budgets::from).ok_or(StoreError::UserNotFound(user_id))
    }
}

// =========================================================================
// LedgerStore
// =========================================================================

#[async_trait]
impl LedgerStore for PgStore {
    async fn list_expenses_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Expense>> {
        let rows: Vec<ExpenseRow> = sqlx::query_as(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE user_id = $1 \
             ORDER BY date DESC, created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Expense::try_from).collect()
    }

    async fn find_expense(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Expense>> {
        let row: Option<ExpenseRow> = sqlx::query_as(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Expense::try_from).transpose()
    }

    async fn insert_expense(&self, expense: &Expense) -> StoreResult<()> {
        sqlx::query(&format!(
            "INSERT INTO expenses ({EXPENSE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(expense.id)
        .bind(expense.user_id)
        .bind(expense.date)
        .bind(expense.amount.value())
        .bind(&expense.category)
        .bind(&expense.description)
        .bind(expense.kind.as_str())
        .bind(expense.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_expense(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: &ExpensePatch,
    ) -> StoreResult<Option<Expense>> {
        let row: Option<ExpenseRow> = sqlx::query_as(&format!(
            r#"
            UPDATE expenses
            SET date = COALESCE($3, date),
                amount = COALESCE($4, amount),
                category = COALESCE($5, category),
                description = COALESCE($6, description),
                kind = COALESCE($7, kind)
            WHERE id = $1 AND user_id = $2
            RETURNING {EXPENSE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(patch.date)
        .bind(patch.amount.map(|a| a.value()))
        .bind(patch.category.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.kind.map(|k| k.as_str()))
        .fetch_optional(&self.pool)
        .await?;

        row.map(Expense::try_from).transpose()
    }

    async fn delete_expense(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl Storage for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }
}
